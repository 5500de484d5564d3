use serde::{Deserialize, Serialize};

use crate::profile::UserProfile;
use crate::vector::{Normalization, PitchVector};

/// Weights used to build the ideal vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealWeights {
    /// Starting weight for every pitch in range.
    pub base: f64,
    /// Added at each favorite pitch.
    pub favorite_boost: f64,
    /// Added at each avoid pitch (negative).
    pub avoid_penalty: f64,
}

impl Default for IdealWeights {
    fn default() -> Self {
        Self {
            base: 0.2,
            favorite_boost: 1.0,
            avoid_penalty: -1.0,
        }
    }
}

/// Target preference vector over the profile's range.
///
/// Every position starts at `base`, favorites and avoids are adjusted,
/// negatives are clamped to zero, and the result is L2-normalized. If every
/// position clamps to zero the zero vector is returned.
pub fn build_ideal_vector(profile: &UserProfile, weights: &IdealWeights) -> PitchVector {
    let space = profile.range();
    let values: Vec<f64> = space
        .pitches()
        .map(|pitch| {
            let mut weight = weights.base;
            if profile.favorites().contains(&pitch) {
                weight += weights.favorite_boost;
            }
            if profile.avoids().contains(&pitch) {
                weight += weights.avoid_penalty;
            }
            weight.max(0.0)
        })
        .collect();
    let mut vector = PitchVector::from_values(space, values);
    vector.normalize(Normalization::L2);
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::PitchRange;

    fn profile(favorites: &[u8], avoids: &[u8]) -> UserProfile {
        UserProfile::new(
            PitchRange::new(60, 64).unwrap(),
            favorites.iter().copied(),
            avoids.iter().copied(),
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn favorites_outweigh_neutral_and_avoids_reach_zero() {
        let ideal = build_ideal_vector(&profile(&[62], &[60]), &IdealWeights::default());
        assert!((ideal.norm() - 1.0).abs() < 1e-12);
        assert_eq!(ideal.get(60), 0.0);
        assert!(ideal.get(62) > ideal.get(61));
        assert!(ideal.get(61) > 0.0);
        assert_eq!(ideal.get(61), ideal.get(63));
    }

    #[test]
    fn no_preferences_gives_uniform_vector() {
        let ideal = build_ideal_vector(&profile(&[], &[]), &IdealWeights::default());
        let expected = 1.0 / 5f64.sqrt();
        for v in ideal.values() {
            assert!((v - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn all_clamped_gives_zero_vector() {
        let weights = IdealWeights {
            base: 0.0,
            ..IdealWeights::default()
        };
        let ideal = build_ideal_vector(&profile(&[], &[60, 61, 62, 63, 64]), &weights);
        assert!(ideal.is_zero());
        assert_eq!(ideal.len(), 5);
    }
}
