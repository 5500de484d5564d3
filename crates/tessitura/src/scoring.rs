use serde::{Deserialize, Serialize};

use crate::ideal::{build_ideal_vector, IdealWeights};
use crate::profile::UserProfile;
use crate::song::Song;
use crate::vector::{cosine_similarity, Normalization, PitchVector};

/// One song's score against one profile, with its components.
///
/// `final_score = cosine_similarity - alpha * avoid_penalty`. It is a ranking
/// key, not bounded to [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub filename: String,
    pub composer: String,
    pub title: String,
    pub final_score: f64,
    pub cosine_similarity: f64,
    /// Share of singing time on avoid pitches (before `alpha`).
    pub avoid_penalty: f64,
    /// Share of singing time on favorite pitches.
    pub favorite_overlap: f64,
}

/// Scores songs against a fixed profile.
///
/// The ideal vector is built once; each call to [`Scorer::score`] builds the
/// song's L1 vector over the profile's range.
#[derive(Debug, Clone)]
pub struct Scorer {
    profile: UserProfile,
    ideal: PitchVector,
}

impl Scorer {
    pub fn new(profile: &UserProfile, weights: &IdealWeights) -> Self {
        Self {
            ideal: build_ideal_vector(profile, weights),
            profile: profile.clone(),
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn ideal(&self) -> &PitchVector {
        &self.ideal
    }

    /// The song's proportion-of-time vector over the profile's range.
    pub fn song_vector(&self, song: &Song) -> PitchVector {
        PitchVector::from_durations(song.tessituragram(), self.profile.range(), Normalization::L1)
    }

    pub fn score(&self, song: &Song) -> ScoredCandidate {
        let vector = self.song_vector(song);
        let cosine = cosine_similarity(&vector, &self.ideal);
        let avoid_penalty = vector.mass_at(self.profile.avoids());
        let favorite_overlap = vector.mass_at(self.profile.favorites());

        ScoredCandidate {
            filename: song.filename.clone(),
            composer: song.composer.clone(),
            title: song.title.clone(),
            final_score: cosine - self.profile.alpha() * avoid_penalty,
            cosine_similarity: cosine,
            avoid_penalty,
            favorite_overlap,
        }
    }
}
