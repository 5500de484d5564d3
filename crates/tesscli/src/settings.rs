//! Conversion from file configuration to library parameters.

use tessconf::{ScoringConfig, TessConfig};
use tessitura::{IdealWeights, PitchRange, ProfileError, UserProfile};
use tessitura_eval::HarnessParams;

pub fn ideal_weights(scoring: &ScoringConfig) -> IdealWeights {
    IdealWeights {
        base: scoring.base_weight,
        favorite_boost: scoring.favorite_boost,
        avoid_penalty: scoring.avoid_penalty,
    }
}

pub fn harness_params(config: &TessConfig) -> HarnessParams {
    let eval = &config.evaluation;
    HarnessParams {
        weights: ideal_weights(&config.scoring),
        alpha: config.scoring.alpha,
        favorite_count: eval.favorite_count,
        avoid_count: eval.avoid_count,
        bootstrap_resamples: eval.bootstrap_resamples,
        bootstrap_seed: eval.bootstrap_seed,
        confidence_level: eval.confidence_level,
        retrieval_min_candidates: eval.retrieval_min_candidates,
        stability_min_candidates: eval.stability_min_candidates,
        spread_min_candidates: eval.spread_min_candidates,
        stability_baselines: eval.stability_baselines,
        spread_profiles: eval.spread_profiles,
        hit_cutoffs: eval.hit_cutoffs.clone(),
    }
}

/// Build a profile from command-line values.
pub fn profile_from_args(
    low: u8,
    high: u8,
    favorites: &[u8],
    avoids: &[u8],
    alpha: f64,
) -> Result<UserProfile, ProfileError> {
    let range = PitchRange::new(low, high).ok_or(ProfileError::InvertedRange {
        low: low as i64,
        high: high as i64,
    })?;
    UserProfile::new(
        range,
        favorites.iter().copied(),
        avoids.iter().copied(),
        alpha,
    )
}
