use serde::{Deserialize, Serialize};
use tessitura::IdealWeights;

use crate::bootstrap::BootstrapEstimator;

/// Knobs shared by the three analyses. Recorded verbatim in every report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessParams {
    pub weights: IdealWeights,
    pub alpha: f64,
    /// Top pitches by duration used as favorites.
    pub favorite_count: usize,
    /// Bottom pitches by duration used as avoids.
    pub avoid_count: usize,
    pub bootstrap_resamples: usize,
    pub bootstrap_seed: u64,
    pub confidence_level: f64,
    pub retrieval_min_candidates: usize,
    pub stability_min_candidates: usize,
    pub spread_min_candidates: usize,
    /// How many baseline profiles the stability analysis perturbs.
    pub stability_baselines: usize,
    /// How many profiles the spread analysis scores.
    pub spread_profiles: usize,
    pub hit_cutoffs: Vec<usize>,
}

impl Default for HarnessParams {
    fn default() -> Self {
        Self {
            weights: IdealWeights::default(),
            alpha: tessitura::profile::DEFAULT_ALPHA,
            favorite_count: 4,
            avoid_count: 2,
            bootstrap_resamples: 10_000,
            bootstrap_seed: 42,
            confidence_level: 0.95,
            retrieval_min_candidates: 2,
            stability_min_candidates: 10,
            spread_min_candidates: 10,
            stability_baselines: 5,
            spread_profiles: 25,
            hit_cutoffs: vec![1, 3, 5],
        }
    }
}

impl HarnessParams {
    pub fn estimator(&self) -> BootstrapEstimator {
        BootstrapEstimator::new(self.bootstrap_resamples, self.confidence_level)
    }
}
