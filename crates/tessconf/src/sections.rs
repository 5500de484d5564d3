//! Configuration sections. Every field carries a serde default so partial
//! files deserialize cleanly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the library lives and where results are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Song library JSON (`{ "songs": [...] }`).
    /// Default: data/tessituragrams.json
    #[serde(default = "PathsConfig::default_library")]
    pub library: PathBuf,

    /// Output file for `recommend`.
    /// Default: data/recommendations.json
    #[serde(default = "PathsConfig::default_recommendations")]
    pub recommendations: PathBuf,

    /// Directory that receives the evaluation JSON files.
    /// Default: experiment_results
    #[serde(default = "PathsConfig::default_results_dir")]
    pub results_dir: PathBuf,
}

impl PathsConfig {
    fn default_library() -> PathBuf {
        PathBuf::from("data/tessituragrams.json")
    }

    fn default_recommendations() -> PathBuf {
        PathBuf::from("data/recommendations.json")
    }

    fn default_results_dir() -> PathBuf {
        PathBuf::from("experiment_results")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            library: Self::default_library(),
            recommendations: Self::default_recommendations(),
            results_dir: Self::default_results_dir(),
        }
    }
}

/// Weights used to build the ideal vector and the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Avoid-penalty weight in `cosine - alpha * avoid_time`.
    #[serde(default = "ScoringConfig::default_alpha")]
    pub alpha: f64,

    /// Starting weight of every pitch in the ideal vector.
    #[serde(default = "ScoringConfig::default_base_weight")]
    pub base_weight: f64,

    /// Added at each favorite position.
    #[serde(default = "ScoringConfig::default_favorite_boost")]
    pub favorite_boost: f64,

    /// Added at each avoid position (negative).
    #[serde(default = "ScoringConfig::default_avoid_penalty")]
    pub avoid_penalty: f64,
}

impl ScoringConfig {
    fn default_alpha() -> f64 {
        0.5
    }

    fn default_base_weight() -> f64 {
        0.2
    }

    fn default_favorite_boost() -> f64 {
        1.0
    }

    fn default_avoid_penalty() -> f64 {
        -1.0
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            alpha: Self::default_alpha(),
            base_weight: Self::default_base_weight(),
            favorite_boost: Self::default_favorite_boost(),
            avoid_penalty: Self::default_avoid_penalty(),
        }
    }
}

/// Offline evaluation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "EvaluationConfig::default_favorite_count")]
    pub favorite_count: usize,

    #[serde(default = "EvaluationConfig::default_avoid_count")]
    pub avoid_count: usize,

    #[serde(default = "EvaluationConfig::default_bootstrap_resamples")]
    pub bootstrap_resamples: usize,

    #[serde(default = "EvaluationConfig::default_bootstrap_seed")]
    pub bootstrap_seed: u64,

    /// Two-sided confidence level; 0.95 gives the 2.5/97.5 percentiles.
    #[serde(default = "EvaluationConfig::default_confidence_level")]
    pub confidence_level: f64,

    #[serde(default = "EvaluationConfig::default_retrieval_min_candidates")]
    pub retrieval_min_candidates: usize,

    #[serde(default = "EvaluationConfig::default_stability_min_candidates")]
    pub stability_min_candidates: usize,

    #[serde(default = "EvaluationConfig::default_spread_min_candidates")]
    pub spread_min_candidates: usize,

    /// Number of baseline profiles for the stability analysis.
    #[serde(default = "EvaluationConfig::default_stability_baselines")]
    pub stability_baselines: usize,

    /// Number of profiles for the score-spread analysis.
    #[serde(default = "EvaluationConfig::default_spread_profiles")]
    pub spread_profiles: usize,

    /// Cutoffs reported as HR@k.
    #[serde(default = "EvaluationConfig::default_hit_cutoffs")]
    pub hit_cutoffs: Vec<usize>,
}

impl EvaluationConfig {
    fn default_favorite_count() -> usize {
        4
    }

    fn default_avoid_count() -> usize {
        2
    }

    fn default_bootstrap_resamples() -> usize {
        10_000
    }

    fn default_bootstrap_seed() -> u64 {
        42
    }

    fn default_confidence_level() -> f64 {
        0.95
    }

    fn default_retrieval_min_candidates() -> usize {
        2
    }

    fn default_stability_min_candidates() -> usize {
        10
    }

    fn default_spread_min_candidates() -> usize {
        10
    }

    fn default_stability_baselines() -> usize {
        5
    }

    fn default_spread_profiles() -> usize {
        25
    }

    fn default_hit_cutoffs() -> Vec<usize> {
        vec![1, 3, 5]
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            favorite_count: Self::default_favorite_count(),
            avoid_count: Self::default_avoid_count(),
            bootstrap_resamples: Self::default_bootstrap_resamples(),
            bootstrap_seed: Self::default_bootstrap_seed(),
            confidence_level: Self::default_confidence_level(),
            retrieval_min_candidates: Self::default_retrieval_min_candidates(),
            stability_min_candidates: Self::default_stability_min_candidates(),
            spread_min_candidates: Self::default_spread_min_candidates(),
            stability_baselines: Self::default_stability_baselines(),
            spread_profiles: Self::default_spread_profiles(),
            hit_cutoffs: Self::default_hit_cutoffs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level or full `EnvFilter` directive (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
