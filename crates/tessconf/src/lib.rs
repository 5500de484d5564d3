//! Layered configuration for the tessitura recommender.
//!
//! Kept dependency-light so every crate and binary in the workspace can
//! import it. The scoring and evaluation libraries take plain parameter
//! structs; the binary converts from these sections.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/tessitura/config.toml` (system)
//! 2. `~/.config/tessitura/config.toml` (user)
//! 3. `./tessitura.toml` or the path given with `--config` (local override)
//! 4. Environment variables (`TESSITURA_*`, `RUST_LOG`)
//!
//! A later file only replaces the keys it actually sets.
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! library = "data/tessituragrams.json"
//! results_dir = "experiment_results"
//!
//! [scoring]
//! alpha = 0.5
//! base_weight = 0.2
//!
//! [evaluation]
//! favorite_count = 4
//! avoid_count = 2
//! bootstrap_resamples = 10000
//! bootstrap_seed = 42
//! stability_min_candidates = 10
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{EvaluationConfig, PathsConfig, ScoringConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading or interpreting a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config in {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Effective configuration for one process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TessConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub evaluation: EvaluationConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl TessConfig {
    /// Build the effective configuration: defaults, each discovered file in
    /// order, then the environment. `config_path` stands in for
    /// `./tessitura.toml` when it exists.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut config = TessConfig::default();
        let mut sources = ConfigSources::default();

        for path in discover_config_files_with_override(config_path) {
            loader::load_into(&mut config, &path)?;
            sources.files.push(path);
        }
        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Render as TOML that `load_into` reads back to the same values.
    pub fn to_toml(&self) -> String {
        // Built by hand so the section order and comments stay stable
        let mut output = String::from("# tessitura effective configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!("library = \"{}\"\n", self.paths.library.display()));
        output.push_str(&format!(
            "recommendations = \"{}\"\n",
            self.paths.recommendations.display()
        ));
        output.push_str(&format!(
            "results_dir = \"{}\"\n",
            self.paths.results_dir.display()
        ));

        output.push_str("\n[scoring]\n");
        output.push_str(&format!("alpha = {:?}\n", self.scoring.alpha));
        output.push_str(&format!("base_weight = {:?}\n", self.scoring.base_weight));
        output.push_str(&format!("favorite_boost = {:?}\n", self.scoring.favorite_boost));
        output.push_str(&format!("avoid_penalty = {:?}\n", self.scoring.avoid_penalty));

        let eval = &self.evaluation;
        output.push_str("\n[evaluation]\n");
        output.push_str(&format!("favorite_count = {}\n", eval.favorite_count));
        output.push_str(&format!("avoid_count = {}\n", eval.avoid_count));
        output.push_str(&format!("bootstrap_resamples = {}\n", eval.bootstrap_resamples));
        output.push_str(&format!("bootstrap_seed = {}\n", eval.bootstrap_seed));
        output.push_str(&format!("confidence_level = {:?}\n", eval.confidence_level));
        output.push_str(&format!(
            "retrieval_min_candidates = {}\n",
            eval.retrieval_min_candidates
        ));
        output.push_str(&format!(
            "stability_min_candidates = {}\n",
            eval.stability_min_candidates
        ));
        output.push_str(&format!("spread_min_candidates = {}\n", eval.spread_min_candidates));
        output.push_str(&format!("stability_baselines = {}\n", eval.stability_baselines));
        output.push_str(&format!("spread_profiles = {}\n", eval.spread_profiles));
        let cutoffs: Vec<String> = eval.hit_cutoffs.iter().map(|k| k.to_string()).collect();
        output.push_str(&format!("hit_cutoffs = [{}]\n", cutoffs.join(", ")));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TessConfig::default();
        assert_eq!(config.scoring.alpha, 0.5);
        assert_eq!(config.scoring.base_weight, 0.2);
        assert_eq!(config.evaluation.favorite_count, 4);
        assert_eq!(config.evaluation.avoid_count, 2);
        assert_eq!(config.evaluation.bootstrap_resamples, 10_000);
        assert_eq!(config.evaluation.bootstrap_seed, 42);
        assert_eq!(config.evaluation.hit_cutoffs, vec![1, 3, 5]);
    }

    #[test]
    fn toml_lists_every_section() {
        let toml = TessConfig::default().to_toml();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[scoring]"));
        assert!(toml.contains("alpha = 0.5"));
        assert!(toml.contains("hit_cutoffs = [1, 3, 5]"));
    }

    #[test]
    fn toml_output_reparses_to_same_config() {
        let mut config = TessConfig::default();
        config.scoring.alpha = 1.0;
        config.evaluation.hit_cutoffs = vec![2, 4];

        let mut reparsed = TessConfig::default();
        loader::overlay_toml(&mut reparsed, &config.to_toml(), Path::new("roundtrip.toml"))
            .unwrap();
        assert_eq!(reparsed, config);
    }
}
