//! Locating config files, overlaying them, and applying `TESSITURA_*` variables.

use crate::{ConfigError, TessConfig};
use std::env;
use std::path::{Path, PathBuf};

const SYSTEM_CONFIG: &str = "/etc/tessitura/config.toml";
const LOCAL_CONFIG: &str = "tessitura.toml";

/// Record of what contributed to an effective configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Files overlaid, in load order.
    pub files: Vec<PathBuf>,
    /// Environment variables that replaced a value.
    pub env_overrides: Vec<String>,
}

/// Existing config files in load order: system, user, then either the
/// explicit `cli_path` or `./tessitura.toml`.
///
/// A `cli_path` that does not exist falls back to the local file.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let user = directories::BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("tessitura").join("config.toml"));
    let local = cli_path
        .filter(|p| p.exists())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG));

    [Some(PathBuf::from(SYSTEM_CONFIG)), user, Some(local)]
        .into_iter()
        .flatten()
        .filter(|p| p.exists())
        .collect()
}

/// Read a TOML file and overlay the keys it sets onto `config`.
pub fn load_into(config: &mut TessConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    overlay_toml(config, &contents, path)
}

/// Overlay the keys present in a TOML document. Keys the document does not
/// mention keep whatever value `config` already had.
pub(crate) fn overlay_toml(
    config: &mut TessConfig,
    contents: &str,
    path: &Path,
) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let invalid = |key: &str, expected: &str| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("{key} must be {expected}"),
    };

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        if let Some(v) = paths.get("library").and_then(|v| v.as_str()) {
            config.paths.library = expand_path(v);
        }
        if let Some(v) = paths.get("recommendations").and_then(|v| v.as_str()) {
            config.paths.recommendations = expand_path(v);
        }
        if let Some(v) = paths.get("results_dir").and_then(|v| v.as_str()) {
            config.paths.results_dir = expand_path(v);
        }
    }

    if let Some(scoring) = table.get("scoring").and_then(|v| v.as_table()) {
        if let Some(v) = scoring.get("alpha") {
            config.scoring.alpha = as_float(v).ok_or_else(|| invalid("scoring.alpha", "a number"))?;
        }
        if let Some(v) = scoring.get("base_weight") {
            config.scoring.base_weight =
                as_float(v).ok_or_else(|| invalid("scoring.base_weight", "a number"))?;
        }
        if let Some(v) = scoring.get("favorite_boost") {
            config.scoring.favorite_boost =
                as_float(v).ok_or_else(|| invalid("scoring.favorite_boost", "a number"))?;
        }
        if let Some(v) = scoring.get("avoid_penalty") {
            config.scoring.avoid_penalty =
                as_float(v).ok_or_else(|| invalid("scoring.avoid_penalty", "a number"))?;
        }
    }

    if let Some(eval) = table.get("evaluation").and_then(|v| v.as_table()) {
        let count = |key: &str| -> Result<Option<usize>, ConfigError> {
            match eval.get(key) {
                None => Ok(None),
                Some(v) => v
                    .as_integer()
                    .and_then(|n| usize::try_from(n).ok())
                    .map(Some)
                    .ok_or_else(|| invalid(&format!("evaluation.{key}"), "a non-negative integer")),
            }
        };

        if let Some(n) = count("favorite_count")? {
            config.evaluation.favorite_count = n;
        }
        if let Some(n) = count("avoid_count")? {
            config.evaluation.avoid_count = n;
        }
        if let Some(n) = count("bootstrap_resamples")? {
            config.evaluation.bootstrap_resamples = n;
        }
        if let Some(n) = count("retrieval_min_candidates")? {
            config.evaluation.retrieval_min_candidates = n;
        }
        if let Some(n) = count("stability_min_candidates")? {
            config.evaluation.stability_min_candidates = n;
        }
        if let Some(n) = count("spread_min_candidates")? {
            config.evaluation.spread_min_candidates = n;
        }
        if let Some(n) = count("stability_baselines")? {
            config.evaluation.stability_baselines = n;
        }
        if let Some(n) = count("spread_profiles")? {
            config.evaluation.spread_profiles = n;
        }
        if let Some(v) = eval.get("bootstrap_seed") {
            config.evaluation.bootstrap_seed = v
                .as_integer()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| invalid("evaluation.bootstrap_seed", "a non-negative integer"))?;
        }
        if let Some(v) = eval.get("confidence_level") {
            config.evaluation.confidence_level = as_float(v)
                .filter(|c| *c > 0.0 && *c < 1.0)
                .ok_or_else(|| invalid("evaluation.confidence_level", "a number in (0, 1)"))?;
        }
        if let Some(v) = eval.get("hit_cutoffs") {
            let cutoffs = v
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .map(|i| i.as_integer().and_then(|n| usize::try_from(n).ok()))
                        .collect::<Option<Vec<_>>>()
                })
                .flatten()
                .ok_or_else(|| invalid("evaluation.hit_cutoffs", "an array of integers"))?;
            config.evaluation.hit_cutoffs = cutoffs;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
    }

    Ok(())
}

/// TOML integers are accepted where floats are expected (`alpha = 1`).
fn as_float(value: &toml::Value) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
}

fn env_value(name: &str, sources: &mut ConfigSources) -> Option<String> {
    let value = env::var(name).ok()?;
    sources.env_overrides.push(name.to_string());
    Some(value)
}

fn env_parsed<T: std::str::FromStr>(name: &str, sources: &mut ConfigSources) -> Option<T> {
    let parsed = env::var(name).ok()?.parse().ok()?;
    sources.env_overrides.push(name.to_string());
    Some(parsed)
}

/// Apply `TESSITURA_*` overrides, then `RUST_LOG`. Unparseable numbers are
/// ignored and not recorded as overrides.
pub fn apply_env_overrides(config: &mut TessConfig, sources: &mut ConfigSources) {
    if let Some(v) = env_value("TESSITURA_LIBRARY", sources) {
        config.paths.library = expand_path(&v);
    }
    if let Some(v) = env_value("TESSITURA_RESULTS_DIR", sources) {
        config.paths.results_dir = expand_path(&v);
    }
    if let Some(alpha) = env_parsed("TESSITURA_ALPHA", sources) {
        config.scoring.alpha = alpha;
    }
    if let Some(seed) = env_parsed("TESSITURA_BOOTSTRAP_SEED", sources) {
        config.evaluation.bootstrap_seed = seed;
    }
    if let Some(n) = env_parsed("TESSITURA_BOOTSTRAP_RESAMPLES", sources) {
        config.evaluation.bootstrap_resamples = n;
    }
    if let Some(level) = env_value("TESSITURA_LOG_LEVEL", sources) {
        config.telemetry.log_level = level;
    }
    if let Some(level) = env_value("RUST_LOG", sources) {
        config.telemetry.log_level = level;
    }
}

/// Expand a leading `~/` or `$VAR` component. Anything unresolvable is
/// returned unchanged.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        return match directories::BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(rest),
            None => PathBuf::from(path),
        };
    }

    if let Some(var_and_rest) = path.strip_prefix('$') {
        let (var, rest) = var_and_rest
            .split_once('/')
            .unwrap_or((var_and_rest, ""));
        if let Ok(base) = env::var(var) {
            let base = PathBuf::from(base);
            return if rest.is_empty() { base } else { base.join(rest) };
        }
    }

    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<TessConfig, ConfigError> {
        let mut config = TessConfig::default();
        overlay_toml(&mut config, toml, Path::new("test.toml"))?;
        Ok(config)
    }

    #[test]
    fn home_prefix_is_expanded() {
        let expanded = expand_path("~/songs/library.json");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("songs/library.json"));
    }

    #[test]
    fn plain_paths_pass_through() {
        assert_eq!(expand_path("/srv/library.json"), PathBuf::from("/srv/library.json"));
        assert_eq!(expand_path("data/x.json"), PathBuf::from("data/x.json"));
        assert_eq!(
            expand_path("$TESSITURA_SURELY_UNSET_VAR/x.json"),
            PathBuf::from("$TESSITURA_SURELY_UNSET_VAR/x.json")
        );
    }

    #[test]
    fn missing_cli_path_falls_back_to_local_file() {
        let files = discover_config_files_with_override(Some(Path::new("/nonexistent/cfg.toml")));
        assert!(files.iter().all(|f| f.exists()));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse(
            r#"
[scoring]
alpha = 0.8
"#,
        )
        .unwrap();
        assert_eq!(config.scoring.alpha, 0.8);
        assert_eq!(config.scoring.base_weight, 0.2);
        assert_eq!(config.evaluation.bootstrap_seed, 42);
    }

    #[test]
    fn every_section_is_read() {
        let config = parse(
            r#"
[paths]
library = "/data/songs.json"
results_dir = "/data/results"

[scoring]
alpha = 1
base_weight = 0.1

[evaluation]
favorite_count = 3
avoid_count = 1
bootstrap_resamples = 500
bootstrap_seed = 7
confidence_level = 0.9
stability_min_candidates = 4
spread_profiles = 12
hit_cutoffs = [1, 10]

[telemetry]
log_level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(config.paths.library, PathBuf::from("/data/songs.json"));
        assert_eq!(config.paths.results_dir, PathBuf::from("/data/results"));
        assert_eq!(
            config.paths.recommendations,
            PathBuf::from("data/recommendations.json")
        );
        assert_eq!(config.scoring.alpha, 1.0);
        assert_eq!(config.scoring.base_weight, 0.1);
        assert_eq!(config.evaluation.favorite_count, 3);
        assert_eq!(config.evaluation.avoid_count, 1);
        assert_eq!(config.evaluation.bootstrap_resamples, 500);
        assert_eq!(config.evaluation.bootstrap_seed, 7);
        assert_eq!(config.evaluation.confidence_level, 0.9);
        assert_eq!(config.evaluation.stability_min_candidates, 4);
        assert_eq!(config.evaluation.spread_profiles, 12);
        assert_eq!(config.evaluation.hit_cutoffs, vec![1, 10]);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn later_file_only_overrides_keys_it_sets() {
        let mut config = TessConfig::default();
        overlay_toml(&mut config, "[scoring]\nalpha = 0.9\n", Path::new("a.toml")).unwrap();
        overlay_toml(&mut config, "[scoring]\nbase_weight = 0.3\n", Path::new("b.toml")).unwrap();
        assert_eq!(config.scoring.alpha, 0.9);
        assert_eq!(config.scoring.base_weight, 0.3);
    }

    #[test]
    fn negative_counts_are_rejected() {
        let err = parse("[evaluation]\nfavorite_count = -1\n").unwrap_err();
        assert!(err.to_string().contains("evaluation.favorite_count"));
    }

    #[test]
    fn confidence_outside_unit_interval_is_rejected() {
        assert!(parse("[evaluation]\nconfidence_level = 1.5\n").is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse("[scoring\nalpha = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_into_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tessitura.toml");
        std::fs::write(&path, "[evaluation]\nspread_profiles = 3\n").unwrap();

        let mut config = TessConfig::default();
        load_into(&mut config, &path).unwrap();
        assert_eq!(config.evaluation.spread_profiles, 3);
    }

    #[test]
    fn load_into_missing_file() {
        let mut config = TessConfig::default();
        let err = load_into(&mut config, Path::new("/nonexistent/tessitura.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
