//! CLI command implementations

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tessconf::{ConfigSources, TessConfig};
use tessitura::storage::{self, LibraryLoad, SongQuery};
use tessitura::{recommend as run_pipeline, Song, UserProfile};
use tessitura_eval::{
    run_retrieval, run_spread, run_stability, write_report, Analysis, HarnessParams, SeedStream,
};
use tracing::{info, warn};

use crate::settings::{harness_params, ideal_weights, profile_from_args};

fn load_library(path: &Path) -> Result<LibraryLoad> {
    let load = storage::load_library(path)
        .with_context(|| format!("Failed to load library {}", path.display()))?;
    if !load.rejected.is_empty() {
        warn!(
            rejected = load.rejected.len(),
            "some library entries were invalid and left out"
        );
    }
    info!(songs = load.songs.len(), path = %path.display(), "library loaded");
    Ok(load)
}

/// Arguments for `recommend`.
pub struct RecommendArgs {
    pub low: Option<u8>,
    pub high: Option<u8>,
    pub favorites: Vec<u8>,
    pub avoids: Vec<u8>,
    pub profile: Option<PathBuf>,
    pub alpha: Option<f64>,
    pub output: Option<PathBuf>,
    pub top: Option<usize>,
}

pub fn recommend(config: &TessConfig, args: RecommendArgs) -> Result<()> {
    let profile = match &args.profile {
        Some(path) => {
            let loaded = storage::load_profile(path)
                .with_context(|| format!("Invalid profile {}", path.display()))?;
            match args.alpha {
                Some(alpha) => UserProfile::new(
                    loaded.range(),
                    loaded.favorites().iter().copied(),
                    loaded.avoids().iter().copied(),
                    alpha,
                )
                .context("Invalid preferences")?,
                None => loaded,
            }
        }
        None => {
            let (low, high) = args
                .low
                .zip(args.high)
                .context("--low and --high are required without --profile")?;
            let alpha = args.alpha.unwrap_or(config.scoring.alpha);
            profile_from_args(low, high, &args.favorites, &args.avoids, alpha)
                .context("Invalid preferences")?
        }
    };

    let library = load_library(&config.paths.library)?;
    let result = run_pipeline(&library.songs, &profile, &ideal_weights(&config.scoring));

    if result.ranking.is_empty() {
        println!("No songs fit the range {}.", profile.range());
    }

    let file = result.to_file(&library.songs);
    let shown = args.top.unwrap_or(file.recommendations.len());
    for rec in file.recommendations.iter().take(shown) {
        println!(
            "{:>3}. {:<40} {:>7.4}  {} - {}",
            rec.rank, rec.filename, rec.final_score, rec.composer, rec.title
        );
        println!("     {}", rec.explanation);
    }

    let output = args.output.unwrap_or_else(|| config.paths.recommendations.clone());
    storage::save_recommendations(&output, &file)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("\nSaved {} recommendations to {}", file.recommendations.len(), output.display());
    Ok(())
}

pub fn evaluate(
    config: &TessConfig,
    analyses: &[Analysis],
    results_dir: Option<PathBuf>,
) -> Result<()> {
    let params: HarnessParams = harness_params(config);
    let dir = results_dir.unwrap_or_else(|| config.paths.results_dir.clone());
    let library = load_library(&config.paths.library)?;

    // One stream per run, consumed in analysis order
    let mut stream = SeedStream::new(params.bootstrap_seed);

    for analysis in analyses {
        let path = match analysis {
            Analysis::Retrieval => {
                let report = run_retrieval(&library, &params, &mut stream);
                println!("Self-retrieval: {} queries", report.data_summary.valid_queries);
                for (name, metric) in &report.metrics {
                    println!("  {name}: {:.4}  {}", metric.value, interval(metric.ci));
                }
                write_report(&dir, *analysis, &report)?
            }
            Analysis::Stability => {
                let report = run_stability(&library, &params, &mut stream)?;
                match (&report.metrics, &report.error) {
                    (Some(m), _) => {
                        println!(
                            "Stability: {} baselines, {} perturbations",
                            report.data_summary.n_baselines,
                            report.data_summary.total_perturbations
                        );
                        println!(
                            "  mean tau: {:.4} (std {:.4})  {}",
                            m.tau.mean,
                            m.tau.std,
                            interval(m.tau.ci)
                        );
                    }
                    (None, Some(err)) => println!("Stability: {err}"),
                    (None, None) => {}
                }
                write_report(&dir, *analysis, &report)?
            }
            Analysis::Spread => {
                let report = run_spread(&library, &params, &mut stream);
                match (&report.metrics, &report.error) {
                    (Some(m), _) => {
                        println!("Score spread: {} profiles", report.data_summary.n_profiles);
                        println!(
                            "  mean variance: {:.6}  {}",
                            m.variance_final_score.mean,
                            interval(m.variance_final_score.ci)
                        );
                        println!(
                            "  r(final, avoid): {:.4}  {}",
                            m.r_final_score_avoid_penalty.mean,
                            interval(m.r_final_score_avoid_penalty.ci)
                        );
                    }
                    (None, Some(err)) => println!("Score spread: {err}"),
                    (None, None) => {}
                }
                write_report(&dir, *analysis, &report)?
            }
        };
        println!("  -> {}", path.display());
    }
    Ok(())
}

fn interval(ci: Option<tessitura_eval::ConfidenceInterval>) -> String {
    match ci {
        Some(ci) => format!("[{:.4}, {:.4}]", ci.lower, ci.upper),
        None => "[no data]".to_string(),
    }
}

pub fn query(config: &TessConfig, query: SongQuery) -> Result<()> {
    let library = load_library(&config.paths.library)?;
    let matches: Vec<&Song> = storage::query_songs(&library.songs, &query);
    for song in &matches {
        println!(
            "{:<40} {:>9}  {} - {}",
            song.filename,
            song.pitch_range().to_string(),
            song.composer,
            song.title
        );
    }
    println!("{} of {} songs match", matches.len(), library.songs.len());
    Ok(())
}

pub fn merge(config: &TessConfig, new_file: &Path) -> Result<()> {
    let target = &config.paths.library;
    let existing = if target.exists() {
        storage::load_library_records(target)
            .with_context(|| format!("Failed to read {}", target.display()))?
    } else {
        Vec::new()
    };
    let incoming = storage::load_library_records(new_file)
        .with_context(|| format!("Failed to read {}", new_file.display()))?;

    let offered = incoming.len();
    let (merged, added) = storage::merge_songs(existing, incoming);
    storage::save_library(target, &merged)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    info!(added, skipped = offered - added, "merged library");
    println!(
        "Added {added} of {offered} songs; {} now has {} songs",
        target.display(),
        merged.len()
    );
    Ok(())
}

pub fn show_config(config: &TessConfig, sources: &ConfigSources) {
    print!("{}", config.to_toml());
    println!();
    if sources.files.is_empty() {
        println!("# No config files found; using defaults");
    }
    for file in &sources.files {
        println!("# loaded: {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# env override: {var}");
    }
}
