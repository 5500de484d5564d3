//! tesscli - rank songs by tessituragram fit and evaluate the ranking
//!
//! Subcommands:
//! - `tesscli recommend` - Rank the library against a singer's preferences
//! - `tesscli evaluate <analysis>` - Run the offline evaluation analyses
//! - `tesscli query` - Search the library by composer, title, or pitch
//! - `tesscli merge <file>` - Merge songs into the library
//! - `tesscli config` - Show the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tessconf::TessConfig;
use tessitura::storage::SongQuery;
use tessitura::MIDI_MAX;
use tessitura_eval::Analysis;
use tracing_subscriber::EnvFilter;

mod commands;
mod settings;

#[derive(Parser)]
#[command(name = "tesscli")]
#[command(about = "Rank songs by how well their tessitura fits a singer")]
#[command(version)]
struct Cli {
    /// Config file (replaces ./tessitura.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Song library JSON (overrides config)
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank library songs against a range and favorite/avoid pitches
    Recommend {
        /// Lowest comfortable MIDI pitch
        #[arg(long, required_unless_present = "profile", value_parser = midi_pitch())]
        low: Option<u8>,

        /// Highest comfortable MIDI pitch
        #[arg(long, required_unless_present = "profile", value_parser = midi_pitch())]
        high: Option<u8>,

        /// Favorite MIDI pitch (repeat or comma-separate)
        #[arg(long = "favorite", value_delimiter = ',', value_parser = midi_pitch())]
        favorites: Vec<u8>,

        /// MIDI pitch to avoid (repeat or comma-separate)
        #[arg(long = "avoid", value_delimiter = ',', value_parser = midi_pitch())]
        avoids: Vec<u8>,

        /// Profile JSON with range, favorite_notes, avoid_notes, alpha
        #[arg(long, conflicts_with_all = ["low", "high", "favorites", "avoids"])]
        profile: Option<PathBuf>,

        /// Avoid-penalty weight (overrides config)
        #[arg(long)]
        alpha: Option<f64>,

        /// Recommendations output file (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print only the first N songs
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Run evaluation analyses and write their JSON reports
    Evaluate {
        /// Which analysis to run
        #[arg(value_enum, default_value = "all")]
        analysis: AnalysisArg,

        /// Output directory (overrides config)
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },

    /// List library songs matching all given criteria
    Query {
        /// Composer substring (case-insensitive)
        #[arg(long)]
        composer: Option<String>,

        /// Title substring (case-insensitive)
        #[arg(long)]
        title: Option<String>,

        /// Song must reach at least this MIDI pitch
        #[arg(long, value_parser = midi_pitch())]
        min_midi: Option<u8>,

        /// Song must reach down to at most this MIDI pitch
        #[arg(long, value_parser = midi_pitch())]
        max_midi: Option<u8>,
    },

    /// Merge songs from another library file, skipping known filenames
    Merge {
        /// Library JSON with songs to add
        file: PathBuf,
    },

    /// Print the effective configuration and where it came from
    Config,
}

fn midi_pitch() -> clap::builder::RangedI64ValueParser<u8> {
    clap::value_parser!(u8).range(0..=i64::from(MIDI_MAX))
}

#[derive(Clone, Copy, ValueEnum)]
enum AnalysisArg {
    /// Self-retrieval accuracy (HR@k, MRR)
    Retrieval,
    /// Ranking stability under one-pitch changes (Kendall's tau)
    Stability,
    /// Score spread and component correlations
    Spread,
    All,
}

impl AnalysisArg {
    fn analyses(self) -> Vec<Analysis> {
        match self {
            AnalysisArg::Retrieval => vec![Analysis::Retrieval],
            AnalysisArg::Stability => vec![Analysis::Stability],
            AnalysisArg::Spread => vec![Analysis::Spread],
            AnalysisArg::All => Analysis::ALL.to_vec(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = TessConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(library) = cli.library {
        config.paths.library = library;
    }

    let filter = EnvFilter::try_new(&config.telemetry.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Recommend {
            low,
            high,
            favorites,
            avoids,
            profile,
            alpha,
            output,
            top,
        } => commands::recommend(
            &config,
            commands::RecommendArgs {
                low,
                high,
                favorites,
                avoids,
                profile,
                alpha,
                output,
                top,
            },
        )?,
        Commands::Evaluate {
            analysis,
            results_dir,
        } => commands::evaluate(&config, &analysis.analyses(), results_dir)?,
        Commands::Query {
            composer,
            title,
            min_midi,
            max_midi,
        } => commands::query(
            &config,
            SongQuery {
                composer,
                title,
                min_midi,
                max_midi,
            },
        )?,
        Commands::Merge { file } => commands::merge(&config, &file)?,
        Commands::Config => commands::show_config(&config, &sources),
    }

    Ok(())
}
