//! Offline evaluation of the tessituragram ranking pipeline.
//!
//! Three analyses drive the pipeline with profiles derived from library
//! songs themselves:
//!
//! - **retrieval**: does a song rank first for a profile built from it?
//!   (hit rate at k, mean reciprocal rank)
//! - **stability**: how much does the ranking move when one favorite or
//!   avoid pitch changes? (Kendall's τ)
//! - **spread**: how widely do scores spread, and do the score components
//!   correlate the way they should? (variance, range, Pearson r)
//!
//! Every aggregate carries a percentile bootstrap interval. Randomness flows
//! through one [`SeedStream`] per run, so reports are reproducible.

pub mod bootstrap;
pub mod params;
pub mod report;
pub mod retrieval;
pub mod spread;
pub mod stability;
pub mod stats;
pub mod synthetic;

pub use bootstrap::{BootstrapEstimator, ConfidenceInterval, SeedStream};
pub use params::HarnessParams;
pub use report::{write_report, Analysis, Metric, Summary};
pub use retrieval::{run_retrieval, RetrievalReport};
pub use spread::{run_spread, SpreadReport};
pub use stability::{run_stability, StabilityReport};
pub use synthetic::self_profile;

/// Errors from running or persisting an evaluation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tessitura::Error),

    #[error("rankings cover different songs: {0}")]
    MismatchedRankings(String),
}

pub type Result<T> = std::result::Result<T, Error>;
