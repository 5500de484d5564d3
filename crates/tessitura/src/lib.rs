//! Tessituragram-based song ranking.
//!
//! A song's tessituragram maps each MIDI pitch to the time a vocal line
//! spends on it. Given a singer's range and their favorite and avoided
//! pitches, the pipeline keeps the songs that fit the range, compares each
//! song's time distribution to an ideal preference vector, subtracts a
//! penalty for time spent on avoided pitches, and ranks the result.

pub mod explain;
pub mod filter;
pub mod ideal;
pub mod profile;
pub mod rank;
pub mod recommend;
pub mod scoring;
pub mod song;
pub mod storage;
pub mod vector;

pub use explain::explain;
pub use filter::filter_by_range;
pub use ideal::{build_ideal_vector, IdealWeights};
pub use profile::{PreferenceKind, ProfileError, ProfileRecord, RangeRecord, UserProfile};
pub use rank::Ranking;
pub use recommend::{
    rank_candidates, recommend, RecommendationRecord, Recommendations, RecommendationsFile,
};
pub use scoring::{ScoredCandidate, Scorer};
pub use song::{PitchRange, Song, SongRecord, MIDI_MAX};
pub use storage::{LibraryLoad, SongQuery};
pub use vector::{cosine_similarity, Normalization, PitchVector};

use std::path::PathBuf;

/// Errors from loading, validating, and persisting tessitura data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid song {filename}: {reason}")]
    InvalidSong { filename: String, reason: String },

    #[error("malformed profile: {0}")]
    MalformedProfile(#[from] ProfileError),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
