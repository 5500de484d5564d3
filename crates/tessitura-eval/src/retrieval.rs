//! Self-retrieval: profile built from a song, does that song come back first?

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tessitura::{rank_candidates, LibraryLoad};
use tracing::{debug, info, instrument};

use crate::bootstrap::SeedStream;
use crate::params::HarnessParams;
use crate::report::Metric;
use crate::synthetic::{sourced_profile, Skip, SkipCounts};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub filename: String,
    pub composer: String,
    pub title: String,
    pub rank: usize,
    pub candidates: usize,
    /// `"hit@k"` → whether rank ≤ k
    pub hits: BTreeMap<String, bool>,
    pub reciprocal_rank: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSummary {
    pub total_songs_in_library: usize,
    pub invalid_songs: usize,
    pub valid_queries: usize,
    pub skipped_profile: usize,
    pub skipped_too_few_candidates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalReport {
    pub experiment: String,
    pub parameters: HarnessParams,
    pub data_summary: RetrievalSummary,
    /// `"HR@k"` for each cutoff plus `"MRR"`
    pub metrics: BTreeMap<String, Metric>,
    pub per_query: Vec<RetrievalQuery>,
}

enum Outcome {
    Query(RetrievalQuery),
    Skipped(Skip),
}

/// Run one self-retrieval query per valid song.
///
/// Songs whose candidate set is below `retrieval_min_candidates` are
/// skipped and counted, as are songs that yield no valid profile.
#[instrument(skip_all, fields(songs = library.songs.len()))]
pub fn run_retrieval(
    library: &LibraryLoad,
    params: &HarnessParams,
    stream: &mut SeedStream,
) -> RetrievalReport {
    let songs = &library.songs;

    let outcomes: Vec<Outcome> = songs
        .par_iter()
        .map(|song| {
            let min = params.retrieval_min_candidates;
            let sourced = match sourced_profile(songs, song, params, min) {
                Ok(sourced) => sourced,
                Err(skip) => return Outcome::Skipped(skip),
            };
            let ranking =
                rank_candidates(&sourced.candidates, &sourced.profile, &params.weights);
            let Some(rank) = ranking.rank_of(&song.filename) else {
                return Outcome::Skipped(Skip::SourceNotCandidate);
            };
            debug!(
                filename = %song.filename,
                rank,
                candidates = ranking.len(),
                "self-retrieval query"
            );

            Outcome::Query(RetrievalQuery {
                filename: song.filename.clone(),
                composer: song.composer.clone(),
                title: song.title.clone(),
                rank,
                candidates: ranking.len(),
                hits: params
                    .hit_cutoffs
                    .iter()
                    .map(|k| (format!("hit@{k}"), rank <= *k))
                    .collect(),
                reciprocal_rank: 1.0 / rank as f64,
            })
        })
        .collect();

    let mut per_query = Vec::new();
    let mut skipped = SkipCounts::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Query(q) => per_query.push(q),
            Outcome::Skipped(skip) => skipped.record(&skip),
        }
    }

    let estimator = params.estimator();
    let mut metrics = BTreeMap::new();
    for k in &params.hit_cutoffs {
        let hits: Vec<f64> = per_query
            .iter()
            .map(|q| if q.rank <= *k { 1.0 } else { 0.0 })
            .collect();
        metrics.insert(format!("HR@{k}"), Metric::mean_of(&hits, &estimator, stream));
    }
    let reciprocal: Vec<f64> = per_query.iter().map(|q| q.reciprocal_rank).collect();
    metrics.insert("MRR".to_string(), Metric::mean_of(&reciprocal, &estimator, stream));

    info!(
        queries = per_query.len(),
        skipped = skipped.total(),
        mrr = metrics["MRR"].value,
        "self-retrieval complete"
    );

    RetrievalReport {
        experiment: "RQ1_self_retrieval_accuracy".into(),
        parameters: params.clone(),
        data_summary: RetrievalSummary {
            total_songs_in_library: library.total(),
            invalid_songs: library.rejected.len(),
            valid_queries: per_query.len(),
            skipped_profile: skipped.profile,
            skipped_too_few_candidates: skipped.too_few_candidates,
        },
        metrics,
        per_query,
    }
}
