//! Score spread and internal validity of the score components.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tessitura::{rank_candidates, LibraryLoad};
use tracing::{info, instrument, warn};

use crate::bootstrap::SeedStream;
use crate::params::HarnessParams;
use crate::report::Summary;
use crate::stats::{pearson, value_range, variance};
use crate::synthetic::{first_qualifying, Qualifying, SourcedProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadRecord {
    pub source_song: String,
    pub composer: String,
    pub n_songs: usize,
    pub variance_final_score: f64,
    pub range_final_score: f64,
    pub r_final_score_cosine: f64,
    pub r_final_score_avoid: f64,
    pub r_cosine_favorite_overlap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadSummary {
    pub total_songs_in_library: usize,
    pub invalid_songs: usize,
    /// Songs passed over before enough profiles were found.
    pub skipped_profile: usize,
    pub skipped_too_few_candidates: usize,
    pub n_profiles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadMetrics {
    pub variance_final_score: Summary,
    pub range_final_score: Summary,
    /// Expected positive.
    pub r_final_score_cosine_similarity: Summary,
    /// Expected negative.
    pub r_final_score_avoid_penalty: Summary,
    /// Expected positive.
    pub r_cosine_similarity_favorite_overlap: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadReport {
    pub experiment: String,
    pub parameters: HarnessParams,
    pub data_summary: SpreadSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SpreadMetrics>,
    pub per_run: Vec<SpreadRecord>,
}

fn score_profile(sourced: &SourcedProfile<'_>, params: &HarnessParams) -> SpreadRecord {
    let ranking = rank_candidates(&sourced.candidates, &sourced.profile, &params.weights);
    let candidates = ranking.candidates();

    let final_scores: Vec<f64> = candidates.iter().map(|c| c.final_score).collect();
    let cosines: Vec<f64> = candidates.iter().map(|c| c.cosine_similarity).collect();
    let avoids: Vec<f64> = candidates.iter().map(|c| c.avoid_penalty).collect();
    let favorites: Vec<f64> = candidates.iter().map(|c| c.favorite_overlap).collect();

    SpreadRecord {
        source_song: sourced.source.filename.clone(),
        composer: sourced.source.composer.clone(),
        n_songs: candidates.len(),
        variance_final_score: variance(&final_scores, 1),
        range_final_score: value_range(&final_scores),
        r_final_score_cosine: pearson(&final_scores, &cosines),
        r_final_score_avoid: pearson(&final_scores, &avoids),
        r_cosine_favorite_overlap: pearson(&cosines, &favorites),
    }
}

fn column(records: &[SpreadRecord], field: impl Fn(&SpreadRecord) -> f64) -> Vec<f64> {
    records.iter().map(field).collect()
}

/// Score the first `spread_profiles` qualifying profiles and summarize how
/// the final score spreads and relates to its components.
#[instrument(skip_all, fields(songs = library.songs.len()))]
pub fn run_spread(
    library: &LibraryLoad,
    params: &HarnessParams,
    stream: &mut SeedStream,
) -> SpreadReport {
    let Qualifying { profiles, skipped } = first_qualifying(
        &library.songs,
        params,
        params.spread_min_candidates,
        params.spread_profiles,
    );

    let per_run: Vec<SpreadRecord> = profiles
        .par_iter()
        .map(|sourced| score_profile(sourced, params))
        .collect();

    let mut report = SpreadReport {
        experiment: "RQ3_score_spread_internal_validity".into(),
        parameters: params.clone(),
        data_summary: SpreadSummary {
            total_songs_in_library: library.total(),
            invalid_songs: library.rejected.len(),
            skipped_profile: skipped.profile,
            skipped_too_few_candidates: skipped.too_few_candidates,
            n_profiles: per_run.len(),
        },
        error: None,
        metrics: None,
        per_run,
    };

    if report.per_run.is_empty() {
        let message = format!(
            "no song yielded at least {} candidates",
            params.spread_min_candidates
        );
        warn!("{message}");
        report.error = Some(message);
        return report;
    }

    let estimator = params.estimator();
    let runs = &report.per_run;
    let variances = column(runs, |r| r.variance_final_score);
    let ranges = column(runs, |r| r.range_final_score);
    let r_fc = column(runs, |r| r.r_final_score_cosine);
    let r_fa = column(runs, |r| r.r_final_score_avoid);
    let r_cf = column(runs, |r| r.r_cosine_favorite_overlap);

    let metrics = SpreadMetrics {
        variance_final_score: Summary::of(&variances, &estimator, stream),
        range_final_score: Summary::of(&ranges, &estimator, stream),
        r_final_score_cosine_similarity: Summary::of(&r_fc, &estimator, stream),
        r_final_score_avoid_penalty: Summary::of(&r_fa, &estimator, stream),
        r_cosine_similarity_favorite_overlap: Summary::of(&r_cf, &estimator, stream),
    };
    info!(
        profiles = report.per_run.len(),
        mean_variance = metrics.variance_final_score.mean,
        mean_r_final_avoid = metrics.r_final_score_avoid_penalty.mean,
        "spread analysis complete"
    );

    report.metrics = Some(metrics);
    report
}
