//! Ranking stability under one-pitch profile changes.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tessitura::{rank_candidates, LibraryLoad, PreferenceKind, Ranking, UserProfile};
use tracing::{info, instrument, warn};

use crate::bootstrap::SeedStream;
use crate::params::HarnessParams;
use crate::report::Summary;
use crate::stats::{kendall_tau, mean, std_dev};
use crate::synthetic::{first_qualifying, Qualifying, SourcedProfile};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationKind {
    #[serde(rename = "add_fav")]
    AddFavorite,
    #[serde(rename = "remove_fav")]
    RemoveFavorite,
    AddAvoid,
    RemoveAvoid,
}

impl PerturbationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PerturbationKind::AddFavorite => "add_fav",
            PerturbationKind::RemoveFavorite => "remove_fav",
            PerturbationKind::AddAvoid => "add_avoid",
            PerturbationKind::RemoveAvoid => "remove_avoid",
        }
    }

    fn change(self) -> (PreferenceKind, bool) {
        match self {
            PerturbationKind::AddFavorite => (PreferenceKind::Favorite, true),
            PerturbationKind::RemoveFavorite => (PreferenceKind::Favorite, false),
            PerturbationKind::AddAvoid => (PreferenceKind::Avoid, true),
            PerturbationKind::RemoveAvoid => (PreferenceKind::Avoid, false),
        }
    }
}

/// Every single-pitch change of `profile`, grouped by kind in ascending pitch
/// order. Added pitches lie in range and are in neither list.
pub fn perturbations(profile: &UserProfile) -> Vec<(PerturbationKind, u8)> {
    let unused: Vec<u8> = profile
        .range()
        .pitches()
        .filter(|p| !profile.favorites().contains(p) && !profile.avoids().contains(p))
        .collect();

    let mut out = Vec::new();
    out.extend(unused.iter().map(|p| (PerturbationKind::AddFavorite, *p)));
    out.extend(profile.favorites().iter().map(|p| (PerturbationKind::RemoveFavorite, *p)));
    out.extend(unused.iter().map(|p| (PerturbationKind::AddAvoid, *p)));
    out.extend(profile.avoids().iter().map(|p| (PerturbationKind::RemoveAvoid, *p)));
    out
}

/// Kendall's τ between two rankings of the same songs.
pub fn ranking_tau(baseline: &Ranking, other: &Ranking) -> Result<f64> {
    let other_positions = other.positions();
    let names = baseline.filenames();
    let unique: HashSet<&str> = names.iter().copied().collect();
    let same_songs = baseline.len() == other.len()
        && unique.len() == names.len()
        && names.iter().all(|f| other_positions.contains_key(f));
    if !same_songs {
        return Err(Error::MismatchedRankings(format!(
            "{} vs {} candidates",
            baseline.len(),
            other.len()
        )));
    }

    let (a, b): (Vec<usize>, Vec<usize>) = baseline
        .iter()
        .map(|(rank, c)| (rank, other_positions[c.filename.as_str()]))
        .unzip();
    Ok(kendall_tau(&a, &b))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationRecord {
    pub baseline_source: String,
    pub perturbation_type: PerturbationKind,
    pub midi_changed: u8,
    pub tau: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub source_song: String,
    pub composer: String,
    pub low_midi: u8,
    pub high_midi: u8,
    pub favorites: Vec<u8>,
    pub avoids: Vec<u8>,
    pub candidates: usize,
    pub n_perturbations: usize,
    pub mean_tau: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilitySummary {
    pub total_songs_in_library: usize,
    pub invalid_songs: usize,
    /// Songs passed over before enough baselines were found.
    pub skipped_profile: usize,
    pub skipped_too_few_candidates: usize,
    pub n_baselines: usize,
    pub total_perturbations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityMetrics {
    pub tau: Summary,
    pub mean_tau_per_baseline: f64,
    /// Population standard deviation of the per-baseline means.
    pub std_tau_across_baselines: f64,
    pub mean_tau_by_kind: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    pub experiment: String,
    pub parameters: HarnessParams,
    pub data_summary: StabilitySummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<StabilityMetrics>,
    pub baseline_profiles: Vec<BaselineRecord>,
    pub per_perturbation: Vec<PerturbationRecord>,
}

fn run_baseline(
    sourced: &SourcedProfile<'_>,
    params: &HarnessParams,
) -> Result<Vec<PerturbationRecord>> {
    let baseline = rank_candidates(&sourced.candidates, &sourced.profile, &params.weights);

    perturbations(&sourced.profile)
        .into_par_iter()
        .filter_map(|(kind, pitch)| {
            let (list, add) = kind.change();
            match sourced.profile.with_change(list, pitch, add) {
                Ok(changed) => Some((kind, pitch, changed)),
                Err(err) => {
                    warn!(kind = kind.as_str(), pitch, %err, "skipping perturbation");
                    None
                }
            }
        })
        .map(|(kind, pitch, changed)| {
            let ranking = rank_candidates(&sourced.candidates, &changed, &params.weights);
            Ok(PerturbationRecord {
                baseline_source: sourced.source.filename.clone(),
                perturbation_type: kind,
                midi_changed: pitch,
                tau: ranking_tau(&baseline, &ranking)?,
            })
        })
        .collect()
}

/// Perturb the first `stability_baselines` qualifying profiles one pitch at a
/// time and compare each new ranking with the baseline.
///
/// The candidate set of a baseline is fixed across its perturbations.
#[instrument(skip_all, fields(songs = library.songs.len()))]
pub fn run_stability(
    library: &LibraryLoad,
    params: &HarnessParams,
    stream: &mut SeedStream,
) -> Result<StabilityReport> {
    let Qualifying {
        profiles: baselines,
        skipped,
    } = first_qualifying(
        &library.songs,
        params,
        params.stability_min_candidates,
        params.stability_baselines,
    );

    let mut report = StabilityReport {
        experiment: "RQ2_ranking_stability".into(),
        parameters: params.clone(),
        data_summary: StabilitySummary {
            total_songs_in_library: library.total(),
            invalid_songs: library.rejected.len(),
            skipped_profile: skipped.profile,
            skipped_too_few_candidates: skipped.too_few_candidates,
            n_baselines: baselines.len(),
            total_perturbations: 0,
        },
        error: None,
        metrics: None,
        baseline_profiles: Vec::new(),
        per_perturbation: Vec::new(),
    };

    if baselines.is_empty() {
        let message = format!(
            "no song yielded at least {} candidates",
            params.stability_min_candidates
        );
        warn!("{message}");
        report.error = Some(message);
        return Ok(report);
    }

    for sourced in &baselines {
        let records = run_baseline(sourced, params)?;
        let taus: Vec<f64> = records.iter().map(|r| r.tau).collect();
        report.baseline_profiles.push(BaselineRecord {
            source_song: sourced.source.filename.clone(),
            composer: sourced.source.composer.clone(),
            low_midi: sourced.profile.range().min(),
            high_midi: sourced.profile.range().max(),
            favorites: sourced.profile.favorites().iter().copied().collect(),
            avoids: sourced.profile.avoids().iter().copied().collect(),
            candidates: sourced.candidates.len(),
            n_perturbations: records.len(),
            mean_tau: mean(&taus),
        });
        report.per_perturbation.extend(records);
    }

    let taus: Vec<f64> = report.per_perturbation.iter().map(|r| r.tau).collect();
    let baseline_means: Vec<f64> =
        report.baseline_profiles.iter().map(|b| b.mean_tau).collect();

    let mut by_kind: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in &report.per_perturbation {
        by_kind
            .entry(record.perturbation_type.as_str().to_string())
            .or_default()
            .push(record.tau);
    }

    let tau = Summary::of(&taus, &params.estimator(), stream);
    info!(
        baselines = baselines.len(),
        perturbations = taus.len(),
        mean_tau = tau.mean,
        "stability analysis complete"
    );

    report.data_summary.total_perturbations = taus.len();
    report.metrics = Some(StabilityMetrics {
        tau,
        mean_tau_per_baseline: mean(&baseline_means),
        std_tau_across_baselines: std_dev(&baseline_means, 0),
        mean_tau_by_kind: by_kind.into_iter().map(|(k, v)| (k, mean(&v))).collect(),
    });
    Ok(report)
}
