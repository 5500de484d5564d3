use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::explain::explain;
use crate::filter::filter_by_range;
use crate::ideal::IdealWeights;
use crate::profile::{ProfileRecord, UserProfile};
use crate::rank::Ranking;
use crate::scoring::Scorer;
use crate::song::Song;

/// Score `candidates` against `profile` and rank them.
///
/// Candidates are taken as given; callers that hold a candidate set fixed
/// across profile variations use this directly.
pub fn rank_candidates(
    candidates: &[&Song],
    profile: &UserProfile,
    weights: &IdealWeights,
) -> Ranking {
    rank_with(&Scorer::new(profile, weights), candidates)
}

fn rank_with(scorer: &Scorer, candidates: &[&Song]) -> Ranking {
    Ranking::new(candidates.iter().map(|song| scorer.score(song)).collect())
}

/// Result of one full pipeline run.
#[derive(Debug, Clone)]
pub struct Recommendations {
    pub profile: UserProfile,
    pub scorer: Scorer,
    pub ranking: Ranking,
}

/// Range filter, ideal vector, scoring and ranking over a library.
pub fn recommend(
    library: &[Song],
    profile: &UserProfile,
    weights: &IdealWeights,
) -> Recommendations {
    let candidates = filter_by_range(library, profile.range());
    debug!(
        range = %profile.range(),
        library = library.len(),
        candidates = candidates.len(),
        "range filter applied"
    );

    let scorer = Scorer::new(profile, weights);
    let ranking = rank_with(&scorer, &candidates);

    if let Some(best) = ranking.candidates().first() {
        info!(
            candidates = ranking.len(),
            top = %best.filename,
            score = best.final_score,
            "ranked candidates"
        );
    } else {
        info!(range = %profile.range(), "no songs fit the requested range");
    }

    Recommendations {
        profile: profile.clone(),
        scorer,
        ranking,
    }
}

/// One ranked song as written to the recommendations file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub rank: usize,
    pub filename: String,
    pub composer: String,
    pub title: String,
    pub final_score: f64,
    pub cosine_similarity: f64,
    pub avoid_penalty: f64,
    pub favorite_overlap: f64,
    pub explanation: String,
    /// MIDI number → share of singing time inside the query range
    #[serde(default)]
    pub normalized_vector: BTreeMap<String, f64>,
}

/// Persisted output of a recommendation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsFile {
    pub user_preferences: ProfileRecord,
    /// MIDI number → ideal weight
    pub ideal_vector: BTreeMap<String, f64>,
    pub recommendations: Vec<RecommendationRecord>,
}

impl Recommendations {
    /// Build the persisted form. Songs are looked up in `library` to record
    /// their normalized vectors.
    pub fn to_file(&self, library: &[Song]) -> RecommendationsFile {
        let by_name: BTreeMap<&str, &Song> =
            library.iter().map(|s| (s.filename.as_str(), s)).collect();

        let recommendations = self
            .ranking
            .iter()
            .map(|(rank, c)| RecommendationRecord {
                rank,
                filename: c.filename.clone(),
                composer: c.composer.clone(),
                title: c.title.clone(),
                final_score: c.final_score,
                cosine_similarity: c.cosine_similarity,
                avoid_penalty: c.avoid_penalty,
                favorite_overlap: c.favorite_overlap,
                explanation: explain(c, self.profile.favorites(), self.profile.avoids()),
                normalized_vector: by_name
                    .get(c.filename.as_str())
                    .map(|song| string_keys(self.scorer.song_vector(song).to_map()))
                    .unwrap_or_default(),
            })
            .collect();

        RecommendationsFile {
            user_preferences: self.profile.to_record(),
            ideal_vector: string_keys(self.scorer.ideal().to_map()),
            recommendations,
        }
    }
}

fn string_keys(map: BTreeMap<u8, f64>) -> BTreeMap<String, f64> {
    map.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
