//! Human-readable commentary for ranked songs.

use std::collections::BTreeSet;

use crate::scoring::ScoredCandidate;

fn pitch_list(pitches: &BTreeSet<u8>) -> String {
    pitches
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Explain a candidate's score in terms of the singer's favorites and avoids.
///
/// Favorite commentary is omitted when there are no favorites, and likewise
/// for avoids.
pub fn explain(
    candidate: &ScoredCandidate,
    favorites: &BTreeSet<u8>,
    avoids: &BTreeSet<u8>,
) -> String {
    let mut parts = vec![format!(
        "Final score: {:.2} (cosine similarity {:.2})",
        candidate.final_score, candidate.cosine_similarity
    )];

    if !favorites.is_empty() {
        let names = pitch_list(favorites);
        let pct = candidate.favorite_overlap * 100.0;
        parts.push(if pct >= 30.0 {
            format!("Strong overlap with your favorite notes (MIDI {names}): {pct:.0}% of singing time.")
        } else if pct >= 10.0 {
            format!("Moderate overlap with favorite notes (MIDI {names}): {pct:.0}% of singing time.")
        } else {
            format!("Low overlap with favorite notes (MIDI {names}): only {pct:.0}% of singing time.")
        });
    }

    if !avoids.is_empty() {
        let names = pitch_list(avoids);
        let pct = candidate.avoid_penalty * 100.0;
        parts.push(if pct <= 2.0 {
            format!("Minimal presence of avoid notes (MIDI {names}): {pct:.1}% of singing time.")
        } else if pct <= 10.0 {
            format!("Some presence of avoid notes (MIDI {names}): {pct:.1}% of singing time.")
        } else {
            format!(
                "Notable presence of avoid notes (MIDI {names}): {pct:.1}% of singing time; this lowered the score."
            )
        });
    }

    parts.join("  ")
}
