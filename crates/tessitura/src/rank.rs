use std::cmp::Ordering;
use std::collections::HashMap;

use crate::scoring::ScoredCandidate;

/// Descending `final_score`, then ascending filename.
pub fn ranking_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| a.filename.cmp(&b.filename))
}

/// Candidates in final order. Position 0 is rank 1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ranking {
    candidates: Vec<ScoredCandidate>,
}

impl Ranking {
    /// Sort candidates into a total order. The input order never matters.
    pub fn new(mut candidates: Vec<ScoredCandidate>) -> Self {
        candidates.sort_by(ranking_order);
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    /// `(rank, candidate)` pairs with 1-based ranks.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ScoredCandidate)> {
        self.candidates.iter().enumerate().map(|(i, c)| (i + 1, c))
    }

    /// 1-based rank of `filename`, if it is a candidate.
    pub fn rank_of(&self, filename: &str) -> Option<usize> {
        self.candidates
            .iter()
            .position(|c| c.filename == filename)
            .map(|i| i + 1)
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.filename.as_str()).collect()
    }

    /// Filename → 1-based rank.
    pub fn positions(&self) -> HashMap<&str, usize> {
        self.iter().map(|(rank, c)| (c.filename.as_str(), rank)).collect()
    }

    pub fn top(&self, n: usize) -> &[ScoredCandidate] {
        &self.candidates[..n.min(self.candidates.len())]
    }

    pub fn into_candidates(self) -> Vec<ScoredCandidate> {
        self.candidates
    }
}
