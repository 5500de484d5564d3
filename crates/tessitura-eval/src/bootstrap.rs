//! Percentile bootstrap confidence intervals.
//!
//! Randomness is explicit: a [`SeedStream`] is created once per evaluation
//! run and handed to every interval computation in a fixed order. Each
//! resample seeds its own generator from the stream seed and its index, so
//! resampling in parallel gives the same numbers as resampling in sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::stats::{mean, percentile};

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// SplitMix64 finalizer over `state + gamma`.
fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Deterministic sequence of seeds, one per bootstrap call.
#[derive(Debug, Clone)]
pub struct SeedStream {
    state: u64,
}

impl SeedStream {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_seed(&mut self) -> u64 {
        let seed = splitmix64(self.state);
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        seed
    }
}

/// Lower and upper percentile bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapEstimator {
    resamples: usize,
    lower_pct: f64,
    upper_pct: f64,
}

impl Default for BootstrapEstimator {
    fn default() -> Self {
        Self::new(10_000, 0.95)
    }
}

impl BootstrapEstimator {
    /// `confidence` in (0, 1); 0.95 gives the 2.5th and 97.5th percentiles.
    pub fn new(resamples: usize, confidence: f64) -> Self {
        let tail = (1.0 - confidence.clamp(0.0, 1.0)) / 2.0 * 100.0;
        Self {
            resamples: resamples.max(1),
            lower_pct: tail,
            upper_pct: 100.0 - tail,
        }
    }

    pub fn resamples(&self) -> usize {
        self.resamples
    }

    pub fn percentiles(&self) -> (f64, f64) {
        (self.lower_pct, self.upper_pct)
    }

    /// Resample `observations` with replacement, reduce each resample with
    /// `statistic`, and return the percentile interval of the results.
    ///
    /// Always draws one seed from `stream`, even for empty input, so the
    /// intervals that follow do not depend on which inputs were empty.
    /// Returns `None` when there is nothing to resample.
    pub fn interval<F>(
        &self,
        observations: &[f64],
        stream: &mut SeedStream,
        statistic: F,
    ) -> Option<ConfidenceInterval>
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        let stream_seed = stream.next_seed();
        let n = observations.len();
        if n == 0 {
            return None;
        }

        let mut estimates: Vec<f64> = (0..self.resamples)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(splitmix64(
                    stream_seed ^ (i as u64).wrapping_mul(GOLDEN_GAMMA),
                ));
                let sample: Vec<f64> = (0..n)
                    .map(|_| observations[rng.random_range(0..n)])
                    .collect();
                statistic(&sample)
            })
            .collect();
        estimates.sort_by(f64::total_cmp);

        Some(ConfidenceInterval {
            lower: percentile(&estimates, self.lower_pct)?,
            upper: percentile(&estimates, self.upper_pct)?,
        })
    }

    pub fn mean_interval(
        &self,
        observations: &[f64],
        stream: &mut SeedStream,
    ) -> Option<ConfidenceInterval> {
        self.interval(observations, stream, mean)
    }
}
