//! Dense pitch vectors over a contiguous MIDI interval.

use std::collections::BTreeMap;

use crate::song::PitchRange;

/// How a vector is scaled after it is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Entries sum to 1 (song vectors).
    L1,
    /// Unit Euclidean norm (ideal vectors).
    L2,
    None,
}

/// Values indexed by `pitch - space.min()`.
///
/// A zero vector stays zero under either normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchVector {
    space: PitchRange,
    values: Vec<f64>,
}

impl PitchVector {
    pub fn zeros(space: PitchRange) -> Self {
        Self {
            space,
            values: vec![0.0; space.len()],
        }
    }

    /// Fill from a pitch → duration map. Pitches outside `space` are dropped.
    pub fn from_durations(
        durations: &BTreeMap<u8, f64>,
        space: PitchRange,
        normalization: Normalization,
    ) -> Self {
        let mut vector = Self::zeros(space);
        for (pitch, duration) in durations.range(space.min()..=space.max()) {
            vector.values[(pitch - space.min()) as usize] = *duration;
        }
        vector.normalize(normalization);
        vector
    }

    pub(crate) fn from_values(space: PitchRange, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), space.len());
        Self { space, values }
    }

    pub fn space(&self) -> PitchRange {
        self.space
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `pitch`, zero outside the space.
    pub fn get(&self, pitch: u8) -> f64 {
        self.space
            .index_of(pitch)
            .map(|i| self.values[i])
            .unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Sum of entries at the given pitches. Pitches outside the space add nothing.
    pub fn mass_at<'a>(&self, pitches: impl IntoIterator<Item = &'a u8>) -> f64 {
        pitches.into_iter().map(|p| self.get(*p)).sum()
    }

    pub fn normalize(&mut self, normalization: Normalization) {
        let divisor = match normalization {
            Normalization::L1 => self.sum(),
            Normalization::L2 => self.norm(),
            Normalization::None => return,
        };
        if divisor > 0.0 {
            for v in &mut self.values {
                *v /= divisor;
            }
        }
    }

    /// Dot product over the shared space; mismatched spaces compare as zero.
    pub fn dot(&self, other: &PitchVector) -> f64 {
        if self.space != other.space {
            return 0.0;
        }
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Pitch → value pairs, for persistence and display.
    pub fn to_map(&self) -> BTreeMap<u8, f64> {
        self.space.pitches().zip(self.values.iter().copied()).collect()
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &PitchVector, b: &PitchVector) -> f64 {
    let norms = a.norm() * b.norm();
    if norms == 0.0 {
        return 0.0;
    }
    a.dot(b) / norms
}
