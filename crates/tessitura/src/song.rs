use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

/// Highest MIDI note number.
pub const MIDI_MAX: u8 = 127;

/// Inclusive MIDI pitch interval. Construction guarantees `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitchRange {
    min: u8,
    max: u8,
}

impl PitchRange {
    /// Returns `None` when `min > max`.
    pub fn new(min: u8, max: u8) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// Number of semitone positions, `max - min + 1`.
    pub fn len(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    /// Always false; a range holds at least one pitch.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains_pitch(&self, pitch: u8) -> bool {
        self.min <= pitch && pitch <= self.max
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &PitchRange) -> bool {
        other.min >= self.min && other.max <= self.max
    }

    /// True when the two ranges share at least one pitch.
    pub fn overlaps(&self, other: &PitchRange) -> bool {
        other.max >= self.min && other.min <= self.max
    }

    /// Position of `pitch` in a vector laid out over this range.
    pub fn index_of(&self, pitch: u8) -> Option<usize> {
        self.contains_pitch(pitch).then(|| (pitch - self.min) as usize)
    }

    pub fn pitches(&self) -> impl Iterator<Item = u8> {
        self.min..=self.max
    }
}

impl std::fmt::Display for PitchRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}–{}", self.min, self.max)
    }
}

/// Library record as stored on disk.
///
/// Deserialization is lenient: anything structurally wrong with the
/// tessituragram is reported by [`Song::from_record`] instead, so one bad
/// song never fails a whole library load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongRecord {
    #[serde(default)]
    pub composer: String,
    #[serde(default)]
    pub title: String,
    pub filename: String,
    /// MIDI number (as a string key) → cumulative duration in quarter notes
    #[serde(default)]
    pub tessituragram: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<StatisticsRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRecord {
    #[serde(default)]
    pub total_duration: Option<f64>,
    #[serde(default)]
    pub pitch_range: Option<PitchRangeRecord>,
    #[serde(default)]
    pub unique_pitches: Option<usize>,
}

/// Pitch extent as written by the ingestion step. Note names are carried
/// through untouched for display; only the MIDI numbers are interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchRangeRecord {
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub min_midi: Option<i64>,
    #[serde(default)]
    pub max: Option<String>,
    #[serde(default)]
    pub max_midi: Option<i64>,
}

/// A validated library entry. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub filename: String,
    pub composer: String,
    pub title: String,
    tessituragram: BTreeMap<u8, f64>,
    pitch_range: PitchRange,
    total_duration: f64,
    note_names: (Option<String>, Option<String>),
}

impl Song {
    /// Build a song directly from a pitch → duration map.
    pub fn new(
        filename: impl Into<String>,
        composer: impl Into<String>,
        title: impl Into<String>,
        tessituragram: BTreeMap<u8, f64>,
    ) -> Result<Self> {
        let filename = filename.into();
        let pitch_range = sounding_range(&filename, &tessituragram)?;
        let total_duration = tessituragram.values().sum();

        Ok(Self {
            filename,
            composer: composer.into(),
            title: title.into(),
            tessituragram,
            pitch_range,
            total_duration,
            note_names: (None, None),
        })
    }

    /// Validate a stored record.
    ///
    /// The pitch range is always derived from the tessituragram (keys with
    /// positive duration); a stored `statistics.pitch_range` is never trusted
    /// over the data it summarizes.
    pub fn from_record(record: SongRecord) -> Result<Self> {
        let SongRecord {
            composer,
            title,
            filename,
            tessituragram: raw,
            statistics,
        } = record;

        let mut tessituragram = BTreeMap::new();
        for (key, duration) in raw {
            let pitch: u8 = key.trim().parse().map_err(|_| Error::InvalidSong {
                filename: filename.clone(),
                reason: format!("unparseable pitch key {key:?}"),
            })?;
            *tessituragram.entry(pitch).or_insert(0.0) += duration;
        }

        let mut song = Self::new(filename, composer, title, tessituragram)?;

        if let Some(stats) = statistics {
            if let Some(total) = stats.total_duration.filter(|t| t.is_finite() && *t >= 0.0) {
                song.total_duration = total;
            }
            if let Some(range) = stats.pitch_range {
                song.note_names = (range.min, range.max);
            }
        }

        Ok(song)
    }

    /// Convert back to the on-disk shape with freshly computed statistics.
    pub fn to_record(&self) -> SongRecord {
        SongRecord {
            composer: self.composer.clone(),
            title: self.title.clone(),
            filename: self.filename.clone(),
            tessituragram: self
                .tessituragram
                .iter()
                .map(|(pitch, duration)| (pitch.to_string(), *duration))
                .collect(),
            statistics: Some(StatisticsRecord {
                total_duration: Some(self.total_duration),
                pitch_range: Some(PitchRangeRecord {
                    min: self.note_names.0.clone(),
                    min_midi: Some(self.pitch_range.min() as i64),
                    max: self.note_names.1.clone(),
                    max_midi: Some(self.pitch_range.max() as i64),
                }),
                unique_pitches: Some(self.unique_pitches()),
            }),
        }
    }

    pub fn tessituragram(&self) -> &BTreeMap<u8, f64> {
        &self.tessituragram
    }

    pub fn pitch_range(&self) -> PitchRange {
        self.pitch_range
    }

    /// Total singing time; the stored value when one was supplied.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Count of distinct tessituragram keys.
    pub fn unique_pitches(&self) -> usize {
        self.tessituragram.len()
    }

    /// Pitches with positive duration ordered by duration descending, ties
    /// broken by ascending pitch.
    pub fn pitches_by_duration(&self) -> Vec<(u8, f64)> {
        let mut pitches: Vec<(u8, f64)> = self
            .tessituragram
            .iter()
            .filter(|(_, d)| **d > 0.0)
            .map(|(p, d)| (*p, *d))
            .collect();
        pitches.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        pitches
    }
}

fn sounding_range(filename: &str, tessituragram: &BTreeMap<u8, f64>) -> Result<PitchRange> {
    if tessituragram.is_empty() {
        return Err(Error::InvalidSong {
            filename: filename.to_string(),
            reason: "empty tessituragram".into(),
        });
    }

    if let Some(pitch) = tessituragram.keys().find(|p| **p > MIDI_MAX) {
        return Err(Error::InvalidSong {
            filename: filename.to_string(),
            reason: format!("pitch {pitch} is not MIDI"),
        });
    }

    if let Some((pitch, duration)) = tessituragram
        .iter()
        .find(|(_, d)| !d.is_finite() || **d < 0.0)
    {
        return Err(Error::InvalidSong {
            filename: filename.to_string(),
            reason: format!("pitch {pitch} has invalid duration {duration}"),
        });
    }

    let mut sounding = tessituragram
        .iter()
        .filter(|(_, d)| **d > 0.0)
        .map(|(p, _)| *p);
    // BTreeMap iterates in ascending key order
    let min = sounding.next();
    let max = sounding.last().or(min);

    min.zip(max)
        .and_then(|(min, max)| PitchRange::new(min, max))
        .ok_or_else(|| Error::InvalidSong {
            filename: filename.to_string(),
            reason: "no pitch has positive duration".into(),
        })
}
