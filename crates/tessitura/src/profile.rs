use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::song::{PitchRange, MIDI_MAX};

/// Default avoid-penalty weight.
pub const DEFAULT_ALPHA: f64 = 0.5;

/// Which preference list a pitch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceKind {
    Favorite,
    Avoid,
}

impl std::fmt::Display for PreferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferenceKind::Favorite => write!(f, "favorite"),
            PreferenceKind::Avoid => write!(f, "avoid"),
        }
    }
}

/// Reasons a profile cannot be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("range low {low} is above range high {high}")]
    InvertedRange { low: i64, high: i64 },

    #[error("{pitch} is not a MIDI pitch (0-127)")]
    NotMidi { pitch: i64 },

    #[error("{kind} pitch {pitch} lies outside the range {range}")]
    OutOfRange {
        pitch: u8,
        kind: PreferenceKind,
        range: PitchRange,
    },

    #[error("pitch {pitch} is both a favorite and an avoid")]
    Overlap { pitch: u8 },

    #[error("alpha must be a finite non-negative number, got {0}")]
    InvalidAlpha(f64),
}

/// A singer's stated preferences for one scoring pass.
///
/// Construction enforces the preconditions the scorer relies on: every
/// favorite and avoid lies inside `range`, the two sets are disjoint, and
/// `alpha` is finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    range: PitchRange,
    favorites: BTreeSet<u8>,
    avoids: BTreeSet<u8>,
    alpha: f64,
}

impl UserProfile {
    pub fn new(
        range: PitchRange,
        favorites: impl IntoIterator<Item = u8>,
        avoids: impl IntoIterator<Item = u8>,
        alpha: f64,
    ) -> Result<Self, ProfileError> {
        let favorites: BTreeSet<u8> = favorites.into_iter().collect();
        let avoids: BTreeSet<u8> = avoids.into_iter().collect();

        if !alpha.is_finite() || alpha < 0.0 {
            return Err(ProfileError::InvalidAlpha(alpha));
        }

        for (set, kind) in [
            (&favorites, PreferenceKind::Favorite),
            (&avoids, PreferenceKind::Avoid),
        ] {
            if let Some(&pitch) = set.iter().find(|p| !range.contains_pitch(**p)) {
                return Err(ProfileError::OutOfRange { pitch, kind, range });
            }
        }

        if let Some(&pitch) = favorites.intersection(&avoids).next() {
            return Err(ProfileError::Overlap { pitch });
        }

        Ok(Self {
            range,
            favorites,
            avoids,
            alpha,
        })
    }

    pub fn range(&self) -> PitchRange {
        self.range
    }

    pub fn favorites(&self) -> &BTreeSet<u8> {
        &self.favorites
    }

    pub fn avoids(&self) -> &BTreeSet<u8> {
        &self.avoids
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Copy of this profile with `pitch` added to (or removed from) one list.
    ///
    /// Goes through [`UserProfile::new`], so adding a pitch that is out of
    /// range or already in the opposite list is rejected.
    pub fn with_change(
        &self,
        kind: PreferenceKind,
        pitch: u8,
        add: bool,
    ) -> Result<Self, ProfileError> {
        let mut favorites = self.favorites.clone();
        let mut avoids = self.avoids.clone();
        let target = match kind {
            PreferenceKind::Favorite => &mut favorites,
            PreferenceKind::Avoid => &mut avoids,
        };
        if add {
            target.insert(pitch);
        } else {
            target.remove(&pitch);
        }
        Self::new(self.range, favorites, avoids, self.alpha)
    }

    pub fn to_record(&self) -> ProfileRecord {
        ProfileRecord {
            range: RangeRecord {
                low_midi: self.range.min() as i64,
                high_midi: self.range.max() as i64,
            },
            favorite_notes: self.favorites.iter().map(|p| *p as i64).collect(),
            avoid_notes: self.avoids.iter().map(|p| *p as i64).collect(),
            alpha: self.alpha,
        }
    }
}

/// Profile as exchanged with callers (CLI input, saved recommendations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub range: RangeRecord,
    #[serde(default)]
    pub favorite_notes: Vec<i64>,
    #[serde(default)]
    pub avoid_notes: Vec<i64>,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeRecord {
    pub low_midi: i64,
    pub high_midi: i64,
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn to_midi(value: i64) -> Result<u8, ProfileError> {
    u8::try_from(value)
        .ok()
        .filter(|p| *p <= MIDI_MAX)
        .ok_or(ProfileError::NotMidi { pitch: value })
}

impl TryFrom<ProfileRecord> for UserProfile {
    type Error = ProfileError;

    fn try_from(record: ProfileRecord) -> Result<Self, Self::Error> {
        let low = to_midi(record.range.low_midi)?;
        let high = to_midi(record.range.high_midi)?;
        let range = PitchRange::new(low, high).ok_or(ProfileError::InvertedRange {
            low: record.range.low_midi,
            high: record.range.high_midi,
        })?;

        let favorites = record
            .favorite_notes
            .into_iter()
            .map(to_midi)
            .collect::<Result<Vec<_>, _>>()?;
        let avoids = record
            .avoid_notes
            .into_iter()
            .map(to_midi)
            .collect::<Result<Vec<_>, _>>()?;

        UserProfile::new(range, favorites, avoids, record.alpha)
    }
}
