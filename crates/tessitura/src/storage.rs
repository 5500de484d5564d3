//! JSON persistence for the song library and recommendation output.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::profile::{ProfileRecord, UserProfile};
use crate::recommend::RecommendationsFile;
use crate::song::{Song, SongRecord};
use crate::{Error, Result};

/// On-disk library shape: `{"songs": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryFile {
    #[serde(default)]
    pub songs: Vec<SongRecord>,
}

/// A library record that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedSong {
    pub filename: String,
    pub reason: String,
}

/// Validated library plus the records that were left out.
#[derive(Debug, Clone, Default)]
pub struct LibraryLoad {
    pub songs: Vec<Song>,
    pub rejected: Vec<RejectedSong>,
}

impl LibraryLoad {
    /// Validate records in order. Invalid ones are kept aside, never fatal.
    ///
    /// A filename seen earlier in the same library is rejected as a duplicate;
    /// rankings identify songs by filename.
    pub fn from_records(records: Vec<SongRecord>) -> Self {
        let mut load = Self::default();
        let mut seen = HashSet::new();
        for record in records {
            if !seen.insert(record.filename.clone()) {
                warn!(filename = %record.filename, "skipping duplicate song");
                load.rejected.push(RejectedSong {
                    filename: record.filename,
                    reason: "duplicate filename".into(),
                });
                continue;
            }
            match Song::from_record(record) {
                Ok(song) => load.songs.push(song),
                Err(Error::InvalidSong { filename, reason }) => {
                    warn!(%filename, %reason, "skipping invalid song");
                    load.rejected.push(RejectedSong { filename, reason });
                }
                Err(other) => {
                    load.rejected.push(RejectedSong {
                        filename: String::new(),
                        reason: other.to_string(),
                    });
                }
            }
        }
        load
    }

    pub fn total(&self) -> usize {
        self.songs.len() + self.rejected.len()
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-print `value` to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let text = serde_json::to_string_pretty(value).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "wrote json");
    Ok(())
}

/// Raw library records, unvalidated.
pub fn load_library_records(path: &Path) -> Result<Vec<SongRecord>> {
    Ok(read_json::<LibraryFile>(path)?.songs)
}

/// Load and validate a library file.
pub fn load_library(path: &Path) -> Result<LibraryLoad> {
    let load = LibraryLoad::from_records(load_library_records(path)?);
    debug!(
        path = %path.display(),
        songs = load.songs.len(),
        rejected = load.rejected.len(),
        "loaded library"
    );
    Ok(load)
}

pub fn save_library(path: &Path, songs: &[SongRecord]) -> Result<()> {
    write_json(
        path,
        &LibraryFile {
            songs: songs.to_vec(),
        },
    )
}

/// Append `new` records to `existing`, skipping filenames already present.
///
/// Returns the merged list and how many records were added.
pub fn merge_songs(existing: Vec<SongRecord>, new: Vec<SongRecord>) -> (Vec<SongRecord>, usize) {
    let mut seen: HashSet<String> = existing.iter().map(|s| s.filename.clone()).collect();
    let mut merged = existing;
    let before = merged.len();
    for song in new {
        if seen.insert(song.filename.clone()) {
            merged.push(song);
        }
    }
    let added = merged.len() - before;
    (merged, added)
}

/// Library search criteria. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongQuery {
    /// Case-insensitive substring of the composer.
    pub composer: Option<String>,
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Highest sounding pitch must be at or above this.
    pub min_midi: Option<u8>,
    /// Lowest sounding pitch must be at or below this.
    pub max_midi: Option<u8>,
}

impl SongQuery {
    pub fn matches(&self, song: &Song) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_ref()
                .map_or(true, |n| haystack.to_lowercase().contains(&n.to_lowercase()))
        }

        let range = song.pitch_range();
        contains(&song.composer, &self.composer)
            && contains(&song.title, &self.title)
            && self.min_midi.map_or(true, |min| range.max() >= min)
            && self.max_midi.map_or(true, |max| range.min() <= max)
    }
}

pub fn query_songs<'a>(songs: &'a [Song], query: &SongQuery) -> Vec<&'a Song> {
    songs.iter().filter(|song| query.matches(song)).collect()
}

/// Read a profile record and validate it.
pub fn load_profile(path: &Path) -> Result<UserProfile> {
    let record: ProfileRecord = read_json(path)?;
    Ok(UserProfile::try_from(record)?)
}

pub fn save_recommendations(path: &Path, file: &RecommendationsFile) -> Result<()> {
    write_json(path, file)
}

pub fn load_recommendations(path: &Path) -> Result<RecommendationsFile> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn record(filename: &str, composer: &str, tess: &[(&str, f64)]) -> SongRecord {
        SongRecord {
            composer: composer.into(),
            title: format!("{filename} title"),
            filename: filename.into(),
            tessituragram: tess.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            statistics: None,
        }
    }

    #[test]
    fn from_records_counts_rejections() {
        let load = LibraryLoad::from_records(vec![
            record("good.mxl", "A", &[("60", 1.0)]),
            record("empty.mxl", "B", &[]),
            record("bad-key.mxl", "C", &[("x", 1.0)]),
            record("good.mxl", "D", &[("62", 1.0)]),
        ]);
        assert_eq!(load.songs.len(), 1);
        assert_eq!(load.songs[0].composer, "A");
        assert_eq!(load.total(), 4);
        let names: Vec<&str> = load.rejected.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["empty.mxl", "bad-key.mxl", "good.mxl"]);
    }

    #[test]
    fn merge_keeps_existing_entry() {
        let existing = vec![record("a.mxl", "Old", &[("60", 1.0)])];
        let new = vec![
            record("a.mxl", "New", &[("62", 1.0)]),
            record("b.mxl", "New", &[("62", 1.0)]),
            record("b.mxl", "Dup", &[("62", 1.0)]),
        ];
        let (merged, added) = merge_songs(existing, new);
        assert_eq!(added, 1);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].composer, "Old");
        assert_eq!(merged[1].composer, "New");
    }

    #[test]
    fn query_matches_text_and_range_overlap() {
        let songs: Vec<Song> = LibraryLoad::from_records(vec![
            record("a.mxl", "Franz Schubert", &[("60", 1.0), ("67", 1.0)]),
            record("b.mxl", "Robert Schumann", &[("70", 1.0), ("76", 1.0)]),
            record("c.mxl", "Schubert", &[("50", 1.0), ("55", 1.0)]),
        ])
        .songs;

        let by_composer = SongQuery {
            composer: Some("SCHUBERT".into()),
            ..SongQuery::default()
        };
        let names: Vec<&str> = query_songs(&songs, &by_composer)
            .iter()
            .map(|s| s.filename.as_str())
            .collect();
        assert_eq!(names, vec!["a.mxl", "c.mxl"]);

        let by_range = SongQuery {
            min_midi: Some(65),
            max_midi: Some(72),
            ..SongQuery::default()
        };
        let names: Vec<&str> = query_songs(&songs, &by_range)
            .iter()
            .map(|s| s.filename.as_str())
            .collect();
        assert_eq!(names, vec!["a.mxl", "b.mxl"]);
    }

    #[test]
    fn library_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("library.json");
        let records = vec![
            record("a.mxl", "A", &[("60", 1.5), ("64", 2.0)]),
            record("broken.mxl", "B", &[]),
        ];
        save_library(&path, &records).unwrap();

        let load = load_library(&path).unwrap();
        assert_eq!(load.songs.len(), 1);
        assert_eq!(load.rejected.len(), 1);
        assert_eq!(
            load.songs[0].tessituragram(),
            &BTreeMap::from([(60, 1.5), (64, 2.0)])
        );
    }

    #[test]
    fn profile_file_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        fs::write(
            &good,
            r#"{"range": {"low_midi": 60, "high_midi": 72}, "favorite_notes": [64], "avoid_notes": [61], "alpha": 0.25}"#,
        )
        .unwrap();
        let profile = load_profile(&good).unwrap();
        assert_eq!(profile.alpha(), 0.25);

        let bad = dir.path().join("bad.json");
        fs::write(
            &bad,
            r#"{"range": {"low_midi": 60, "high_midi": 72}, "favorite_notes": [80]}"#,
        )
        .unwrap();
        assert!(matches!(
            load_profile(&bad).unwrap_err(),
            Error::MalformedProfile(crate::ProfileError::OutOfRange { pitch: 80, .. })
        ));
    }

    #[test]
    fn missing_library_is_an_io_error() {
        let err = load_library(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn malformed_library_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"songs\": 5}").unwrap();
        assert!(matches!(load_library(&path).unwrap_err(), Error::Json { .. }));
    }
}
