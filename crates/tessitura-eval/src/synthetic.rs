//! Profiles derived from a song's own tessituragram.

use tessitura::{filter_by_range, ProfileError, Song, UserProfile};
use tracing::debug;

use crate::params::HarnessParams;

/// Profile whose range is the song's own sounding range, whose favorites are
/// its `favorite_count` longest pitches and whose avoids are its
/// `avoid_count` shortest pitches.
///
/// Only pitches with positive duration are considered; ties in duration go to
/// the lower pitch. Avoids that are also favorites are dropped from avoids.
/// When the song has fewer than `avoid_count` sounding pitches no avoids are
/// chosen.
pub fn self_profile(song: &Song, params: &HarnessParams) -> Result<UserProfile, ProfileError> {
    let ordered = song.pitches_by_duration();
    let n = ordered.len();

    let favorites: Vec<u8> = ordered
        .iter()
        .take(params.favorite_count.min(n))
        .map(|(p, _)| *p)
        .collect();

    let avoids: Vec<u8> = if n >= params.avoid_count {
        ordered[n - params.avoid_count..]
            .iter()
            .map(|(p, _)| *p)
            .filter(|p| !favorites.contains(p))
            .collect()
    } else {
        Vec::new()
    };

    UserProfile::new(song.pitch_range(), favorites, avoids, params.alpha)
}

/// A self-derived profile together with its fixed candidate set.
#[derive(Debug, Clone)]
pub struct SourcedProfile<'a> {
    pub source: &'a Song,
    pub profile: UserProfile,
    pub candidates: Vec<&'a Song>,
}

/// Why a song produced no usable profile.
#[derive(Debug, Clone, PartialEq)]
pub enum Skip {
    Profile(ProfileError),
    TooFewCandidates(usize),
    /// The song is not among the candidates of its own profile, which only
    /// happens when it is not part of the library searched.
    SourceNotCandidate,
}

/// Derive the profile for `song` and check its candidate count.
pub fn sourced_profile<'a>(
    library: &'a [Song],
    song: &'a Song,
    params: &HarnessParams,
    min_candidates: usize,
) -> Result<SourcedProfile<'a>, Skip> {
    let profile = self_profile(song, params).map_err(Skip::Profile)?;
    let candidates = filter_by_range(library, profile.range());
    if !candidates.iter().any(|c| c.filename == song.filename) {
        return Err(Skip::SourceNotCandidate);
    }
    if candidates.len() < min_candidates {
        return Err(Skip::TooFewCandidates(candidates.len()));
    }
    Ok(SourcedProfile {
        source: song,
        profile,
        candidates,
    })
}

/// Songs skipped while searching for qualifying profiles, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    /// No valid profile, or the song is missing from its own candidates.
    pub profile: usize,
    pub too_few_candidates: usize,
}

impl SkipCounts {
    pub fn record(&mut self, skip: &Skip) {
        match skip {
            Skip::Profile(_) | Skip::SourceNotCandidate => self.profile += 1,
            Skip::TooFewCandidates(_) => self.too_few_candidates += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.profile + self.too_few_candidates
    }
}

/// Qualifying profiles plus the songs passed over before the limit was hit.
#[derive(Debug, Clone)]
pub struct Qualifying<'a> {
    pub profiles: Vec<SourcedProfile<'a>>,
    pub skipped: SkipCounts,
}

/// The first `limit` songs, in library order, whose profile reaches
/// `min_candidates`. Songs after the limit is reached are not examined and
/// are not counted as skipped.
pub fn first_qualifying<'a>(
    library: &'a [Song],
    params: &HarnessParams,
    min_candidates: usize,
    limit: usize,
) -> Qualifying<'a> {
    let mut found = Qualifying {
        profiles: Vec::with_capacity(limit),
        skipped: SkipCounts::default(),
    };
    for song in library {
        if found.profiles.len() >= limit {
            break;
        }
        match sourced_profile(library, song, params, min_candidates) {
            Ok(sourced) => found.profiles.push(sourced),
            Err(skip) => {
                debug!(filename = %song.filename, ?skip, "not a qualifying profile");
                found.skipped.record(&skip);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn song(name: &str, tess: &[(u8, f64)]) -> Song {
        let map: BTreeMap<u8, f64> = tess.iter().copied().collect();
        Song::new(name, "c", "t", map).unwrap()
    }

    fn list(set: &std::collections::BTreeSet<u8>) -> Vec<u8> {
        set.iter().copied().collect()
    }

    #[test]
    fn top_four_and_bottom_two() {
        let s = song(
            "s.mxl",
            &[(60, 1.0), (62, 6.0), (64, 5.0), (65, 2.0), (67, 4.0), (69, 3.0), (71, 0.5)],
        );
        let p = self_profile(&s, &HarnessParams::default()).unwrap();
        assert_eq!(list(p.favorites()), vec![62, 64, 67, 69]);
        assert_eq!(list(p.avoids()), vec![60, 71]);
        assert_eq!(p.range(), s.pitch_range());
    }

    #[test]
    fn three_pitches_means_no_avoids() {
        let s = song("s.mxl", &[(60, 1.0), (62, 5.0), (64, 4.0)]);
        let p = self_profile(&s, &HarnessParams::default()).unwrap();
        assert_eq!(list(p.favorites()), vec![60, 62, 64]);
        assert!(p.avoids().is_empty());
    }

    #[test]
    fn overlap_is_removed_from_avoids() {
        let s = song("s.mxl", &[(60, 1.0), (62, 5.0), (64, 4.0), (65, 3.0), (67, 2.0)]);
        let p = self_profile(&s, &HarnessParams::default()).unwrap();
        // bottom two are 67 (favorite) and 60
        assert_eq!(list(p.favorites()), vec![62, 64, 65, 67]);
        assert_eq!(list(p.avoids()), vec![60]);
    }

    #[test]
    fn duration_ties_prefer_lower_pitch() {
        let s = song("s.mxl", &[(60, 2.0), (61, 2.0), (62, 2.0), (63, 2.0), (64, 2.0), (65, 2.0)]);
        let p = self_profile(&s, &HarnessParams::default()).unwrap();
        assert_eq!(list(p.favorites()), vec![60, 61, 62, 63]);
        assert_eq!(list(p.avoids()), vec![64, 65]);
    }

    #[test]
    fn zero_duration_pitches_are_ignored() {
        let s = song("s.mxl", &[(58, 0.0), (60, 3.0), (62, 1.0)]);
        let p = self_profile(&s, &HarnessParams::default()).unwrap();
        assert_eq!(list(p.favorites()), vec![60, 62]);
        assert!(p.avoids().is_empty());
    }

    #[test]
    fn source_is_always_its_own_candidate() {
        let library = vec![
            song("a.mxl", &[(60, 1.0), (64, 2.0)]),
            song("b.mxl", &[(55, 1.0), (70, 2.0)]),
            song("c.mxl", &[(62, 1.0)]),
        ];
        for s in &library {
            let sourced = sourced_profile(&library, s, &HarnessParams::default(), 1).unwrap();
            assert!(sourced.candidates.iter().any(|c| c.filename == s.filename));
        }
    }

    #[test]
    fn first_qualifying_respects_limit_and_minimum() {
        let library = vec![
            song("narrow.mxl", &[(60, 1.0)]),
            song("wide.mxl", &[(50, 1.0), (80, 1.0)]),
            song("wider.mxl", &[(40, 1.0), (90, 1.0)]),
        ];
        let found = first_qualifying(&library, &HarnessParams::default(), 2, 1);
        let names: Vec<&str> = found
            .profiles
            .iter()
            .map(|s| s.source.filename.as_str())
            .collect();
        assert_eq!(names, vec!["wide.mxl"]);
        // narrow.mxl was examined and skipped; wider.mxl was never reached
        assert_eq!(
            found.skipped,
            SkipCounts {
                profile: 0,
                too_few_candidates: 1
            }
        );
    }

    #[test]
    fn song_outside_the_searched_library_is_skipped() {
        let library = vec![song("a.mxl", &[(60, 1.0), (64, 2.0)])];
        let stranger = song("stranger.mxl", &[(61, 1.0), (63, 2.0)]);
        let skip = sourced_profile(&library, &stranger, &HarnessParams::default(), 1).unwrap_err();
        assert_eq!(skip, Skip::SourceNotCandidate);

        let mut counts = SkipCounts::default();
        counts.record(&skip);
        assert_eq!(counts.profile, 1);
        assert_eq!(counts.total(), 1);
    }
}
