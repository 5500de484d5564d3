use crate::song::{PitchRange, Song};

/// Songs whose whole sounding range lies inside `range`, in library order.
///
/// A hard filter: a song one semitone outside is never a candidate.
pub fn filter_by_range(songs: &[Song], range: PitchRange) -> Vec<&Song> {
    songs
        .iter()
        .filter(|song| range.contains(&song.pitch_range()))
        .collect()
}
