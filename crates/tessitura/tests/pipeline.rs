//! End-to-end ranking behavior over small in-memory libraries.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use tessitura::{
    filter_by_range, rank_candidates, recommend, IdealWeights, LibraryLoad, PitchRange, Song,
    SongRecord, UserProfile,
};

fn song(filename: &str, tess: &[(u8, f64)]) -> Song {
    let map: BTreeMap<u8, f64> = tess.iter().copied().collect();
    Song::new(filename, "Composer", filename, map).unwrap()
}

fn profile(min: u8, max: u8, favorites: &[u8], avoids: &[u8]) -> UserProfile {
    UserProfile::new(
        PitchRange::new(min, max).unwrap(),
        favorites.iter().copied(),
        avoids.iter().copied(),
        0.5,
    )
    .unwrap()
}

#[test]
fn single_song_ranks_first_against_itself() {
    let library = vec![song("only.mxl", &[(60, 1.0), (62, 5.0), (64, 4.0)])];
    // Three sounding pitches: all are favorites, nothing left to avoid
    let p = profile(60, 64, &[60, 62, 64], &[]);

    let result = recommend(&library, &p, &IdealWeights::default());
    assert_eq!(result.ranking.rank_of("only.mxl"), Some(1));
    assert_eq!(result.ranking.len(), 1);
}

#[test]
fn identical_scores_rank_by_filename() {
    let tess = [(60, 2.0), (62, 2.0)];
    let library = vec![song("b-song.mxl", &tess), song("a-song.mxl", &tess)];
    let p = profile(60, 64, &[62], &[]);

    let result = recommend(&library, &p, &IdealWeights::default());
    assert_eq!(result.ranking.filenames(), vec!["a-song.mxl", "b-song.mxl"]);
}

#[test]
fn repeated_runs_are_identical() {
    let library = vec![
        song("a.mxl", &[(60, 1.0), (65, 3.0)]),
        song("b.mxl", &[(62, 2.0), (64, 2.0), (67, 1.0)]),
        song("c.mxl", &[(61, 4.0), (66, 1.0)]),
    ];
    let p = profile(60, 67, &[62, 64], &[61]);
    let weights = IdealWeights::default();

    let first = recommend(&library, &p, &weights).to_file(&library);
    let second = recommend(&library, &p, &weights).to_file(&library);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn candidate_order_does_not_change_ranking() {
    let library = vec![
        song("a.mxl", &[(60, 1.0), (65, 3.0)]),
        song("b.mxl", &[(62, 2.0), (64, 2.0)]),
        song("c.mxl", &[(61, 4.0), (66, 1.0)]),
        song("d.mxl", &[(62, 2.0), (64, 2.0)]),
    ];
    let p = profile(60, 67, &[62, 64], &[61]);
    let weights = IdealWeights::default();

    let forward = filter_by_range(&library, p.range());
    let mut backward = forward.clone();
    backward.reverse();

    assert_eq!(
        rank_candidates(&forward, &p, &weights),
        rank_candidates(&backward, &p, &weights)
    );
}

#[test]
fn favorite_pitch_song_beats_avoid_pitch_song() {
    let library = vec![song("avoid.mxl", &[(61, 6.0)]), song("fav.mxl", &[(64, 6.0)])];
    let p = profile(60, 72, &[62, 64, 67, 69], &[61, 71]);

    let result = recommend(&library, &p, &IdealWeights::default());
    let scores: BTreeMap<&str, f64> = result
        .ranking
        .candidates()
        .iter()
        .map(|c| (c.filename.as_str(), c.cosine_similarity))
        .collect();
    assert!(scores["fav.mxl"] > scores["avoid.mxl"]);
    assert_eq!(result.ranking.filenames(), vec!["fav.mxl", "avoid.mxl"]);
}

#[test]
fn invalid_songs_never_become_candidates() {
    let records: Vec<SongRecord> = serde_json::from_str(
        r#"[
            {"composer": "A", "title": "Good", "filename": "good.mxl",
             "tessituragram": {"60": 1.0, "62": 2.0}},
            {"composer": "B", "title": "Empty", "filename": "empty.mxl",
             "tessituragram": {}},
            {"composer": "C", "title": "Silent", "filename": "silent.mxl",
             "tessituragram": {"61": 0.0}}
        ]"#,
    )
    .unwrap();
    let load = LibraryLoad::from_records(records);
    assert_eq!(load.rejected.len(), 2);

    let p = profile(0, 127, &[], &[]);
    let result = recommend(&load.songs, &p, &IdealWeights::default());
    assert_eq!(result.ranking.filenames(), vec!["good.mxl"]);
}

#[test]
fn out_of_range_song_is_excluded_even_if_it_would_score_well() {
    let library = vec![
        song("perfect-but-low.mxl", &[(59, 0.1), (62, 10.0)]),
        song("inside.mxl", &[(60, 5.0), (63, 1.0)]),
    ];
    let p = profile(60, 64, &[62], &[60]);

    let result = recommend(&library, &p, &IdealWeights::default());
    assert_eq!(result.ranking.filenames(), vec!["inside.mxl"]);
}
