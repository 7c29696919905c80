use super::*;
use crate::song::TrackId;
use crate::store::{Snapshot, TrackRow};

fn row(i: u64, display: &str) -> TrackRow {
    TrackRow {
        id: TrackId(i),
        title: display.into(),
        artist: String::new(),
        album: None,
        has_picture: false,
        display: display.into(),
        duration: 0.0,
    }
}

fn snapshot(titles: &[&str]) -> Snapshot {
    Snapshot {
        tracks: titles
            .iter()
            .enumerate()
            .map(|(i, t)| row(i as u64, t))
            .collect(),
        order: (0..titles.len()).collect(),
        current: (!titles.is_empty()).then_some(0),
        ..Snapshot::default()
    }
}

#[test]
fn fuzzy_match_simple() {
    let title = "Hello World";
    assert_eq!(App::fuzzy_match_positions(title, "hw"), Some(vec![0, 6]));
    assert!(App::fuzzy_match_positions(title, "ello").is_some());
    assert!(App::fuzzy_match_positions(title, "xyz").is_none());
}

#[test]
fn display_indices_follow_play_order_and_filter() {
    let mut snap = snapshot(&["Alpha", "Beta", "Gamma", "Delta"]);
    snap.order = vec![2, 0, 3, 1];
    snap.shuffle = true;
    let mut app = App::new(snap);
    assert_eq!(app.display_indices(), vec![2, 0, 3, 1]);

    // 'et' matches Delta(3) and Beta(1)
    app.filter_query = "et".into();
    assert_eq!(app.display_indices(), vec![3, 1]);
}

#[test]
fn display_indices_uses_fuzzy_not_substring_only() {
    let mut app = App::new(snapshot(&[
        "Metallica - Blackened",
        "Black Sabbath - Paranoid",
    ]));
    app.filter_query = "mtbk".into();
    assert_eq!(app.display_indices(), vec![0]);
}

#[test]
fn whitespace_only_filter_shows_everything() {
    let mut app = App::new(snapshot(&["Black Sabbath - Paranoid"]));
    app.filter_query = "   ".into();
    assert_eq!(app.display_indices(), vec![0]);
}

#[test]
fn large_playlists_filter_through_lowercased_titles() {
    let titles: Vec<String> = (0..150).map(|i| format!("Track {i:03}")).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let mut app = App::new(snapshot(&refs));
    app.filter_query = "TRACK 149".into();
    assert_eq!(app.display_indices(), vec![149]);
}

#[test]
fn next_prev_wrap_inside_the_view() {
    let mut app = App::new(snapshot(&["Alpha", "Beta", "Gamma"]));
    app.filter_query = "et".into();

    assert_eq!(app.next_in_view_from(0), Some(1));
    assert_eq!(app.prev_in_view_from(0), Some(1));
    assert_eq!(app.next_in_view_from(1), Some(1));

    app.filter_query.clear();
    app.selected = 2;
    app.next();
    assert_eq!(app.selected, 0);
    app.prev();
    assert_eq!(app.selected, 2);
}

#[test]
fn refresh_follows_the_current_track() {
    let mut app = App::new(snapshot(&["A", "B", "C"]));
    let mut snap = snapshot(&["A", "B", "C"]);
    snap.current = Some(2);
    app.refresh(snap.clone());
    assert_eq!(app.selected, 2);

    app.follow_playback_off();
    app.selected = 0;
    snap.current = Some(1);
    app.refresh(snap);
    assert_eq!(app.selected, 0);
}

#[test]
fn refresh_clamps_selection_after_removal() {
    let mut app = App::new(snapshot(&["A", "B", "C"]));
    app.follow_playback_off();
    app.selected = 2;
    app.refresh(snapshot(&["A"]));
    assert_eq!(app.selected, 0);

    app.refresh(snapshot(&[]));
    assert_eq!(app.selected, 0);
    assert!(app.selected_row().is_none());
}

#[test]
fn filter_mode_stops_following_and_keeps_query_on_exit() {
    let mut app = App::new(snapshot(&["Alpha", "Beta"]));
    app.enter_filter_mode();
    assert_eq!(app.mode, InputMode::Filter);
    assert!(!app.follow_playback);

    app.push_filter_char('b');
    assert_eq!(app.selected, 1);
    app.exit_filter_mode();
    assert_eq!(app.mode, InputMode::Normal);
    assert_eq!(app.filter_query, "b");

    app.clear_filter();
    assert!(app.filter_query.is_empty());
}

#[test]
fn add_path_prompt_hands_out_trimmed_input() {
    let mut app = App::new(snapshot(&[]));
    app.begin_add_path();
    for c in " /music/new ".chars() {
        app.push_path_char(c);
    }
    app.pop_path_char();
    assert_eq!(app.take_path_input(), Some(std::path::PathBuf::from("/music/new")));
    assert_eq!(app.mode, InputMode::Normal);
    assert!(app.path_input.is_empty());

    app.begin_add_path();
    assert_eq!(app.take_path_input(), None);
}

#[test]
fn cancel_drops_the_typed_path() {
    let mut app = App::new(snapshot(&[]));
    app.begin_add_path();
    app.push_path_char('x');
    app.cancel_input();
    assert_eq!(app.mode, InputMode::Normal);
    assert!(app.path_input.is_empty());
}
