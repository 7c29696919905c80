use std::path::PathBuf;

use crate::store::{Snapshot, TrackRow};

/// What typed characters currently go to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    Filter,
    AddPath,
}

/// The view model the renderer draws from.
pub struct App {
    pub snapshot: Snapshot,
    /// Base index of the highlighted row.
    pub selected: usize,
    pub follow_playback: bool,
    pub mode: InputMode,
    pub filter_query: String,
    pub path_input: String,
    pub metadata_window: bool,
    pub status: Option<String>,

    lower_titles: Option<Vec<String>>,
}

impl App {
    pub fn new(snapshot: Snapshot) -> Self {
        let mut app = Self {
            snapshot: Snapshot::default(),
            selected: 0,
            follow_playback: true,
            mode: InputMode::Normal,
            filter_query: String::new(),
            path_input: String::new(),
            metadata_window: false,
            status: None,
            lower_titles: None,
        };
        app.refresh(snapshot);
        app
    }

    /// Take a new snapshot from the store.
    ///
    /// With follow-playback on the cursor jumps to the current track; the
    /// selection is clamped either way so it never points past the list.
    pub fn refresh(&mut self, snapshot: Snapshot) {
        // Lowercased titles only pay off for larger playlists.
        self.lower_titles = (snapshot.tracks.len() > 100).then(|| {
            snapshot
                .tracks
                .iter()
                .map(|t| t.display.to_ascii_lowercase())
                .collect()
        });
        self.snapshot = snapshot;

        if self.follow_playback && self.mode != InputMode::Filter {
            if let Some(current) = self.snapshot.current {
                self.selected = current;
            }
        }
        self.ensure_selected_visible();
    }

    pub fn has_tracks(&self) -> bool {
        !self.snapshot.tracks.is_empty()
    }

    pub fn selected_row(&self) -> Option<&TrackRow> {
        self.snapshot.tracks.get(self.selected)
    }

    pub fn current_row(&self) -> Option<&TrackRow> {
        self.snapshot
            .current
            .and_then(|i| self.snapshot.tracks.get(i))
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// The cursor jumps to the current track on the next refresh.
    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    /// Rows in the order they are listed: play order, narrowed by the filter.
    pub fn display_indices(&self) -> Vec<usize> {
        let base = if self.snapshot.order.len() == self.snapshot.tracks.len() {
            self.snapshot.order.clone()
        } else {
            (0..self.snapshot.tracks.len()).collect()
        };

        let query = self.filter_query.trim();
        if query.is_empty() {
            return base;
        }
        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                let query_lower = query.to_ascii_lowercase();
                base.into_iter()
                    .filter(|&i| {
                        Self::fuzzy_match_positions_lower(&lower_titles[i], &query_lower).is_some()
                    })
                    .collect()
            }
            None => base
                .into_iter()
                .filter(|&i| {
                    Self::fuzzy_match_positions(&self.snapshot.tracks[i].display, query).is_some()
                })
                .collect(),
        }
    }

    /// Return the next visible index after `current`, wrapping to the first.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }
        match display.iter().position(|&i| i == current) {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Return the previous visible index before `current`, wrapping to the last.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        let last = *display.last()?;
        match display.iter().position(|&i| i == current) {
            Some(0) | None => Some(last),
            Some(p) => Some(display[p - 1]),
        }
    }

    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }

    /// Subsequence match, ASCII case-insensitive. Returns the char positions
    /// in `title` that matched `query`.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut positions = Vec::new();
        let mut title_iter = title.chars().enumerate();
        for qc in query.chars() {
            let qc_low = qc.to_ascii_lowercase();
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc.to_ascii_lowercase() == qc_low => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }
        Some(positions)
    }

    fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
        let mut positions = Vec::new();
        let mut title_iter = title_lower.chars().enumerate();
        for qc in query_lower.chars() {
            let (ti, _) = title_iter.find(|&(_, tc)| tc == qc)?;
            positions.push(ti);
        }
        Some(positions)
    }

    // -- filter prompt -------------------------------------------------------

    pub fn enter_filter_mode(&mut self) {
        self.mode = InputMode::Filter;
        self.follow_playback_off();
        self.ensure_selected_visible();
    }

    /// Leave the prompt but keep the filter applied.
    pub fn exit_filter_mode(&mut self) {
        self.mode = InputMode::Normal;
    }

    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.mode = InputMode::Normal;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    // -- add-path prompt -----------------------------------------------------

    pub fn begin_add_path(&mut self) {
        self.mode = InputMode::AddPath;
        self.path_input.clear();
    }

    pub fn push_path_char(&mut self, c: char) {
        self.path_input.push(c);
    }

    pub fn pop_path_char(&mut self) {
        self.path_input.pop();
    }

    pub fn cancel_input(&mut self) {
        self.mode = InputMode::Normal;
        self.path_input.clear();
    }

    /// Close the add-path prompt and hand out what was typed.
    ///
    /// A leading `~/` is expanded against `$HOME`. Blank input yields `None`.
    pub fn take_path_input(&mut self) -> Option<PathBuf> {
        self.mode = InputMode::Normal;
        let raw = std::mem::take(&mut self.path_input);
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let (Some(rest), Some(home)) = (raw.strip_prefix("~/"), std::env::var_os("HOME")) {
            return Some(PathBuf::from(home).join(rest));
        }
        Some(PathBuf::from(raw))
    }

    /// Keep `selected` inside the listed rows, else move it to the first one.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        match display.first() {
            None => self.selected = 0,
            Some(&first) if !display.contains(&self.selected) => self.selected = first,
            Some(_) => {}
        }
    }
}
