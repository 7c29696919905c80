//! Terminal rendering with `ratatui`.
//!
//! Everything drawn here comes from [`App`] and the store snapshot it
//! carries; the renderer never touches the store or the audio engine.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, InputMode};
use crate::config::{ControlsSettings, TimeField, UiSettings};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("j/k", "up/down"),
        ("gg/G", "top/bottom"),
        ("enter", "play selected"),
        ("space/p", "play/pause"),
        ("x", "stop"),
        ("h/l", "prev/next"),
        ("+/-", "volume"),
        ("a", "add path"),
        ("d/D", "remove/clear"),
        ("/", "filter"),
        ("s", "shuffle"),
        ("r", "repeat"),
        ("K", "metadata"),
        ("q", "quit"),
    ])
});

const LEFT_PAD: Padding = Padding {
    left: 1,
    right: 0,
    top: 0,
    bottom: 0,
};

fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "x", "+/-", "gg/G", "a", "d/D", "K", "/", "s",
        "r", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] seek -/+{scrub_seconds}s"))
            } else {
                CONTROLS_MAP.get(k).map(|v| format!("[{k}] {v}"))
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Seconds as `m:ss`, rounded to the nearest second.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

fn now_playing_time_text(position: f64, duration: f64, ui: &UiSettings) -> Option<String> {
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .map(|f| match f {
            TimeField::Elapsed => format_time(position),
            TimeField::Total => format_time(duration),
            TimeField::Remaining => format!("-{}", format_time((duration - position).max(0.0))),
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join(&ui.now_playing_time_separator))
}

fn centered_rect_sized(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width.saturating_sub(2)).max(10);
    let height = height.min(r.height.saturating_sub(2)).max(5);
    Rect {
        x: r.x + (r.width.saturating_sub(width) / 2),
        y: r.y + (r.height.saturating_sub(height) / 2),
        width,
        height,
    }
}

/// Upper-case the characters of `title` the filter matched.
fn highlight(title: &str, query: &str) -> String {
    let Some(positions) = App::fuzzy_match_positions(title, query) else {
        return title.to_string();
    };
    let mut pos_iter = positions.into_iter().peekable();
    let mut rendered = String::with_capacity(title.len());
    for (ci, ch) in title.chars().enumerate() {
        if pos_iter.peek() == Some(&ci) {
            rendered.extend(ch.to_uppercase());
            pos_iter.next();
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

fn status_text(app: &App) -> String {
    let snap = &app.snapshot;
    let state = if snap.loading {
        "Loading"
    } else if snap.playing {
        "Playing"
    } else if snap.paused {
        "Paused"
    } else {
        "Stopped"
    };

    let mut first = vec![state.to_string()];
    if let Some(row) = app.current_row() {
        first.push(row.display.clone());
        if let Some(album) = row.album.as_deref().filter(|a| !a.trim().is_empty()) {
            first.push(album.to_string());
        }
        if row.has_picture {
            first.push("[cover]".to_string());
        }
    }

    let mut second = vec![
        format!("SHUFFLE: {}", if snap.shuffle { "on" } else { "off" }),
        format!("REPEAT: {}", snap.repeat),
        format!("VOLUME: {:.0}%", snap.volume * 100.0),
        format!(
            "CURSOR: {}",
            if app.follow_playback { "follow" } else { "free" }
        ),
    ];
    let q = app.filter_query.trim();
    if !q.is_empty() {
        second.push(format!("FILTER: {q}"));
    }

    let mut text = format!("{}\n{}", first.join(" • "), second.join(" • "));
    if let Some(err) = &snap.last_error {
        text.push_str(&format!("\nerror: {err}"));
    } else if let Some(status) = &app.status {
        text.push('\n');
        text.push_str(status);
    }
    text
}

fn footer_text(app: &App, controls: &ControlsSettings) -> String {
    match app.mode {
        InputMode::Normal => controls_text(controls.scrub_seconds),
        InputMode::Filter => format!(
            "filter: {}_   [enter] play • [esc] clear • [ctrl-j/k] move",
            app.filter_query
        ),
        InputMode::AddPath => format!(
            "add file or folder: {}_   [enter] import • [esc] cancel",
            app.path_input
        ),
    }
}

/// Render the whole UI into `frame`.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings, controls: &ControlsSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" mixtape ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app))
        .block(Block::bordered().padding(LEFT_PAD).title(" now playing "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    let snap = &app.snapshot;
    let label = now_playing_time_text(snap.position, snap.duration, ui_settings).unwrap_or_default();
    let gauge = Gauge::default()
        .block(Block::bordered().title(" progress "))
        .gauge_style(Style::default().add_modifier(Modifier::BOLD))
        .ratio(snap.fraction.clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, chunks[2]);

    draw_playlist(frame, app, chunks[3]);

    if app.metadata_window {
        draw_metadata(frame, app, chunks[3]);
    }

    let footer = Paragraph::new(footer_text(app, controls))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(LEFT_PAD),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}

fn draw_playlist(frame: &mut Frame, app: &App, area: Rect) {
    let display = app.display_indices();
    let q = app.filter_query.trim();

    // Only build items for the window around the cursor.
    let total = display.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let sel_pos = display
        .iter()
        .position(|&i| i == app.selected)
        .unwrap_or(0);
    let (start, end) = if total <= list_height || list_height == 0 {
        (0, total)
    } else {
        let half = list_height / 2;
        let start = sel_pos.saturating_sub(half).min(total - list_height);
        (start, start + list_height)
    };

    let items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let row = &app.snapshot.tracks[i];
            let title = if q.is_empty() {
                row.display.clone()
            } else {
                highlight(&row.display, q)
            };
            let text = if row.duration > 0.0 {
                format!("{title}  ({})", format_time(row.duration))
            } else {
                title
            };
            let item = ListItem::new(text);
            if app.snapshot.current == Some(i) {
                item.bold()
            } else {
                item
            }
        })
        .collect();

    let title = format!(" playlist ({}) ", app.snapshot.tracks.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if total > 0 {
        state.select(Some(sel_pos - start));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_metadata(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_sized(72, 9, area);
    frame.render_widget(Clear, popup_area);

    let meta = match app.selected_row() {
        Some(row) => format!(
            "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nCover: {}",
            row.title,
            row.artist,
            row.album.as_deref().unwrap_or("-"),
            if row.duration > 0.0 {
                format_time(row.duration)
            } else {
                "-".to_string()
            },
            if row.has_picture { "yes" } else { "no" },
        ),
        None => "No track selected".to_string(),
    };
    let paragraph = Paragraph::new(meta)
        .block(
            Block::default()
                .padding(LEFT_PAD)
                .borders(Borders::ALL)
                .title(" metadata (K closes) "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}
