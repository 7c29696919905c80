use std::io::Stdout;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::warn;
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, InputMode};
use crate::config;
use crate::dispatcher::DispatchError;
use crate::error::Error;
use crate::ui;

use super::session::Session;

/// State tracked by the event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Two-key prefix state for `gg`.
    pub pending_gg: bool,
    /// Two-key prefix state for `zz`.
    pub pending_zz: bool,
}

/// Main terminal loop: pumps the session, redraws on change and handles
/// keys. Returns once the user quits.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    session: &mut Session,
) -> Result<(), Error> {
    let tick = Duration::from_millis(settings.ui.tick_ms);
    let mut state = EventLoopState::default();
    let mut last_tick = Instant::now();
    let mut dirty = true;

    loop {
        dirty |= pump(app, session);

        if last_tick.elapsed() >= tick {
            last_tick = Instant::now();
            if app.snapshot.playing {
                report(app, session.actions.set_current_time());
                dirty |= pump(app, session);
            }
        }

        if dirty {
            app.refresh(session.snapshot());
            terminal.draw(|f| ui::draw(f, app, &settings.ui, &settings.controls))?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(key, settings, app, session, &mut state) {
                        break;
                    }
                    dirty = true;
                }
                Event::Resize(..) => dirty = true,
                _ => {}
            }
        }
    }

    Ok(())
}

fn pump(app: &mut App, session: &mut Session) -> bool {
    match session.pump(app) {
        Ok(changed) => changed,
        Err(e) => {
            report(app, Err(e));
            true
        }
    }
}

/// Log a failed dispatch and surface it in the status line.
fn report(app: &mut App, result: Result<(), DispatchError>) {
    if let Err(e) = result {
        warn!("dispatch failed: {e}");
        app.set_status(format!("error: {e}"));
    }
}

/// Apply one key press. Returns true when the user asked to quit.
pub fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    session: &mut Session,
    state: &mut EventLoopState,
) -> bool {
    match app.mode {
        InputMode::Filter => {
            state.pending_gg = false;
            handle_filter_key(key, app, session);
            false
        }
        InputMode::AddPath => {
            state.pending_gg = false;
            handle_add_path_key(key, settings, app, session);
            false
        }
        InputMode::Normal => handle_normal_key(key, settings, app, session, state),
    }
}

fn handle_filter_key(key: KeyEvent, app: &mut App, session: &Session) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Char('j' | 'n') if ctrl => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k' | 'p') if ctrl => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Char(c) if !c.is_control() => app.push_filter_char(c),
        KeyCode::Enter => {
            if app.display_indices().is_empty() {
                return;
            }
            let index = app.selected;
            app.exit_filter_mode();
            app.follow_playback_on();
            report(app, session.actions.select(index));
        }
        _ => {}
    }
}

fn handle_add_path_key(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    session: &mut Session,
) {
    match key.code {
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Backspace => app.pop_path_char(),
        KeyCode::Char(c) if !c.is_control() => app.push_path_char(c),
        KeyCode::Enter => {
            if let Some(path) = app.take_path_input() {
                app.set_status(format!("importing {}", path.display()));
                session.import(vec![path], &settings.library);
            }
        }
        _ => {}
    }
}

fn handle_normal_key(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    session: &mut Session,
    state: &mut EventLoopState,
) -> bool {
    let KeyCode::Char(c) = key.code else {
        state.pending_gg = false;
        state.pending_zz = false;
        if key.code == KeyCode::Enter && app.has_tracks() {
            let index = app.selected;
            let already_playing = app.snapshot.playing && app.snapshot.current == Some(index);
            if !already_playing {
                app.follow_playback_on();
                report(app, session.actions.select(index));
            }
        }
        return false;
    };

    // Any key other than the second half of a prefix clears it.
    let gg = std::mem::take(&mut state.pending_gg);
    let zz = std::mem::take(&mut state.pending_zz);
    let actions = &session.actions;
    let position = app.snapshot.position;
    let volume = app.snapshot.volume;

    match c {
        'q' => {
            report(app, actions.stop());
            return true;
        }
        '/' => app.enter_filter_mode(),
        'a' => app.begin_add_path(),
        'K' => app.toggle_metadata_window(),
        'g' if gg => {
            app.follow_playback_off();
            app.select_first();
        }
        'g' => state.pending_gg = true,
        'G' => {
            app.follow_playback_off();
            app.select_last();
        }
        'z' if zz => app.follow_playback_on(),
        'z' => state.pending_zz = true,
        'j' => {
            app.follow_playback_off();
            app.next();
        }
        'k' => {
            app.follow_playback_off();
            app.prev();
        }
        ' ' | 'p' => {
            app.follow_playback_on();
            report(app, actions.toggle_play());
        }
        'x' => report(app, actions.stop()),
        'l' => {
            app.follow_playback_on();
            report(app, actions.next());
        }
        'h' => {
            app.follow_playback_on();
            report(app, actions.previous());
        }
        'L' | 'H' => {
            let step = settings.controls.scrub_seconds as f64;
            let target = if c == 'L' {
                position + step
            } else {
                position - step
            };
            report(app, actions.seek_to(target.max(0.0)));
        }
        '+' | '=' | '-' => {
            let step = settings.controls.volume_step;
            let delta = if c == '-' { -step } else { step };
            report(app, actions.set_volume((volume + delta).clamp(0.0, 1.0)));
        }
        's' => report(app, actions.toggle_shuffle()),
        'r' => report(app, actions.cycle_repeat()),
        'd' => {
            if app.has_tracks() {
                let index = app.selected;
                report(app, actions.remove_song(index));
            }
        }
        'D' => report(app, actions.remove_all()),
        _ => {}
    }
    false
}
