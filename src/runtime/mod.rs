use std::cell::RefCell;
use std::env;
use std::path::PathBuf;
use std::rc::Rc;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::{info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::{EngineHandle, RodioEngine};
use crate::error::Error;
use crate::store::{MemoryPreferences, PreferenceStore, TomlPreferences};

mod event_loop;
mod logging;
mod session;
mod settings;


use session::Session;

pub fn run() -> Result<(), Error> {
    let (settings, config_warning) = settings::load_settings();
    let log_file = logging::init(&settings.log);
    if let Some(msg) = config_warning {
        warn!("{msg}");
    }
    info!("mixtape starting, log file {log_file:?}");

    let engine: EngineHandle = Rc::new(RefCell::new(RodioEngine::open(settings.audio.volume)?));
    let prefs: Box<dyn PreferenceStore> = match settings.prefs.resolved_path() {
        Some(path) => Box::new(TomlPreferences::open(path)),
        None => {
            warn!("no state directory, preferences will not be saved");
            Box::new(MemoryPreferences::new())
        }
    };
    let mut session = Session::new(engine, prefs);

    let mut roots: Vec<PathBuf> = env::args_os().skip(1).map(PathBuf::from).collect();
    if roots.is_empty() {
        roots.extend(env::current_dir().ok());
    }
    session.import(roots, &settings.library);

    let mut app = App::new(session.snapshot());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &mut session);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("mixtape exiting");
    run_result
}
