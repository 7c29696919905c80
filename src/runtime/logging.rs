use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use crate::config::LogSettings;

/// Route `log` output to the configured file.
///
/// The terminal belongs to the UI, so when no file can be opened logging
/// stays off. Returns the file in use.
pub fn init(settings: &LogSettings) -> Option<PathBuf> {
    let path = settings.resolved_file()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&settings.level);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .ok()?;
    Some(path)
}
