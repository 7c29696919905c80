use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use log::{info, warn};

use crate::config::LibrarySettings;
use crate::song::TrackInfo;

use super::scan::collect_audio_files;
use super::tags::read_track_info;

#[derive(Debug)]
pub enum ImportEvent {
    Track(TrackInfo),
    /// Every file under `root` has been sent.
    Done { root: PathBuf, count: usize },
}

/// Scan `paths` and read their tags on a worker thread.
///
/// Tracks arrive in scan order, each root followed by its `Done`. The
/// channel closes once every root is processed.
pub fn spawn_import(paths: Vec<PathBuf>, settings: LibrarySettings) -> Receiver<ImportEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for root in paths {
            if !root.exists() {
                warn!("import: {} does not exist", root.display());
            }
            let files = collect_audio_files(&root, &settings);
            let count = files.len();
            for file in files {
                if tx.send(ImportEvent::Track(read_track_info(&file))).is_err() {
                    return;
                }
            }
            info!("import: {count} track(s) from {}", root.display());
            if tx.send(ImportEvent::Done { root, count }).is_err() {
                return;
            }
        }
    });
    rx
}
