//! Turning paths on disk into playlist entries.
//!
//! [`collect_audio_files`] walks a file or directory, [`read_track_info`]
//! pulls tags and cover art, and [`spawn_import`] runs both off the UI
//! thread.

mod import;
mod scan;
mod tags;

pub use import::{ImportEvent, spawn_import};
pub use scan::{collect_audio_files, is_wanted, mime_type_for};
pub use tags::{picture_data_uri, read_track_info};
