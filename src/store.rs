//! The playlist store.
//!
//! All playlist and playback state lives in [`PlaylistStore`], which changes
//! only in response to [`Action`]s broadcast through the dispatcher. Every
//! handled action is followed by exactly one [`StoreEvent::Change`].

mod actions;
mod playlist;
mod prefs;
mod repeat;
mod shuffle;

pub use actions::{Action, Actions};
pub use playlist::{PlaylistStore, Snapshot, StoreEvent, StoreHandle, TrackRow};
pub use prefs::{
    MemoryPreferences, PreferenceStore, Preferences, PrefsError, REPEAT_KEY, SHUFFLE_KEY,
    TomlPreferences,
};
pub use repeat::RepeatMode;
