//! One playlist entry and its playback state machine.

mod model;
mod state;

pub use model::{TrackId, TrackInfo, UNKNOWN_ARTIST, UNKNOWN_TITLE};
pub use state::{DecodeOutcome, PlayOutcome, PlaybackError, PlaybackState, Song, SongEvent};
