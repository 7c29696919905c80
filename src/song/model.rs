use std::fmt;

use crate::audio::AudioSource;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Insertion identity assigned by the playlist store. Titles may repeat,
/// ids never do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub(crate) u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track#{}", self.0)
    }
}

/// What the library hands over for each file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Cover art as a `data:<mime>;base64,...` URI.
    pub picture: Option<String>,
    pub source: AudioSource,
}

impl TrackInfo {
    pub fn new(source: AudioSource) -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: None,
            picture: None,
            source,
        }
    }

    /// `"Artist - Title"`, or just the title when the artist is unknown.
    pub fn display(&self) -> String {
        let artist = self.artist.trim();
        if artist.is_empty() || artist == UNKNOWN_ARTIST {
            self.title.clone()
        } else {
            format!("{} - {}", artist, self.title)
        }
    }
}
