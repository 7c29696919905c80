use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use crate::song::TrackId;

use super::decode::{DecodeError, DecodedAudio};

/// Where a track's audio comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource(PathBuf);

impl AudioSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A `[start, end)` window of a decoded buffer, in seconds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn length(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Identifies one scheduled playback of a segment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VoiceId(pub(crate) u64);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// Names the decode request a result belongs to.
///
/// A song bumps its generation when it is unloaded, so a result carrying an
/// older generation is stale and gets dropped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodeTicket {
    pub track: TrackId,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    Decoded {
        ticket: DecodeTicket,
        result: Result<Arc<DecodedAudio>, DecodeError>,
    },
    SegmentEnded {
        voice: VoiceId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
    #[error("failed to start playback: {0}")]
    Start(String),
}

pub trait AudioEngine {
    /// Monotonic clock in seconds.
    fn now(&self) -> f64;

    /// Start decoding `source` in the background. The outcome is reported as
    /// [`EngineEvent::Decoded`] carrying `ticket`.
    fn decode(&mut self, source: &AudioSource, ticket: DecodeTicket);

    /// Play `segment` of `audio` right away.
    fn start(&mut self, audio: &Arc<DecodedAudio>, segment: Segment)
    -> Result<VoiceId, EngineError>;

    /// Silence a voice. Stopped voices never report [`EngineEvent::SegmentEnded`].
    fn stop(&mut self, voice: VoiceId);

    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    /// Drain completions since the last call.
    fn poll_events(&mut self) -> Vec<EngineEvent>;
}

pub type EngineHandle = Rc<RefCell<dyn AudioEngine>>;
