use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, trace};

use crate::audio::{
    AudioEngine, DecodeError, DecodeTicket, DecodedAudio, EngineError, Segment, VoiceId,
};

use super::model::{TrackId, TrackInfo};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PlaybackState {
    Playing {
        /// Position in the track when the current voice started.
        start_position: f64,
        /// Engine time when the current voice started.
        last_play: f64,
        voice: VoiceId,
    },
    Paused {
        start_position: f64,
    },
    Finished,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SongEvent {
    Finished(TrackId),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    /// The buffer is still being decoded; playback starts once it arrives.
    Decoding,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The result belongs to an earlier load of this song and was dropped.
    Stale,
    /// Buffer cached, nothing was waiting for it.
    Ready,
    /// Buffer cached and the parked play request started.
    Started,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct PlayRequest {
    from: Option<f64>,
    to: Option<f64>,
}

/// A track in the playlist together with its playback state.
///
/// Every time computation is done against the engine clock passed in by the
/// caller; the song never keeps a clock of its own.
pub struct Song {
    id: TrackId,
    info: TrackInfo,
    state: PlaybackState,
    buffer: Option<Arc<DecodedAudio>>,
    duration: Option<f64>,
    generation: u64,
    decoding: bool,
    parked: Option<PlayRequest>,
    listeners: Vec<Sender<SongEvent>>,
}

impl Song {
    pub fn new(id: TrackId, info: TrackInfo) -> Self {
        Self {
            id,
            info,
            state: PlaybackState::Paused {
                start_position: 0.0,
            },
            buffer: None,
            duration: None,
            generation: 0,
            decoding: false,
            parked: None,
            listeners: Vec::new(),
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn info(&self) -> &TrackInfo {
        &self.info
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Duration in seconds, 0 until the first decode finished.
    pub fn duration(&self) -> f64 {
        self.duration.unwrap_or(0.0)
    }

    #[cfg(test)]
    pub fn is_decoded(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    /// True while a play request waits for the decoder.
    pub fn is_waiting_for_decode(&self) -> bool {
        self.parked.is_some()
    }

    pub fn ticket(&self) -> DecodeTicket {
        DecodeTicket {
            track: self.id,
            generation: self.generation,
        }
    }

    pub fn subscribe(&mut self) -> Receiver<SongEvent> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    /// Play `[from, to)`; both default through [`Song::seek_to`].
    ///
    /// Without a cached buffer the request is parked and a decode is started
    /// (never more than one at a time); [`Song::resolve_decode`] finishes it.
    pub fn play(
        &mut self,
        engine: &mut dyn AudioEngine,
        from: Option<f64>,
        to: Option<f64>,
    ) -> Result<PlayOutcome, PlaybackError> {
        if let Some(buffer) = self.buffer.clone() {
            self.start_segment(engine, &buffer, from, to)?;
            return Ok(PlayOutcome::Started);
        }

        self.parked = Some(PlayRequest { from, to });
        if !self.decoding {
            self.decoding = true;
            engine.decode(&self.info.source, self.ticket());
        }
        Ok(PlayOutcome::Decoding)
    }

    /// Apply a finished decode.
    ///
    /// A failed decode drops the parked request and leaves the song paused.
    pub fn resolve_decode(
        &mut self,
        engine: &mut dyn AudioEngine,
        ticket: DecodeTicket,
        result: &Result<Arc<DecodedAudio>, DecodeError>,
    ) -> Result<DecodeOutcome, PlaybackError> {
        if ticket != self.ticket() {
            debug!("{}: dropping stale decode (gen {})", self.id, ticket.generation);
            return Ok(DecodeOutcome::Stale);
        }
        self.decoding = false;

        let buffer = match result {
            Ok(buffer) => Arc::clone(buffer),
            Err(e) => {
                self.parked = None;
                return Err(PlaybackError::Decode(e.clone()));
            }
        };
        self.duration = Some(buffer.duration());
        self.buffer = Some(Arc::clone(&buffer));

        match self.parked.take() {
            Some(req) => {
                self.start_segment(engine, &buffer, req.from, req.to)?;
                Ok(DecodeOutcome::Started)
            }
            None => Ok(DecodeOutcome::Ready),
        }
    }

    pub fn pause(&mut self, engine: &mut dyn AudioEngine) {
        self.parked = None;
        match self.state {
            PlaybackState::Playing {
                start_position,
                last_play,
                voice,
                ..
            } => {
                engine.stop(voice);
                let elapsed = (engine.now() - last_play).max(0.0);
                self.state = PlaybackState::Paused {
                    start_position: start_position + elapsed,
                };
            }
            PlaybackState::Finished => {
                self.state = PlaybackState::Paused {
                    start_position: self.duration(),
                };
            }
            PlaybackState::Paused { .. } => {}
        }
    }

    pub fn stop(&mut self, engine: &mut dyn AudioEngine) {
        self.pause(engine);
        self.state = PlaybackState::Paused {
            start_position: 0.0,
        };
    }

    /// The engine reported that `voice` ran out.
    ///
    /// Returns false and changes nothing when `voice` is not the one this song
    /// is currently playing.
    pub fn finish(&mut self, voice: VoiceId) -> bool {
        match self.state {
            PlaybackState::Playing { voice: active, .. } if active == voice => {
                self.state = PlaybackState::Finished;
                let event = SongEvent::Finished(self.id);
                self.listeners.retain(|tx| tx.send(event).is_ok());
                trace!("{} finished", self.id);
                true
            }
            _ => false,
        }
    }

    /// Resolve the segment a play would cover.
    ///
    /// `start` defaults to the current time and falls back to 0 once it
    /// reached the end. `end` defaults to the duration. A finished song is
    /// moved back to paused at `start`.
    pub fn seek_to(&mut self, now: f64, start: Option<f64>, end: Option<f64>) -> Segment {
        let duration = self.duration();
        let mut start = start.unwrap_or_else(|| self.current_time(now)).max(0.0);
        if start >= duration {
            start = 0.0;
        }
        let end = end.unwrap_or(duration);

        if self.state == PlaybackState::Finished {
            self.state = PlaybackState::Paused {
                start_position: start,
            };
        }
        Segment { start, end }
    }

    /// Jump to `seconds`, clamped to the track. Keeps playing if it was.
    pub fn seek(
        &mut self,
        engine: &mut dyn AudioEngine,
        seconds: f64,
    ) -> Result<(), PlaybackError> {
        let target = seconds.clamp(0.0, self.duration());
        let playing = self.is_playing();
        match self.buffer.clone() {
            Some(buffer) if playing => self.start_segment(engine, &buffer, Some(target), None),
            _ => {
                self.state = PlaybackState::Paused {
                    start_position: target,
                };
                if let Some(req) = self.parked.as_mut() {
                    req.from = Some(target);
                }
                Ok(())
            }
        }
    }

    pub fn current_time(&self, now: f64) -> f64 {
        match self.state {
            PlaybackState::Playing {
                start_position,
                last_play,
                ..
            } => start_position + (now - last_play),
            PlaybackState::Paused { start_position } => start_position,
            PlaybackState::Finished => self.duration(),
        }
    }

    /// Share of the track played, in `[0, 1]`.
    pub fn played_fraction(&self, now: f64) -> f64 {
        if self.state == PlaybackState::Finished {
            return 1.0;
        }
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        (self.current_time(now) / duration).clamp(0.0, 1.0)
    }

    /// Release everything tied to this load of the song.
    ///
    /// Decodes still in flight carry the old generation and are dropped when
    /// they come back.
    pub fn unload(&mut self, engine: &mut dyn AudioEngine) {
        if !matches!(self.state, PlaybackState::Paused { .. }) {
            self.pause(engine);
        }
        self.listeners.clear();
        self.buffer = None;
        self.parked = None;
        self.decoding = false;
        self.generation += 1;
    }

    fn start_segment(
        &mut self,
        engine: &mut dyn AudioEngine,
        buffer: &Arc<DecodedAudio>,
        from: Option<f64>,
        to: Option<f64>,
    ) -> Result<(), PlaybackError> {
        let now = engine.now();
        let segment = self.seek_to(now, from, to);

        if let PlaybackState::Playing { voice, .. } = self.state {
            engine.stop(voice);
        }
        self.state = PlaybackState::Paused {
            start_position: segment.start,
        };

        let voice = engine.start(buffer, segment)?;
        self.state = PlaybackState::Playing {
            start_position: segment.start,
            last_play: now,
            voice,
        };
        trace!("{} playing {:.2}..{:.2} on {voice}", self.id, segment.start, segment.end);
        Ok(())
    }
}
