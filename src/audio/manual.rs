//! Deterministic engine for tests: time only moves when told to.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::decode::{DecodeError, DecodedAudio};
use super::engine::{
    AudioEngine, AudioSource, DecodeTicket, EngineError, EngineEvent, Segment, VoiceId,
};

pub(crate) const DEFAULT_DURATION: f64 = 10.0;

pub(crate) struct ManualEngine {
    now: f64,
    volume: f32,
    next_voice: u64,
    durations: HashMap<PathBuf, f64>,
    failing: HashSet<PathBuf>,
    hold_decodes: bool,
    held: Vec<(DecodeTicket, AudioSource)>,
    queued: Vec<EngineEvent>,
    active: Vec<VoiceId>,
    pub(crate) decode_requests: Vec<DecodeTicket>,
    pub(crate) started: Vec<(VoiceId, Segment)>,
    pub(crate) stopped: Vec<VoiceId>,
}

impl ManualEngine {
    pub(crate) fn new() -> Self {
        Self {
            now: 0.0,
            volume: 1.0,
            next_voice: 1,
            durations: HashMap::new(),
            failing: HashSet::new(),
            hold_decodes: false,
            held: Vec::new(),
            queued: Vec::new(),
            active: Vec::new(),
            decode_requests: Vec::new(),
            started: Vec::new(),
            stopped: Vec::new(),
        }
    }

    pub(crate) fn advance(&mut self, seconds: f64) {
        self.now += seconds;
    }

    pub(crate) fn set_duration(&mut self, path: impl AsRef<Path>, seconds: f64) {
        self.durations.insert(path.as_ref().to_path_buf(), seconds);
    }

    pub(crate) fn fail_decoding(&mut self, path: impl AsRef<Path>) {
        self.failing.insert(path.as_ref().to_path_buf());
    }

    /// Keep decode results back until [`ManualEngine::release_decodes`].
    pub(crate) fn hold_decodes(&mut self) {
        self.hold_decodes = true;
    }

    pub(crate) fn release_decodes(&mut self) {
        self.hold_decodes = false;
        for (ticket, source) in std::mem::take(&mut self.held) {
            self.complete(ticket, &source);
        }
    }

    pub(crate) fn active_voices(&self) -> &[VoiceId] {
        &self.active
    }

    /// Let a voice run out, as if its segment reached the end.
    pub(crate) fn end_voice(&mut self, voice: VoiceId) {
        if let Some(pos) = self.active.iter().position(|v| *v == voice) {
            self.active.remove(pos);
            self.queued.push(EngineEvent::SegmentEnded { voice });
        }
    }

    fn complete(&mut self, ticket: DecodeTicket, source: &AudioSource) {
        let path = source.path();
        let result = if self.failing.contains(path) {
            Err(DecodeError::Unsupported {
                path: path.to_path_buf(),
                reason: "unrecognized format".into(),
            })
        } else {
            let seconds = self
                .durations
                .get(path)
                .copied()
                .unwrap_or(DEFAULT_DURATION);
            Ok(Arc::new(DecodedAudio::silence(seconds)))
        };
        self.queued.push(EngineEvent::Decoded { ticket, result });
    }
}

impl AudioEngine for ManualEngine {
    fn now(&self) -> f64 {
        self.now
    }

    fn decode(&mut self, source: &AudioSource, ticket: DecodeTicket) {
        self.decode_requests.push(ticket);
        if self.hold_decodes {
            self.held.push((ticket, source.clone()));
        } else {
            self.complete(ticket, source);
        }
    }

    fn start(
        &mut self,
        _audio: &Arc<DecodedAudio>,
        segment: Segment,
    ) -> Result<VoiceId, EngineError> {
        let voice = VoiceId(self.next_voice);
        self.next_voice += 1;
        self.active.push(voice);
        self.started.push((voice, segment));
        Ok(voice)
    }

    fn stop(&mut self, voice: VoiceId) {
        self.active.retain(|v| *v != voice);
        self.stopped.push(voice);
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.queued)
    }
}
