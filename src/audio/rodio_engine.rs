use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::decode::{DecodedAudio, PendingDecode};
use super::engine::{
    AudioEngine, AudioSource, DecodeTicket, EngineError, EngineEvent, Segment, VoiceId,
};

/// [`AudioEngine`] over the default rodio output device.
///
/// Every voice gets its own `Sink` on the stream's mixer. A voice whose sink
/// has drained is reported as ended on the next poll.
pub struct RodioEngine {
    stream: OutputStream,
    epoch: Instant,
    volume: f32,
    next_voice: u64,
    voices: Vec<(VoiceId, Sink)>,
    decodes: Vec<(DecodeTicket, PendingDecode)>,
}

impl RodioEngine {
    pub fn open(volume: f32) -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped, which would land
        // on top of the terminal UI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            epoch: Instant::now(),
            volume: volume.clamp(0.0, 1.0),
            next_voice: 1,
            voices: Vec::new(),
            decodes: Vec::new(),
        })
    }
}

impl AudioEngine for RodioEngine {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn decode(&mut self, source: &AudioSource, ticket: DecodeTicket) {
        debug!("decode requested for {source} ({:?})", ticket);
        self.decodes
            .push((ticket, PendingDecode::spawn(source.path().to_path_buf())));
    }

    fn start(
        &mut self,
        audio: &Arc<DecodedAudio>,
        segment: Segment,
    ) -> Result<VoiceId, EngineError> {
        if audio.channels == 0 || audio.sample_rate == 0 {
            return Err(EngineError::Start("buffer has no channels".into()));
        }

        let from = audio.sample_offset(segment.start);
        let to = audio.sample_offset(segment.end).max(from);
        let source = SamplesBuffer::new(
            audio.channels,
            audio.sample_rate,
            audio.samples[from..to].to_vec(),
        );

        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        sink.append(source);
        sink.play();

        let voice = VoiceId(self.next_voice);
        self.next_voice += 1;
        self.voices.push((voice, sink));
        debug!("{voice} started at {:.2}s for {:.2}s", segment.start, segment.length());
        Ok(voice)
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(pos) = self.voices.iter().position(|(v, _)| *v == voice) {
            let (_, sink) = self.voices.remove(pos);
            sink.stop();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        for (_, sink) in &self.voices {
            sink.set_volume(self.volume);
        }
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();

        self.decodes.retain(|(ticket, pending)| match pending.try_take() {
            Some(result) => {
                if let Err(e) = &result {
                    warn!("decode of {} failed: {e}", pending.path().display());
                }
                events.push(EngineEvent::Decoded {
                    ticket: *ticket,
                    result,
                });
                false
            }
            None => true,
        });

        self.voices.retain(|(voice, sink)| {
            if sink.empty() {
                events.push(EngineEvent::SegmentEnded { voice: *voice });
                false
            } else {
                true
            }
        });

        events
    }
}
