//! Audio output.
//!
//! The playback state machine never talks to rodio directly. It drives an
//! [`AudioEngine`]: a monotonic clock in seconds, background decoding and
//! "play this segment of that buffer" scheduling. Completions (decoded
//! buffers, segments that ran out) are reported back through
//! [`AudioEngine::poll_events`] so the event loop can turn them into actions.

mod decode;
mod engine;
#[cfg(test)]
pub(crate) mod manual;
mod rodio_engine;

pub use decode::{DecodeError, DecodedAudio, PendingDecode, decode_file};
pub use engine::{
    AudioEngine, AudioSource, DecodeTicket, EngineError, EngineEvent, EngineHandle, Segment,
    VoiceId,
};
pub use rodio_engine::RodioEngine;

#[cfg(test)]
mod tests;
