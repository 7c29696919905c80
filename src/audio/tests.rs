use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::tempdir;

use super::manual::ManualEngine;
use super::*;
use crate::song::TrackId;

/// Minimal 16-bit PCM mono WAV of `frames` zero samples.
fn wav_bytes(sample_rate: u32, frames: u32) -> Vec<u8> {
    let data_len = frames * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}

fn ticket(track: u64) -> DecodeTicket {
    DecodeTicket {
        track: TrackId(track),
        generation: 0,
    }
}

#[test]
fn decoded_audio_duration_counts_frames_not_samples() {
    let audio = DecodedAudio {
        channels: 2,
        sample_rate: 4,
        samples: vec![0.0; 16],
    };
    assert_eq!(audio.duration(), 2.0);
    assert_eq!(audio.sample_offset(1.0), 8);
    assert_eq!(audio.sample_offset(-3.0), 0);
    assert_eq!(audio.sample_offset(99.0), 16);
}

#[test]
fn decoded_audio_without_channels_has_zero_duration() {
    let audio = DecodedAudio {
        channels: 0,
        sample_rate: 44_100,
        samples: Vec::new(),
    };
    assert_eq!(audio.duration(), 0.0);
}

#[test]
fn segment_length_never_goes_negative() {
    assert_eq!(Segment { start: 1.0, end: 3.5 }.length(), 2.5);
    assert_eq!(Segment { start: 4.0, end: 3.0 }.length(), 0.0);
}

#[test]
fn decode_file_reports_missing_file() {
    let dir = tempdir().unwrap();
    let err = decode_file(&dir.path().join("nope.mp3")).unwrap_err();
    assert!(matches!(err, DecodeError::FileRead { .. }), "{err:?}");
}

#[test]
fn decode_file_rejects_garbage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("noise.mp3");
    fs::write(&path, b"definitely not audio").unwrap();

    let err = decode_file(&path).unwrap_err();
    assert!(
        matches!(err, DecodeError::Unsupported { .. } | DecodeError::Empty { .. }),
        "{err:?}"
    );
}

#[test]
fn decode_file_reads_pcm_wav() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    fs::write(&path, wav_bytes(8_000, 8_000)).unwrap();

    let audio = decode_file(&path).unwrap();
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.sample_rate, 8_000);
    assert!((audio.duration() - 1.0).abs() < 0.01);
}

#[test]
fn pending_decode_delivers_the_worker_result() {
    let dir = tempdir().unwrap();
    let pending = PendingDecode::spawn(dir.path().join("missing.ogg"));

    let deadline = Instant::now() + Duration::from_secs(5);
    let result = loop {
        if let Some(result) = pending.try_take() {
            break result;
        }
        assert!(Instant::now() < deadline, "decode worker never answered");
        thread::sleep(Duration::from_millis(5));
    };
    assert!(matches!(result, Err(DecodeError::FileRead { .. })));
}

#[test]
fn manual_engine_reports_decodes_with_their_ticket() {
    let mut engine = ManualEngine::new();
    engine.set_duration("/music/a.mp3", 3.0);
    engine.fail_decoding("/music/b.mp3");

    engine.decode(&AudioSource::new("/music/a.mp3"), ticket(1));
    engine.decode(&AudioSource::new("/music/b.mp3"), ticket(2));

    let events = engine.poll_events();
    assert_eq!(events.len(), 2);
    match &events[0] {
        EngineEvent::Decoded { ticket: t, result } => {
            assert_eq!(*t, ticket(1));
            assert_eq!(result.as_ref().unwrap().duration(), 3.0);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        &events[1],
        EngineEvent::Decoded { result: Err(DecodeError::Unsupported { .. }), .. }
    ));
    assert!(engine.poll_events().is_empty());
}

#[test]
fn manual_engine_only_ends_voices_that_are_still_active() {
    let mut engine = ManualEngine::new();
    let audio = std::sync::Arc::new(DecodedAudio::silence(2.0));
    let a = engine.start(&audio, Segment { start: 0.0, end: 2.0 }).unwrap();
    let b = engine.start(&audio, Segment { start: 0.0, end: 2.0 }).unwrap();
    assert_ne!(a, b);

    engine.stop(a);
    engine.end_voice(a);
    engine.end_voice(b);

    let events = engine.poll_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], EngineEvent::SegmentEnded { voice } if voice == b));
    assert!(engine.active_voices().is_empty());
}
