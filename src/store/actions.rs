use std::rc::Rc;
use std::sync::Arc;

use log::trace;

use crate::audio::{DecodeError, DecodeTicket, DecodedAudio, EngineEvent, EngineHandle, VoiceId};
use crate::dispatcher::{DispatchError, Dispatcher};
use crate::song::TrackInfo;

/// Everything that can change the playlist store.
///
/// Indices in `RemoveSong` and `Select` are positions in the base playlist,
/// the order tracks were added in.
#[derive(Debug)]
pub enum Action {
    AddSong(TrackInfo),
    AddSongs(Vec<TrackInfo>),
    RemoveSong(usize),
    RemoveAll,
    TogglePlay,
    Stop,
    ToggleShuffle,
    CycleRepeat,
    Previous,
    Next,
    Select(usize),
    /// Only asks listeners to re-read the playback position.
    SetCurrentTime,
    SeekTo(f64),
    SetVolume(f32),
    DecodeFinished {
        ticket: DecodeTicket,
        result: Result<Arc<DecodedAudio>, DecodeError>,
    },
    SegmentEnded {
        voice: VoiceId,
    },
}

impl From<EngineEvent> for Action {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::Decoded { ticket, result } => Self::DecodeFinished { ticket, result },
            EngineEvent::SegmentEnded { voice } => Self::SegmentEnded { voice },
        }
    }
}

/// Action creators: one method per action, each a single dispatch.
#[derive(Clone)]
pub struct Actions {
    dispatcher: Rc<Dispatcher<Action>>,
}

impl Actions {
    pub fn new(dispatcher: Rc<Dispatcher<Action>>) -> Self {
        Self { dispatcher }
    }

    #[cfg(test)]
    pub fn dispatcher(&self) -> &Rc<Dispatcher<Action>> {
        &self.dispatcher
    }

    fn send(&self, action: Action) -> Result<(), DispatchError> {
        trace!("action: {action:?}");
        self.dispatcher.dispatch(action)
    }

    pub fn add_song(&self, track: TrackInfo) -> Result<(), DispatchError> {
        self.send(Action::AddSong(track))
    }

    pub fn add_songs(&self, tracks: Vec<TrackInfo>) -> Result<(), DispatchError> {
        self.send(Action::AddSongs(tracks))
    }

    pub fn remove_song(&self, index: usize) -> Result<(), DispatchError> {
        self.send(Action::RemoveSong(index))
    }

    pub fn remove_all(&self) -> Result<(), DispatchError> {
        self.send(Action::RemoveAll)
    }

    pub fn toggle_play(&self) -> Result<(), DispatchError> {
        self.send(Action::TogglePlay)
    }

    pub fn stop(&self) -> Result<(), DispatchError> {
        self.send(Action::Stop)
    }

    pub fn toggle_shuffle(&self) -> Result<(), DispatchError> {
        self.send(Action::ToggleShuffle)
    }

    pub fn cycle_repeat(&self) -> Result<(), DispatchError> {
        self.send(Action::CycleRepeat)
    }

    pub fn previous(&self) -> Result<(), DispatchError> {
        self.send(Action::Previous)
    }

    pub fn next(&self) -> Result<(), DispatchError> {
        self.send(Action::Next)
    }

    pub fn select(&self, index: usize) -> Result<(), DispatchError> {
        self.send(Action::Select(index))
    }

    pub fn set_current_time(&self) -> Result<(), DispatchError> {
        self.send(Action::SetCurrentTime)
    }

    pub fn seek_to(&self, seconds: f64) -> Result<(), DispatchError> {
        self.send(Action::SeekTo(seconds))
    }

    pub fn set_volume(&self, volume: f32) -> Result<(), DispatchError> {
        self.send(Action::SetVolume(volume))
    }

    /// Drain the engine and dispatch one action per event. Returns how many
    /// were dispatched.
    pub fn forward_engine_events(&self, engine: &EngineHandle) -> Result<usize, DispatchError> {
        // The store borrows the engine while handling these, so the borrow
        // has to end before the first dispatch.
        let events = engine.borrow_mut().poll_events();
        let count = events.len();
        for event in events {
            self.send(Action::from(event))?;
        }
        Ok(count)
    }
}
