use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::audio::{DecodeError, DecodeTicket, DecodedAudio, EngineHandle, VoiceId};
use crate::dispatcher::{DispatchError, DispatchToken, Dispatcher};
use crate::song::{PlaybackError, Song, TrackId, TrackInfo};

use super::actions::Action;
use super::prefs::{PreferenceStore, Preferences, REPEAT_KEY, SHUFFLE_KEY};
use super::repeat::RepeatMode;
use super::shuffle::{remove_position, shuffled_order};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Change,
}

pub type StoreHandle = Rc<RefCell<PlaylistStore>>;

/// One playlist row as the UI shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub has_picture: bool,
    pub display: String,
    /// 0 until the track was decoded once.
    pub duration: f64,
}

/// Everything a renderer needs, read in one go after a change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Base playlist order.
    pub tracks: Vec<TrackRow>,
    /// Play order as base indices; differs from `0..tracks.len()` while shuffled.
    pub order: Vec<usize>,
    /// Base index of the current track.
    pub current: Option<usize>,
    pub playing: bool,
    pub paused: bool,
    pub loading: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub position: f64,
    pub duration: f64,
    pub fraction: f64,
    pub volume: f32,
    pub last_error: Option<String>,
}

/// The playlist and everything about what is playing.
///
/// Mutated only from the handler installed by [`PlaylistStore::register`];
/// everything else reads through the accessors.
pub struct PlaylistStore {
    songs: Vec<Song>,
    /// Present exactly while shuffle is on.
    shuffle_view: Option<Vec<usize>>,
    /// Position in the active ordering (the shuffle view when present).
    current: usize,
    playing: bool,
    paused: bool,
    shuffle: bool,
    repeat: RepeatMode,
    next_id: u64,
    engine: EngineHandle,
    prefs: Box<dyn PreferenceStore>,
    rng: StdRng,
    listeners: Vec<Sender<StoreEvent>>,
    last_error: Option<String>,
}

impl PlaylistStore {
    pub fn new(
        initial: Vec<TrackInfo>,
        engine: EngineHandle,
        prefs: Box<dyn PreferenceStore>,
    ) -> Self {
        Self::with_rng(initial, engine, prefs, StdRng::from_entropy())
    }

    pub fn with_rng(
        initial: Vec<TrackInfo>,
        engine: EngineHandle,
        prefs: Box<dyn PreferenceStore>,
        rng: StdRng,
    ) -> Self {
        let saved = Preferences::load(prefs.as_ref());
        let mut store = Self {
            songs: Vec::new(),
            shuffle_view: None,
            current: 0,
            playing: false,
            paused: false,
            shuffle: saved.shuffle,
            repeat: saved.repeat,
            next_id: 1,
            engine,
            prefs,
            rng,
            listeners: Vec::new(),
            last_error: None,
        };
        store.append(&initial);
        if store.shuffle {
            store.shuffle_view = Some(shuffled_order(store.songs.len(), 0, &mut store.rng));
        }
        debug!(
            "store ready: {} tracks, shuffle={}, repeat={}",
            store.songs.len(),
            store.shuffle,
            store.repeat
        );
        store
    }

    /// Install the store's action handler on `dispatcher`.
    pub fn register(store: &StoreHandle, dispatcher: &Dispatcher<Action>) -> DispatchToken {
        let store = Rc::clone(store);
        dispatcher.register(move |_, action| {
            let mut store = store
                .try_borrow_mut()
                .map_err(|e| DispatchError::Handler(format!("playlist store busy: {e}")))?;
            store.handle(action);
            Ok(())
        })
    }

    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    fn handle(&mut self, action: &Action) {
        match action {
            Action::AddSong(track) => self.add_songs(std::slice::from_ref(track)),
            Action::AddSongs(tracks) => self.add_songs(tracks),
            Action::RemoveSong(index) => self.remove_song(*index),
            Action::RemoveAll => self.remove_all(),
            Action::TogglePlay => self.toggle_play(),
            Action::Stop => self.stop(),
            Action::ToggleShuffle => self.toggle_shuffle(),
            Action::CycleRepeat => self.cycle_repeat(),
            Action::Previous => self.step(-1),
            Action::Next => self.step(1),
            Action::Select(index) => self.select(*index),
            Action::SetCurrentTime => {}
            Action::SeekTo(seconds) => self.seek(*seconds),
            Action::SetVolume(volume) => self.engine.borrow_mut().set_volume(*volume),
            Action::DecodeFinished { ticket, result } => self.decode_finished(*ticket, result),
            Action::SegmentEnded { voice } => self.segment_ended(*voice),
        }
        self.emit_change();
    }

    fn emit_change(&mut self) {
        self.listeners
            .retain(|tx| tx.send(StoreEvent::Change).is_ok());
    }

    // -- accessors ---------------------------------------------------------

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Songs in base order.
    #[cfg(test)]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Base indices in the order playback walks through them.
    pub fn active_order(&self) -> Vec<usize> {
        match &self.shuffle_view {
            Some(view) => view.clone(),
            None => (0..self.songs.len()).collect(),
        }
    }

    pub fn shuffle_view(&self) -> Option<&[usize]> {
        self.shuffle_view.as_deref()
    }

    /// Position of the current track in the active ordering.
    pub fn current_index(&self) -> Option<usize> {
        (!self.songs.is_empty()).then_some(self.current)
    }

    pub fn current(&self) -> Option<&Song> {
        self.current_base().map(|base| &self.songs[base])
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[cfg(test)]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.engine.borrow().volume()
    }

    pub fn current_time(&self) -> f64 {
        let now = self.engine.borrow().now();
        self.current().map_or(0.0, |song| song.current_time(now))
    }

    pub fn snapshot(&self) -> Snapshot {
        let now = self.engine.borrow().now();
        let current = self.current();
        Snapshot {
            tracks: self
                .songs
                .iter()
                .map(|song| {
                    let info = song.info();
                    TrackRow {
                        id: song.id(),
                        title: info.title.clone(),
                        artist: info.artist.clone(),
                        album: info.album.clone(),
                        has_picture: info.picture.is_some(),
                        display: info.display(),
                        duration: song.duration(),
                    }
                })
                .collect(),
            order: self.active_order(),
            current: self.current_base(),
            playing: self.playing,
            paused: self.paused,
            loading: current.is_some_and(Song::is_waiting_for_decode),
            shuffle: self.shuffle,
            repeat: self.repeat,
            position: current.map_or(0.0, |s| s.current_time(now).min(s.duration().max(0.0))),
            duration: current.map_or(0.0, Song::duration),
            fraction: current.map_or(0.0, |s| s.played_fraction(now)),
            volume: self.volume(),
            last_error: self.last_error.clone(),
        }
    }

    // -- ordering helpers --------------------------------------------------

    fn current_base(&self) -> Option<usize> {
        if self.songs.is_empty() {
            return None;
        }
        match &self.shuffle_view {
            Some(view) => view.get(self.current).copied(),
            None => Some(self.current),
        }
    }

    fn active_position(&self, base: usize) -> Option<usize> {
        match &self.shuffle_view {
            Some(view) => view.iter().position(|&i| i == base),
            None => (base < self.songs.len()).then_some(base),
        }
    }

    fn engine(&self) -> EngineHandle {
        Rc::clone(&self.engine)
    }

    fn fail(&mut self, err: PlaybackError) {
        warn!("playback failed: {err}");
        self.last_error = Some(err.to_string());
    }

    // -- playback ----------------------------------------------------------

    fn play_current(&mut self) {
        let Some(base) = self.current_base() else {
            return;
        };
        let engine = self.engine();
        let result = self.songs[base].play(&mut *engine.borrow_mut(), None, None);
        match result {
            Ok(_) => {
                self.playing = true;
                self.paused = false;
                self.last_error = None;
            }
            Err(e) => {
                self.playing = false;
                self.fail(e);
            }
        }
    }

    fn pause_current(&mut self) {
        if let Some(base) = self.current_base() {
            let engine = self.engine();
            self.songs[base].pause(&mut *engine.borrow_mut());
        }
        self.playing = false;
        self.paused = true;
    }

    fn stop_current(&mut self) {
        if let Some(base) = self.current_base() {
            let engine = self.engine();
            self.songs[base].stop(&mut *engine.borrow_mut());
        }
        self.playing = false;
        self.paused = false;
    }

    fn toggle_play(&mut self) {
        if self.songs.is_empty() {
            return;
        }
        if self.playing {
            self.pause_current();
        } else {
            self.play_current();
        }
    }

    fn stop(&mut self) {
        if !self.songs.is_empty() {
            self.stop_current();
        }
    }

    /// Move through the active ordering with wraparound, in either direction.
    fn step(&mut self, delta: isize) {
        let len = self.songs.len();
        if len == 0 {
            return;
        }
        self.stop_current();
        self.current = (self.current as isize + delta).rem_euclid(len as isize) as usize;
        self.play_current();
    }

    fn select(&mut self, base: usize) {
        let Some(position) = self.active_position(base) else {
            return;
        };
        self.stop_current();
        self.current = position;
        self.play_current();
    }

    fn seek(&mut self, seconds: f64) {
        let Some(base) = self.current_base() else {
            return;
        };
        let engine = self.engine();
        let result = self.songs[base].seek(&mut *engine.borrow_mut(), seconds);
        if let Err(e) = result {
            self.playing = false;
            self.fail(e);
        }
    }

    // -- playlist editing --------------------------------------------------

    /// Add `tracks` to the base order. While shuffled each one lands in a
    /// random slot after the current track, or anywhere when the list was
    /// empty.
    fn append(&mut self, tracks: &[TrackInfo]) {
        let first_slot = if self.songs.is_empty() {
            0
        } else {
            self.current + 1
        };
        for track in tracks {
            let id = TrackId(self.next_id);
            self.next_id += 1;
            self.songs.push(Song::new(id, track.clone()));
            if let Some(view) = self.shuffle_view.as_mut() {
                let slot = self.rng.gen_range(first_slot..=view.len());
                view.insert(slot, self.songs.len() - 1);
            }
        }
    }

    fn add_songs(&mut self, tracks: &[TrackInfo]) {
        let was_empty = self.songs.is_empty();
        self.append(tracks);
        if was_empty {
            self.current = 0;
        }
        info!("added {} track(s), {} total", tracks.len(), self.songs.len());
    }

    fn remove_song(&mut self, index: usize) {
        if index >= self.songs.len() {
            return;
        }
        let current_base = self.current_base();

        let engine = self.engine();
        let mut song = self.songs.remove(index);
        song.unload(&mut *engine.borrow_mut());
        if let Some(view) = self.shuffle_view.as_mut() {
            remove_position(view, index);
        }

        let len = self.songs.len();
        if len == 0 {
            self.current = 0;
            self.playing = false;
            self.paused = false;
            return;
        }

        match current_base {
            Some(base) if base == index => {
                self.playing = false;
                self.paused = false;
                self.current = self.current.min(len - 1);
            }
            Some(base) => {
                let base = if base > index { base - 1 } else { base };
                self.current = self.active_position(base).unwrap_or(0);
            }
            None => self.current = 0,
        }
        debug!("removed {} (base {index}), {len} left", song.id());
    }

    fn remove_all(&mut self) {
        let engine = self.engine();
        {
            let mut engine = engine.borrow_mut();
            for song in &mut self.songs {
                song.unload(&mut *engine);
            }
        }
        self.songs.clear();
        self.shuffle_view = self.shuffle.then(Vec::new);
        self.current = 0;
        self.playing = false;
        self.paused = false;
        info!("playlist cleared");
    }

    // -- modes -------------------------------------------------------------

    fn toggle_shuffle(&mut self) {
        let current_base = self.current_base();
        self.shuffle = !self.shuffle;

        if self.shuffle {
            let pinned = current_base.unwrap_or(0);
            self.shuffle_view = Some(shuffled_order(self.songs.len(), pinned, &mut self.rng));
            self.current = 0;
        } else {
            self.shuffle_view = None;
            self.current = current_base.unwrap_or(0);
        }

        let value = if self.shuffle { "true" } else { "false" };
        if let Err(e) = self.prefs.set(SHUFFLE_KEY, value) {
            warn!("{e}");
        }
    }

    fn cycle_repeat(&mut self) {
        self.repeat = self.repeat.next();
        if let Err(e) = self.prefs.set(REPEAT_KEY, self.repeat.as_pref()) {
            warn!("{e}");
        }
    }

    // -- engine feedback ---------------------------------------------------

    fn decode_finished(
        &mut self,
        ticket: DecodeTicket,
        result: &Result<Arc<DecodedAudio>, DecodeError>,
    ) {
        let Some(pos) = self.songs.iter().position(|s| s.id() == ticket.track) else {
            debug!("dropping decode for removed {}", ticket.track);
            return;
        };
        let engine = self.engine();
        let outcome = self.songs[pos].resolve_decode(&mut *engine.borrow_mut(), ticket, result);
        if let Err(e) = outcome {
            if self.current_base() == Some(pos) {
                self.playing = false;
            }
            self.fail(e);
        }
    }

    fn segment_ended(&mut self, voice: VoiceId) {
        let Some(base) = self.songs.iter_mut().position(|s| s.finish(voice)) else {
            return;
        };
        if self.current_base() != Some(base) {
            return;
        }

        let len = self.songs.len();
        match self.repeat {
            RepeatMode::One => self.play_current(),
            RepeatMode::All => self.step(1),
            RepeatMode::Off if self.current + 1 < len => self.step(1),
            RepeatMode::Off => {
                self.playing = false;
                self.paused = false;
                debug!("end of playlist");
            }
        }
    }
}
