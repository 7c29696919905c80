use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, TryRecvError};

use log::debug;

use crate::app::App;
use crate::audio::EngineHandle;
use crate::config::LibrarySettings;
use crate::dispatcher::{DispatchError, Dispatcher};
use crate::library::{ImportEvent, spawn_import};
use crate::store::{Actions, PlaylistStore, PreferenceStore, Snapshot, StoreEvent, StoreHandle};

/// The store, its dispatcher and every channel feeding it, wired together.
pub struct Session {
    pub actions: Actions,
    pub store: StoreHandle,
    pub engine: EngineHandle,
    changes: Receiver<StoreEvent>,
    imports: Vec<Receiver<ImportEvent>>,
}

impl Session {
    pub fn new(engine: EngineHandle, prefs: Box<dyn PreferenceStore>) -> Self {
        let store = Rc::new(RefCell::new(PlaylistStore::new(
            Vec::new(),
            Rc::clone(&engine),
            prefs,
        )));
        let dispatcher = Rc::new(Dispatcher::new());
        PlaylistStore::register(&store, &dispatcher);
        let changes = store.borrow_mut().subscribe();
        Self {
            actions: Actions::new(dispatcher),
            store,
            engine,
            changes,
            imports: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.borrow().snapshot()
    }

    /// Start importing `paths` in the background.
    pub fn import(&mut self, paths: Vec<PathBuf>, settings: &LibrarySettings) {
        debug!("importing {paths:?}");
        self.imports.push(spawn_import(paths, settings.clone()));
    }

    #[cfg(test)]
    pub fn is_importing(&self) -> bool {
        !self.imports.is_empty()
    }

    /// Move finished imports and engine events into the store.
    ///
    /// Returns true when the store reported a change since the last call.
    pub fn pump(&mut self, app: &mut App) -> Result<bool, DispatchError> {
        let mut batch = Vec::new();
        self.imports.retain(|rx| loop {
            match rx.try_recv() {
                Ok(ImportEvent::Track(track)) => batch.push(track),
                Ok(ImportEvent::Done { root, count }) => {
                    app.set_status(format!("added {count} track(s) from {}", root.display()));
                }
                Err(TryRecvError::Empty) => break true,
                Err(TryRecvError::Disconnected) => break false,
            }
        });
        if !batch.is_empty() {
            self.actions.add_songs(batch)?;
        }

        self.actions.forward_engine_events(&self.engine)?;

        Ok(self.changes.try_iter().count() > 0)
    }
}
