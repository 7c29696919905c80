use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;

use super::repeat::RepeatMode;

pub const SHUFFLE_KEY: &str = "shuffle";
pub const REPEAT_KEY: &str = "repeat";

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("cannot write preferences to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot encode preferences: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// String key/value storage for the few flags that survive a restart.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: BTreeMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept in a flat TOML table, rewritten on every change.
#[derive(Debug)]
pub struct TomlPreferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl TomlPreferences {
    /// Load `path`. A missing or unreadable file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text).unwrap_or_else(|e| {
                warn!("ignoring corrupt preferences {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("cannot read preferences {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), PrefsError> {
        let io_err = |source| PrefsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let text = toml::to_string(&self.values)?;
        fs::write(&self.path, text).map_err(io_err)
    }
}

impl PreferenceStore for TomlPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

/// The flags the playlist store restores at startup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Preferences {
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl Preferences {
    /// Anything missing or unrecognized falls back to off.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        Self {
            shuffle: store.get(SHUFFLE_KEY).as_deref() == Some("true"),
            repeat: store
                .get(REPEAT_KEY)
                .as_deref()
                .and_then(RepeatMode::from_pref)
                .unwrap_or_default(),
        }
    }
}
