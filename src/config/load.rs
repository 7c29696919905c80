use std::{env, path::PathBuf};

use super::schema::{LogSettings, PrefsSettings, Settings};

const APP_DIR: &str = "mixtape";

/// Configuration loading helpers.
///
/// Precedence is environment (`MIXTAPE__SECTION__KEY`) over the config file
/// over struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("MIXTAPE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err("audio.volume must be between 0.0 and 1.0".to_string());
        }
        if self.ui.tick_ms < 10 {
            return Err("ui.tick_ms must be >= 10".to_string());
        }
        if self.controls.volume_step <= 0.0 {
            return Err("controls.volume_step must be > 0".to_string());
        }
        if self.library.mime_types.iter().all(|m| m.trim().is_empty()) {
            return Err("library.mime_types must name at least one type".to_string());
        }
        Ok(())
    }
}

impl PrefsSettings {
    /// Configured path, or `mixtape/prefs.toml` under the state directory.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| default_state_dir().map(|d| d.join("prefs.toml")))
    }
}

impl LogSettings {
    /// Configured log file, or `mixtape/mixtape.log` under the state directory.
    pub fn resolved_file(&self) -> Option<PathBuf> {
        self.file
            .clone()
            .or_else(|| default_state_dir().map(|d| d.join("mixtape.log")))
    }
}

/// Resolve the config path from `MIXTAPE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("MIXTAPE_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// `$XDG_CONFIG_HOME/mixtape/config.toml`, or `~/.config/mixtape/config.toml`
/// when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join(APP_DIR).join("config.toml"))
}

/// `$XDG_STATE_HOME/mixtape`, or `~/.local/state/mixtape`.
pub fn default_state_dir() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
    };

    state_home.map(|d| d.join(APP_DIR))
}
