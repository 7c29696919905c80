use super::load::{default_config_path, default_state_dir, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_mixtape_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("MIXTAPE_CONFIG_PATH", "/tmp/mixtape-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/mixtape-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("mixtape")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("mixtape")
            .join("config.toml")
    );
}

#[test]
fn state_files_default_under_xdg_state_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_STATE_HOME", "/tmp/xdg-state");

    let base = std::path::PathBuf::from("/tmp/xdg-state").join("mixtape");
    assert_eq!(default_state_dir().unwrap(), base);
    assert_eq!(
        PrefsSettings::default().resolved_path().unwrap(),
        base.join("prefs.toml")
    );
    assert_eq!(
        LogSettings::default().resolved_file().unwrap(),
        base.join("mixtape.log")
    );

    let explicit = PrefsSettings {
        path: Some("/elsewhere/p.toml".into()),
    };
    assert_eq!(
        explicit.resolved_path().unwrap(),
        std::path::PathBuf::from("/elsewhere/p.toml")
    );
}

#[test]
fn state_dir_falls_back_to_home_local_state() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_STATE_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_state_dir().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/state/mixtape")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
volume = 0.5

[controls]
scrub_seconds = 9
volume_step = 0.1

[ui]
header_text = "hello"
tick_ms = 100
now_playing_time_fields = ["elapsed", "remaining"]
now_playing_time_separator = " | "

[library]
mime_types = ["audio/flac"]
recursive = false
include_hidden = true
follow_links = false
max_depth = 3

[prefs]
path = "/tmp/mixtape-prefs.toml"

[log]
level = "debug"
file = "/tmp/mixtape.log"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("MIXTAPE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("MIXTAPE__AUDIO__VOLUME");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.volume, 0.5);
    assert_eq!(s.controls.scrub_seconds, 9);
    assert_eq!(s.controls.volume_step, 0.1);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.tick_ms, 100);
    assert_eq!(
        s.ui.now_playing_time_fields,
        vec![TimeField::Elapsed, TimeField::Remaining]
    );
    assert_eq!(s.ui.now_playing_time_separator, " | ");
    assert_eq!(s.library.mime_types, vec!["audio/flac".to_string()]);
    assert!(!s.library.recursive);
    assert!(s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.library.max_depth, Some(3));
    assert_eq!(
        s.prefs.path,
        Some(std::path::PathBuf::from("/tmp/mixtape-prefs.toml"))
    );
    assert_eq!(s.log.level, "debug");
    assert!(s.validate().is_ok());
}

#[test]
fn settings_missing_file_uses_defaults() {
    let _lock = env_lock();
    let dir = tempfile::tempdir().unwrap();
    let _g1 = EnvGuard::set(
        "MIXTAPE_CONFIG_PATH",
        dir.path().join("absent.toml").to_str().unwrap(),
    );
    let _g2 = EnvGuard::remove("MIXTAPE__AUDIO__VOLUME");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.volume, 0.8);
    assert_eq!(
        s.library.mime_types,
        vec!["audio/mp3".to_string(), "audio/mpeg".to_string()]
    );
    assert_eq!(s.log.level, "info");
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
volume = 0.9
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("MIXTAPE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("MIXTAPE__AUDIO__VOLUME", "0.3");

    let s = Settings::load().unwrap();
    assert!((s.audio.volume - 0.3).abs() < 1e-6);
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.audio.volume = 1.5;
    assert!(s.validate().is_err());

    s = Settings::default();
    s.ui.tick_ms = 0;
    assert!(s.validate().is_err());

    s = Settings::default();
    s.library.mime_types = vec!["  ".into()];
    assert!(s.validate().is_err());
}
