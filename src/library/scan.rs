use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::LibrarySettings;

/// MIME types a file extension is known under, canonical name first.
pub fn mime_type_for(path: &Path) -> &'static [&'static str] {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp3") => &["audio/mpeg", "audio/mp3"],
        Some("flac") => &["audio/flac", "audio/x-flac"],
        Some("wav") => &["audio/wav", "audio/x-wav", "audio/wave"],
        Some("ogg" | "oga") => &["audio/ogg", "audio/vorbis"],
        Some("m4a" | "mp4") => &["audio/mp4", "audio/aac"],
        Some("aac") => &["audio/aac"],
        _ => &[],
    }
}

/// Whether `path` has one of the configured MIME types. `audio/*` accepts
/// every known audio type.
pub fn is_wanted(path: &Path, settings: &LibrarySettings) -> bool {
    let known = mime_type_for(path);
    if known.is_empty() {
        return false;
    }

    settings
        .mime_types
        .iter()
        .map(|m| m.trim().to_ascii_lowercase())
        .any(|m| m == "audio/*" || known.iter().any(|k| *k == m))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Audio files at or under `root`, sorted by path (case-insensitive).
///
/// A file given directly is kept when its type matches, even if hidden.
/// Anything that is not wanted is skipped without complaint.
pub fn collect_audio_files(root: &Path, settings: &LibrarySettings) -> Vec<PathBuf> {
    if root.is_file() {
        return if is_wanted(root, settings) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    let mut walker = WalkDir::new(root).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_wanted(p, settings))
        .collect();

    files.sort_by_key(|p| p.to_string_lossy().to_lowercase());
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect()
    }

    #[test]
    fn mime_type_for_maps_extensions_case_insensitive() {
        assert_eq!(mime_type_for(Path::new("/tmp/a.mp3"))[0], "audio/mpeg");
        assert_eq!(mime_type_for(Path::new("/tmp/a.MP3"))[0], "audio/mpeg");
        assert_eq!(mime_type_for(Path::new("/tmp/a.flac"))[0], "audio/flac");
        assert!(mime_type_for(Path::new("/tmp/a.txt")).is_empty());
        assert!(mime_type_for(Path::new("/tmp/a")).is_empty());
    }

    #[test]
    fn default_settings_only_accept_mp3() {
        let settings = LibrarySettings::default();
        assert!(is_wanted(Path::new("/tmp/a.mp3"), &settings));
        assert!(!is_wanted(Path::new("/tmp/a.ogg"), &settings));
        assert!(!is_wanted(Path::new("/tmp/a.txt"), &settings));
    }

    #[test]
    fn audio_wildcard_accepts_every_known_type() {
        let settings = LibrarySettings {
            mime_types: vec!["Audio/*".into()],
            ..LibrarySettings::default()
        };
        assert!(is_wanted(Path::new("/tmp/a.ogg"), &settings));
        assert!(is_wanted(Path::new("/tmp/a.wav"), &settings));
        assert!(!is_wanted(Path::new("/tmp/a.png"), &settings));
    }

    #[test]
    fn collect_filters_and_sorts_case_insensitive() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
        fs::write(dir.path().join("A.mp3"), b"not a real mp3").unwrap();
        fs::write(dir.path().join("c.ogg"), b"wrong type").unwrap();
        fs::write(dir.path().join("d.txt"), b"ignore me").unwrap();

        let files = collect_audio_files(dir.path(), &LibrarySettings::default());
        assert_eq!(names(&files), vec!["A.mp3", "b.MP3"]);
    }

    #[test]
    fn collect_accepts_a_single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(".hidden.mp3");
        fs::write(&file, b"x").unwrap();

        assert_eq!(collect_audio_files(&file, &LibrarySettings::default()), vec![file]);
        assert!(collect_audio_files(&dir.path().join("gone.mp3"), &LibrarySettings::default()).is_empty());
    }

    #[test]
    fn collect_skips_hidden_entries_by_default() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
        fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();
        let secret = dir.path().join(".secret");
        fs::create_dir_all(&secret).unwrap();
        fs::write(secret.join("inside.mp3"), b"not real").unwrap();

        let files = collect_audio_files(dir.path(), &LibrarySettings::default());
        assert_eq!(names(&files), vec!["visible.mp3"]);

        let settings = LibrarySettings {
            include_hidden: true,
            ..LibrarySettings::default()
        };
        assert_eq!(collect_audio_files(dir.path(), &settings).len(), 3);
    }

    #[test]
    fn collect_respects_recursive_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("child.mp3"), b"not real").unwrap();

        let settings = LibrarySettings {
            recursive: false,
            ..LibrarySettings::default()
        };
        let files = collect_audio_files(dir.path(), &settings);
        assert_eq!(names(&files), vec!["root.mp3"]);
    }

    #[test]
    fn collect_respects_max_depth() {
        let dir = tempdir().unwrap();
        let d1 = dir.path().join("d1");
        let d2 = d1.join("d2");
        fs::create_dir_all(&d2).unwrap();
        fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
        fs::write(d1.join("one.mp3"), b"not real").unwrap();
        fs::write(d2.join("two.mp3"), b"not real").unwrap();

        // WalkDir depth counts root as 0, children as 1, grandchildren as 2...
        // With max_depth=2 we should see root + d1/*, but not d1/d2/*.
        let settings = LibrarySettings {
            max_depth: Some(2),
            ..LibrarySettings::default()
        };
        let files = names(&collect_audio_files(dir.path(), &settings));
        assert!(files.contains(&"root.mp3".to_string()));
        assert!(files.contains(&"one.mp3".to_string()));
        assert!(!files.contains(&"two.mp3".to_string()));
    }
}
