use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::debug;
use lofty::picture::PictureType;
use lofty::prelude::*;

use crate::audio::AudioSource;
use crate::song::TrackInfo;

/// Embedded art above this size is ignored.
const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

fn non_empty(value: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `data:<mime>;base64,<payload>`; JPEG when the tag does not say.
pub fn picture_data_uri(mime: Option<&str>, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime.unwrap_or("image/jpeg"), STANDARD.encode(data))
}

/// Read title, artist, album and cover art.
///
/// Never fails: a file without readable tags gets the "Unknown" defaults.
pub fn read_track_info(path: &Path) -> TrackInfo {
    let mut info = TrackInfo::new(AudioSource::new(path));

    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            debug!("no tags for {}: {e}", path.display());
            return info;
        }
    };
    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return info;
    };

    if let Some(title) = non_empty(tag.title()) {
        info.title = title;
    }
    if let Some(artist) = non_empty(tag.artist()) {
        info.artist = artist;
    }
    info.album = non_empty(tag.album());

    // Prefer the front cover, otherwise the first picture.
    let pictures = tag.pictures();
    let picture = pictures
        .iter()
        .find(|p| matches!(p.pic_type(), PictureType::CoverFront))
        .or_else(|| pictures.first());
    info.picture = picture
        .filter(|p| p.data().len() <= MAX_PICTURE_BYTES)
        .map(|p| picture_data_uri(p.mime_type().map(|m| m.as_str()), p.data()));

    info
}
