//! Tag and duration probing for local audio files.
//!
//! Uploads read artist/title/album from the file's tags; when a file has no
//! usable tags the `Artist - Title` convention in the filename is the
//! fallback.

use std::path::Path;
use std::time::Duration;

use lofty::prelude::{AudioFile, ItemKey, TaggedFileExt};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: String,
    pub title: String,
    pub album: String,
}

#[derive(Debug, Clone, Copy)]
pub struct FileProbe {
    pub size: u64,
    pub duration: Duration,
}

/// Read tags from `path`, falling back to filename parsing when the file
/// cannot be probed or carries no usable tag.
pub fn read_tags(path: &Path) -> TrackTags {
    let Ok(tagged) = lofty::read_from_path(path) else {
        return fallback_tags(path);
    };

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return fallback_tags(path);
    };

    let mut tags = fallback_tags(path);
    if let Some(v) = tag.get_string(&ItemKey::TrackArtist) {
        if !v.trim().is_empty() {
            tags.artist = v.trim().to_string();
        }
    }
    if let Some(v) = tag.get_string(&ItemKey::TrackTitle) {
        if !v.trim().is_empty() {
            tags.title = v.trim().to_string();
        }
    }
    if let Some(v) = tag.get_string(&ItemKey::AlbumTitle) {
        if !v.trim().is_empty() {
            tags.album = v.trim().to_string();
        }
    }
    tags
}

/// File size plus decoded duration.
pub fn probe_file(path: &Path) -> Result<FileProbe, Error> {
    let size = std::fs::metadata(path)?.len();
    let tagged = lofty::read_from_path(path)
        .map_err(|err| Error::Decode(format!("{}: {}", path.display(), err)))?;
    Ok(FileProbe {
        size,
        duration: tagged.properties().duration(),
    })
}

/// Parse `Artist - Title` out of the file stem; anything unparseable
/// becomes the title with an unknown artist.
fn fallback_tags(path: &Path) -> TrackTags {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN");

    if let Some((artist, title)) = stem.split_once(" - ") {
        let artist = artist.trim();
        let title = title.trim();
        if !artist.is_empty() && !title.is_empty() {
            return TrackTags {
                artist: artist.to_string(),
                title: title.to_string(),
                album: String::new(),
            };
        }
    }

    TrackTags {
        artist: "Unknown Artist".to_string(),
        title: stem.to_string(),
        album: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_splits_artist_dash_title() {
        let tags = fallback_tags(Path::new("/music/Miles Davis - So What.mp3"));
        assert_eq!(tags.artist, "Miles Davis");
        assert_eq!(tags.title, "So What");
        assert_eq!(tags.album, "");
    }

    #[test]
    fn fallback_keeps_whole_stem_as_title_without_separator() {
        let tags = fallback_tags(Path::new("/music/bootleg_take3.mp3"));
        assert_eq!(tags.artist, "Unknown Artist");
        assert_eq!(tags.title, "bootleg_take3");
    }

    #[test]
    fn fallback_joins_extra_separators_into_title() {
        let tags = fallback_tags(Path::new("/music/A - B - C.mp3"));
        assert_eq!(tags.artist, "A");
        assert_eq!(tags.title, "B - C");
    }

    #[test]
    fn read_tags_on_untagged_file_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Someone - Something.mp3");
        std::fs::write(&path, b"not a real mp3").unwrap();

        let tags = read_tags(&path);
        assert_eq!(tags.artist, "Someone");
        assert_eq!(tags.title, "Something");
    }

    #[test]
    fn probe_file_fails_cleanly_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.mp3");
        std::fs::write(&path, b"not a real mp3").unwrap();

        assert!(probe_file(&path).is_err());
    }
}
