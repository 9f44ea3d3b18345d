//! The persisted track catalog.
//!
//! A flat YAML document with a `tracks` list. Ids are catalog-assigned and
//! monotonically increasing; a missing catalog file loads as an empty
//! catalog. The player only ever borrows read-only snapshots of records,
//! all mutation goes through the methods here.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One track in the user's stash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackRecord {
    pub id: u64,
    pub artist: String,
    pub title: String,
    pub album: String,
    /// Track length in seconds, 0 when unknown.
    pub length: u64,
    pub file_size: u64,
    /// Streaming source in the object store.
    pub url: String,
    /// Where the material was originally taken from.
    pub source_url: String,
    /// Best-effort resume hint in seconds. Not honored for streamed input.
    pub playback_position: u64,
}

impl TrackRecord {
    /// "Artist - Title" one-liner used by list output and the TUI.
    pub fn display(&self) -> String {
        match (self.artist.trim(), self.title.trim()) {
            ("", t) => t.to_string(),
            (a, "") => a.to_string(),
            (a, t) => format!("{} - {}", a, t),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub tracks: Vec<TrackRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self { tracks: Vec::new() }
    }

    /// Load the catalog from `path`. A missing or empty file yields an
    /// empty catalog rather than an error.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let data = match fs::read_to_string(path) {
            Ok(d) => d,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new());
            }
            Err(err) => return Err(err.into()),
        };
        if data.trim().is_empty() {
            return Ok(Self::new());
        }
        let catalog: Catalog = serde_yaml::from_str(&data)?;
        Ok(catalog)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_yaml::to_string(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Add a track, assigning the next free id (max + 1, starting at 1).
    /// Returns the assigned id.
    pub fn add(&mut self, mut track: TrackRecord) -> u64 {
        let next_id = self.tracks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        track.id = next_id;
        self.tracks.push(track);
        next_id
    }

    pub fn track_by_id(&self, id: u64) -> Result<&TrackRecord, Error> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .ok_or(Error::NotFound(id))
    }

    pub fn delete_by_id(&mut self, id: u64) -> Result<(), Error> {
        let pos = self
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::NotFound(id))?;
        self.tracks.remove(pos);
        Ok(())
    }

    pub fn update(&mut self, updated: TrackRecord) -> Result<(), Error> {
        let slot = self
            .tracks
            .iter_mut()
            .find(|t| t.id == updated.id)
            .ok_or(Error::NotFound(updated.id))?;
        *slot = updated;
        Ok(())
    }

    pub fn update_position(&mut self, id: u64, position: u64) -> Result<(), Error> {
        let slot = self
            .tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Error::NotFound(id))?;
        slot.playback_position = position;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_track() -> TrackRecord {
        TrackRecord {
            id: 0,
            artist: "Test Artist".to_string(),
            title: "Test Title".to_string(),
            album: "Test Album".to_string(),
            length: 180,
            file_size: 4_321_000,
            url: "https://blobs.example.net/music/test.mp3".to_string(),
            source_url: "https://example.com/source".to_string(),
            playback_position: 0,
        }
    }

    #[test]
    fn add_assigns_monotonically_increasing_ids() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.add(sample_track()), 1);
        assert_eq!(catalog.add(sample_track()), 2);

        // Deleting the highest id frees it for reuse; lower holes do not shift ids.
        catalog.delete_by_id(1).unwrap();
        assert_eq!(catalog.add(sample_track()), 3);
    }

    #[test]
    fn load_missing_file_yields_empty_catalog() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::load(&dir.path().join("does-not-exist.yaml")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn load_empty_file_yields_empty_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, "").unwrap();
        let catalog = Catalog::load(&path).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn round_trips_through_yaml_including_zero_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");

        let mut catalog = Catalog::new();
        let mut with_zeroes = sample_track();
        with_zeroes.length = 0;
        with_zeroes.file_size = 0;
        with_zeroes.album = String::new();
        catalog.add(with_zeroes);
        catalog.add(sample_track());
        catalog.save(&path).unwrap();

        let reloaded = Catalog::load(&path).unwrap();
        assert_eq!(reloaded.tracks, catalog.tracks);
        assert_eq!(reloaded.tracks[0].length, 0);
        assert_eq!(reloaded.tracks[0].album, "");
    }

    #[test]
    fn missing_yaml_fields_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(
            &path,
            "tracks:\n- id: 7\n  artist: A\n  title: T\n  url: http://x/y.mp3\n",
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        let track = catalog.track_by_id(7).unwrap();
        assert_eq!(track.album, "");
        assert_eq!(track.length, 0);
        assert_eq!(track.playback_position, 0);
    }

    #[test]
    fn track_by_id_reports_not_found() {
        let catalog = Catalog::new();
        assert!(matches!(catalog.track_by_id(42), Err(Error::NotFound(42))));
    }

    #[test]
    fn update_position_changes_only_the_hint() {
        let mut catalog = Catalog::new();
        let id = catalog.add(sample_track());
        catalog.update_position(id, 95).unwrap();

        let track = catalog.track_by_id(id).unwrap();
        assert_eq!(track.playback_position, 95);
        assert_eq!(track.length, 180);
    }

    #[test]
    fn display_joins_artist_and_title() {
        let mut track = sample_track();
        assert_eq!(track.display(), "Test Artist - Test Title");
        track.artist = String::new();
        assert_eq!(track.display(), "Test Title");
    }
}
