//! Track catalog
//!
//! Ordered, immutable track list loaded from a TOML playlist file. The
//! coordinator holds only the current track id; all lookups and
//! next/previous navigation go through the catalog. Navigation wraps:
//! after the last track the next track is the first, and vice versa.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A single catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Duration in "M:SS" format
    pub duration: String,
    /// Path or URL of the media resource, handed verbatim to the transport
    pub file: String,
}

impl Track {
    /// Duration in whole seconds, parsed from the "M:SS" field
    pub fn duration_seconds(&self) -> Result<u32> {
        duration_to_seconds(&self.duration)
    }
}

/// Playlist file shape: a list of `[[tracks]]` tables
#[derive(Debug, Deserialize)]
struct PlaylistFile {
    tracks: Vec<Track>,
}

/// Ordered immutable track list
#[derive(Debug, Clone)]
pub struct TrackCatalog {
    tracks: Vec<Track>,
}

impl TrackCatalog {
    /// Build a catalog from an already-validated track list
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        let catalog = Self { tracks };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load and validate a playlist TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Catalog(format!("failed to read {}: {}", path.display(), e))
        })?;
        let playlist: PlaylistFile = toml::from_str(&contents)
            .map_err(|e| Error::Catalog(format!("failed to parse {}: {}", path.display(), e)))?;

        let catalog = Self::new(playlist.tracks)?;
        info!("Loaded playlist: {} tracks", catalog.len());
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        if self.tracks.is_empty() {
            return Err(Error::Catalog("playlist has no tracks".into()));
        }
        for track in &self.tracks {
            if track.id.is_empty() || track.title.is_empty() || track.file.is_empty() {
                return Err(Error::Catalog(format!(
                    "track '{}' is missing required fields",
                    track.id
                )));
            }
            duration_to_seconds(&track.duration)?;
        }
        let mut ids: Vec<&str> = self.tracks.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.tracks.len() {
            return Err(Error::Catalog("duplicate track ids in playlist".into()));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    pub fn first_id(&self) -> Option<&str> {
        self.tracks.first().map(|t| t.id.as_str())
    }

    fn position(&self, track_id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == track_id)
    }

    /// Id of the track after `track_id`, wrapping from last to first
    pub fn next_id(&self, track_id: &str) -> Option<&str> {
        let index = self.position(track_id)?;
        let next = (index + 1) % self.tracks.len();
        Some(self.tracks[next].id.as_str())
    }

    /// Id of the track before `track_id`, wrapping from first to last
    pub fn previous_id(&self, track_id: &str) -> Option<&str> {
        let index = self.position(track_id)?;
        let previous = (index + self.tracks.len() - 1) % self.tracks.len();
        Some(self.tracks[previous].id.as_str())
    }
}

/// Parse a "M:SS" duration string into whole seconds
///
/// Round-trips exactly with [`seconds_to_duration`] for any u32.
pub fn duration_to_seconds(duration: &str) -> Result<u32> {
    let (minutes, seconds) = duration
        .split_once(':')
        .ok_or_else(|| Error::Catalog(format!("invalid duration '{}'", duration)))?;

    let minutes: u32 = minutes
        .parse()
        .map_err(|_| Error::Catalog(format!("invalid duration '{}'", duration)))?;
    if seconds.len() != 2 {
        return Err(Error::Catalog(format!("invalid duration '{}'", duration)));
    }
    let seconds: u32 = seconds
        .parse()
        .map_err(|_| Error::Catalog(format!("invalid duration '{}'", duration)))?;
    if seconds >= 60 {
        return Err(Error::Catalog(format!("invalid duration '{}'", duration)));
    }

    Ok(minutes * 60 + seconds)
}

/// Format whole seconds as a "M:SS" duration string
pub fn seconds_to_duration(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tracks() -> Vec<Track> {
        vec![
            Track {
                id: "1".into(),
                title: "Track 1".into(),
                artist: "Artist 1".into(),
                duration: "2:18".into(),
                file: "/music/track1.mp3".into(),
            },
            Track {
                id: "2".into(),
                title: "Track 2".into(),
                artist: "Artist 2".into(),
                duration: "3:10".into(),
                file: "/music/track2.mp3".into(),
            },
            Track {
                id: "3".into(),
                title: "Track 3".into(),
                artist: "Artist 3".into(),
                duration: "3:39".into(),
                file: "/music/track3.mp3".into(),
            },
        ]
    }

    #[test]
    fn test_duration_round_trip() {
        assert_eq!(duration_to_seconds("2:18").unwrap(), 138);
        assert_eq!(duration_to_seconds("0:00").unwrap(), 0);
        assert_eq!(duration_to_seconds("10:05").unwrap(), 605);
        assert_eq!(seconds_to_duration(138), "2:18");
        assert_eq!(seconds_to_duration(605), "10:05");
        for s in [0u32, 1, 59, 60, 61, 138, 3599, 3600] {
            assert_eq!(duration_to_seconds(&seconds_to_duration(s)).unwrap(), s);
        }
    }

    #[test]
    fn test_malformed_durations_rejected() {
        assert!(duration_to_seconds("218").is_err());
        assert!(duration_to_seconds("2:61").is_err());
        assert!(duration_to_seconds("2:5").is_err());
        assert!(duration_to_seconds("a:bc").is_err());
    }

    #[test]
    fn test_navigation_wraps() {
        let catalog = TrackCatalog::new(test_tracks()).unwrap();
        assert_eq!(catalog.next_id("1"), Some("2"));
        assert_eq!(catalog.next_id("3"), Some("1"));
        assert_eq!(catalog.previous_id("1"), Some("3"));
        assert_eq!(catalog.previous_id("2"), Some("1"));
        assert_eq!(catalog.next_id("missing"), None);
    }

    #[test]
    fn test_empty_playlist_rejected() {
        assert!(TrackCatalog::new(vec![]).is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut tracks = test_tracks();
        tracks[2].id = "1".into();
        assert!(TrackCatalog::new(tracks).is_err());
    }

    #[test]
    fn test_load_from_toml() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[tracks]]
id = "1"
title = "Track 1"
artist = "Artist 1"
duration = "2:18"
file = "/music/track1.mp3"

[[tracks]]
id = "2"
title = "Track 2"
artist = "Artist 2"
duration = "3:10"
file = "/music/track2.mp3"
"#
        )
        .unwrap();

        let catalog = TrackCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.first_id(), Some("1"));
        assert_eq!(catalog.get("2").unwrap().duration_seconds().unwrap(), 190);
    }
}
