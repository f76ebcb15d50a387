// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Catalog sources.
//!
//! A source yields track records in the same order the console's browse
//! list shows them. Parsing the console's own collection file is someone
//! else's job; this module accepts an already-exported list.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CatalogParseError;

/// One exported track record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TrackRecord {
    /// File path; the track's identity
    pub path: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    /// Tempo in BPM, if analyzed
    #[serde(default)]
    pub bpm: Option<f64>,
    /// Musical key in any supported notation
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    /// Star rating (0-5)
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub play_count: Option<u32>,
    /// Explicit browse-list row, overriding source order
    #[serde(default)]
    pub position: Option<usize>,
}

impl TrackRecord {
    /// Minimal record with just a path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = Some(bpm);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_play_count(mut self, play_count: u32) -> Self {
        self.play_count = Some(play_count);
        self
    }

    pub fn with_artist_title(mut self, artist: impl Into<String>, title: impl Into<String>) -> Self {
        self.artist = artist.into();
        self.title = title.into();
        self
    }
}

/// Anything that can yield the ordered track list
pub trait TrackSource {
    fn records(&self) -> Result<Vec<TrackRecord>, CatalogParseError>;
}

impl TrackSource for Vec<TrackRecord> {
    fn records(&self) -> Result<Vec<TrackRecord>, CatalogParseError> {
        Ok(self.clone())
    }
}

impl TrackSource for [TrackRecord] {
    fn records(&self) -> Result<Vec<TrackRecord>, CatalogParseError> {
        Ok(self.to_vec())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordDocument {
    List(Vec<TrackRecord>),
    Wrapped { tracks: Vec<TrackRecord> },
}

/// A YAML (or JSON) export on disk, either a bare list or `tracks: [...]`.
#[derive(Debug, Clone)]
pub struct FileTrackSource {
    path: PathBuf,
}

impl FileTrackSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse records from a YAML or JSON string
    pub fn parse(text: &str) -> Result<Vec<TrackRecord>, CatalogParseError> {
        let document: RecordDocument =
            serde_yaml::from_str(text).map_err(|e| CatalogParseError::Format(e.to_string()))?;
        Ok(match document {
            RecordDocument::List(records) => records,
            RecordDocument::Wrapped { tracks } => tracks,
        })
    }
}

impl TrackSource for FileTrackSource {
    fn records(&self) -> Result<Vec<TrackRecord>, CatalogParseError> {
        let text = fs::read_to_string(&self.path).map_err(|source| CatalogParseError::Io {
            path: self.path.clone(),
            source,
        })?;
        Self::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_bare_list() {
        let yaml = r#"
- path: /music/one.mp3
  artist: Alpha
  title: One
  bpm: 122.0
  key: 8A
  genre: House
  rating: 4
  play_count: 12
- path: /music/two.mp3
"#;
        let records = FileTrackSource::parse(yaml).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bpm, Some(122.0));
        assert_eq!(records[0].key.as_deref(), Some("8A"));
        assert_eq!(records[1].bpm, None);
        assert_eq!(records[1].artist, "");
    }

    #[test]
    fn test_parse_wrapped_json() {
        let json = r#"{"tracks": [{"path": "a.flac", "bpm": 128, "position": 3}]}"#;
        let records = FileTrackSource::parse(json).unwrap();
        assert_eq!(records[0].position, Some(3));
        assert_eq!(records[0].bpm, Some(128.0));
    }

    #[test]
    fn test_parse_garbage_is_format_error() {
        let err = FileTrackSource::parse("tracks: [").unwrap_err();
        assert!(matches!(err, CatalogParseError::Format(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let source = FileTrackSource::new(dir.path().join("missing.yaml"));
        assert!(matches!(source.records(), Err(CatalogParseError::Io { .. })));
    }

    #[test]
    fn test_file_source_reads_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracks.yaml");
        fs::write(&path, "- path: x.mp3\n  bpm: 100\n").unwrap();
        let records = FileTrackSource::new(&path).records().unwrap();
        assert_eq!(records, vec![TrackRecord::new("x.mp3").with_bpm(100.0)]);
    }
}
