// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Track catalog.
//!
//! Holds every track's metadata and its row in the console's browse list.
//! The catalog is built once and then read-only; share it behind an `Arc`.

pub mod source;

pub use source::{FileTrackSource, TrackRecord, TrackSource};

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CatalogParseError;
use crate::music::{is_valid_bpm, HarmonicKey, TempoTolerance};

/// Stable track identity, derived from the file path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Normalise a path into an id
    pub fn from_path(path: &str) -> Self {
        TrackId(path.trim().replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A track known to the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub artist: String,
    pub title: String,
    pub genre: Option<String>,
    /// 0-5 stars
    pub rating: u8,
    pub play_count: u32,
    pub tempo_bpm: Option<f64>,
    pub key: Option<HarmonicKey>,
    /// Row in the browse list; `None` means navigation cannot reach it
    pub catalog_position: Option<usize>,
}

impl Track {
    /// "Artist - Title", falling back to the id
    pub fn display_name(&self) -> String {
        match (self.artist.is_empty(), self.title.is_empty()) {
            (false, false) => format!("{} - {}", self.artist, self.title),
            (true, false) => self.title.clone(),
            _ => self.id.to_string(),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.catalog_position.is_some()
    }

    fn from_record(record: TrackRecord, index: usize) -> Result<Self, CatalogParseError> {
        if record.path.trim().is_empty() {
            return Err(CatalogParseError::Malformed {
                index,
                reason: "empty path".to_string(),
            });
        }
        let key = record.key.as_deref().and_then(|raw| {
            let parsed = HarmonicKey::parse(raw);
            if parsed.is_none() {
                debug!("Unrecognised key '{}' on {}", raw, record.path);
            }
            parsed
        });
        Ok(Self {
            id: TrackId::from_path(&record.path),
            artist: record.artist.trim().to_string(),
            title: record.title.trim().to_string(),
            genre: record
                .genre
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty()),
            rating: record.rating.unwrap_or(0).min(5),
            play_count: record.play_count.unwrap_or(0),
            tempo_bpm: record.bpm.filter(|bpm| is_valid_bpm(*bpm)),
            key,
            catalog_position: None,
        })
    }
}

/// How key compatibility combines with tempo compatibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// Ignore keys
    TempoOnly,
    /// Tempo must match and keys must not clash (unknown keys never clash)
    #[default]
    Intersect,
    /// Either tempo or key matches
    Union,
}

/// Summary of a catalog load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub analyzed: usize,
    pub keyed: usize,
    pub unreachable: usize,
    pub duplicates_skipped: usize,
    pub min_bpm: Option<f64>,
    pub max_bpm: Option<f64>,
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tracks ({} analyzed, {} keyed, {} unreachable, {} duplicates skipped)",
            self.total, self.analyzed, self.keyed, self.unreachable, self.duplicates_skipped
        )?;
        if let (Some(min), Some(max)) = (self.min_bpm, self.max_bpm) {
            write!(f, ", {:.1}-{:.1} BPM", min, max)?;
        }
        Ok(())
    }
}

/// Track metadata plus the id ↔ browse position mapping
#[derive(Debug, Clone, Default)]
pub struct TrackCatalog {
    tracks: Vec<Track>,
    by_id: HashMap<TrackId, usize>,
    by_position: BTreeMap<usize, usize>,
    stats: CatalogStats,
}

impl TrackCatalog {
    /// Build the catalog from a source. Zero tracks is an error.
    pub fn load<S: TrackSource + ?Sized>(source: &S) -> Result<Self, CatalogParseError> {
        let records = source.records()?;
        let mut catalog = TrackCatalog::default();
        let mut next_row = 0usize;

        for (index, record) in records.into_iter().enumerate() {
            let explicit = record.position;
            let mut track = Track::from_record(record, index)?;

            if catalog.by_id.contains_key(&track.id) {
                warn!("Skipping duplicate catalog entry {}", track.id);
                catalog.stats.duplicates_skipped += 1;
                continue;
            }

            let row = explicit.unwrap_or(next_row);
            let after = row.checked_add(1).ok_or_else(|| CatalogParseError::Malformed {
                index,
                reason: format!("position {} out of range", row),
            })?;
            next_row = next_row.max(after);
            if catalog.by_position.contains_key(&row) {
                warn!("Position {} already taken; {} is unreachable", row, track.id);
            } else {
                track.catalog_position = Some(row);
                catalog.by_position.insert(row, catalog.tracks.len());
            }

            catalog.by_id.insert(track.id.clone(), catalog.tracks.len());
            catalog.tracks.push(track);
        }

        if catalog.tracks.is_empty() {
            return Err(CatalogParseError::Empty);
        }

        catalog.stats = catalog.compute_stats(catalog.stats.duplicates_skipped);
        info!("Catalog loaded: {}", catalog.stats);
        Ok(catalog)
    }

    fn compute_stats(&self, duplicates_skipped: usize) -> CatalogStats {
        let tempos: Vec<f64> = self.tracks.iter().filter_map(|t| t.tempo_bpm).collect();
        CatalogStats {
            total: self.tracks.len(),
            analyzed: tempos.len(),
            keyed: self.tracks.iter().filter(|t| t.key.is_some()).count(),
            unreachable: self.tracks.iter().filter(|t| !t.is_reachable()).count(),
            duplicates_skipped,
            min_bpm: tempos.iter().copied().reduce(f64::min),
            max_bpm: tempos.iter().copied().reduce(f64::max),
        }
    }

    pub fn stats(&self) -> &CatalogStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// All tracks in source order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Reachable tracks in browse order
    pub fn reachable(&self) -> impl Iterator<Item = &Track> + '_ {
        self.by_position.values().map(move |&i| &self.tracks[i])
    }

    pub fn get(&self, id: &TrackId) -> Option<&Track> {
        self.by_id.get(id).map(|&i| &self.tracks[i])
    }

    pub fn get_by_position(&self, position: usize) -> Option<&Track> {
        self.by_position.get(&position).map(|&i| &self.tracks[i])
    }

    pub fn get_position(&self, id: &TrackId) -> Option<usize> {
        self.get(id).and_then(|t| t.catalog_position)
    }

    /// Tracks with a detected tempo inside `[min, max]`, in browse order
    pub fn find_by_bpm_range(&self, min: f64, max: f64) -> Vec<&Track> {
        self.tracks_in_order()
            .filter(|t| t.tempo_bpm.map_or(false, |bpm| bpm >= min && bpm <= max))
            .collect()
    }

    /// Tracks whose key has the given wheel code
    pub fn find_by_key(&self, code: u8) -> Vec<&Track> {
        self.tracks_in_order()
            .filter(|t| t.key.map_or(false, |k| k.code() == code))
            .collect()
    }

    /// Case-insensitive substring search over artist and title
    pub fn search(&self, text: &str) -> Vec<&Track> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.tracks_in_order()
            .filter(|t| {
                t.artist.to_lowercase().contains(&needle) || t.title.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Tracks that can follow `track`: tempo within `bpm_tolerance` or at a
    /// mixable ratio, combined with key compatibility per `mode`.
    pub fn compatible_with(
        &self,
        track: &Track,
        tolerance: TempoTolerance,
        mode: KeyMode,
    ) -> Vec<&Track> {
        self.tracks_in_order()
            .filter(|candidate| candidate.id != track.id)
            .filter(|candidate| {
                let tempo_ok = match (track.tempo_bpm, candidate.tempo_bpm) {
                    (Some(reference), Some(bpm)) => tolerance.is_compatible(reference, bpm),
                    _ => false,
                };
                let key_known = track.key.zip(candidate.key);
                match mode {
                    KeyMode::TempoOnly => tempo_ok,
                    KeyMode::Intersect => {
                        tempo_ok && key_known.map_or(true, |(a, b)| a.is_compatible(b))
                    }
                    KeyMode::Union => {
                        tempo_ok || key_known.map_or(false, |(a, b)| a.is_compatible(b))
                    }
                }
            })
            .collect()
    }

    /// Convenience form with the default ratio tolerance and key intersection
    pub fn compatible_with_bpm(&self, track: &Track, bpm_tolerance: f64) -> Vec<&Track> {
        let tolerance = TempoTolerance::new(bpm_tolerance, TempoTolerance::default().ratio);
        self.compatible_with(track, tolerance, KeyMode::Intersect)
    }

    // Reachable tracks first in browse order, then unreachable in source order.
    fn tracks_in_order(&self) -> impl Iterator<Item = &Track> + '_ {
        self.reachable()
            .chain(self.tracks.iter().filter(|t| !t.is_reachable()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_tracks() -> Vec<TrackRecord> {
        vec![
            TrackRecord::new("/music/a.mp3").with_bpm(120.0),
            TrackRecord::new("/music/b.mp3").with_bpm(124.0),
            TrackRecord::new("/music/c.mp3").with_bpm(180.0),
        ]
    }

    #[test]
    fn test_load_assigns_positions_in_order() {
        let catalog = TrackCatalog::load(&three_tracks()).unwrap();
        assert_eq!(catalog.len(), 3);
        for (pos, name) in ["a", "b", "c"].iter().enumerate() {
            let id = TrackId::from_path(&format!("/music/{}.mp3", name));
            assert_eq!(catalog.get_position(&id), Some(pos));
            assert_eq!(catalog.get_by_position(pos).unwrap().id, id);
        }
        assert!(catalog.get_by_position(3).is_none());
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        let err = TrackCatalog::load(&Vec::<TrackRecord>::new()).unwrap_err();
        assert!(matches!(err, CatalogParseError::Empty));
    }

    #[test]
    fn test_empty_path_is_malformed() {
        let records = vec![TrackRecord::new("/music/a.mp3"), TrackRecord::new("  ")];
        let err = TrackCatalog::load(&records).unwrap_err();
        assert!(matches!(err, CatalogParseError::Malformed { index: 1, .. }));
    }

    #[test]
    fn test_partial_records_are_kept() {
        let records = vec![
            TrackRecord::new("/music/a.mp3"),
            TrackRecord::new("/music/b.mp3").with_bpm(0.0).with_key("not a key"),
            TrackRecord::new("/music/c.mp3").with_bpm(126.0).with_key("Am").with_rating(9),
        ];
        let catalog = TrackCatalog::load(&records).unwrap();
        let stats = catalog.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.analyzed, 1);
        assert_eq!(stats.keyed, 1);
        assert_eq!(stats.min_bpm, Some(126.0));

        let b = catalog.get_by_position(1).unwrap();
        assert_eq!(b.tempo_bpm, None);
        assert_eq!(b.key, None);
        assert_eq!(catalog.get_by_position(2).unwrap().rating, 5);
    }

    #[test]
    fn test_untempoed_tracks_excluded_from_bpm_queries() {
        let records = vec![
            TrackRecord::new("/music/a.mp3"),
            TrackRecord::new("/music/b.mp3").with_bpm(124.0),
        ];
        let catalog = TrackCatalog::load(&records).unwrap();
        let hits = catalog.find_by_bpm_range(0.0, 1000.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].catalog_position, Some(1));
        assert!(catalog.get_by_position(0).is_some());
    }

    #[test]
    fn test_duplicates_and_position_collisions() {
        let mut clash = TrackRecord::new("/music/d.mp3");
        clash.position = Some(1);
        let records = vec![
            TrackRecord::new("/music/a.mp3"),
            TrackRecord::new("/music/b.mp3"),
            TrackRecord::new("/music\\a.mp3"),
            clash,
        ];
        let catalog = TrackCatalog::load(&records).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.stats().duplicates_skipped, 1);
        assert_eq!(catalog.stats().unreachable, 1);

        let d = catalog.get(&TrackId::from_path("/music/d.mp3")).unwrap();
        assert!(!d.is_reachable());
        assert_eq!(catalog.reachable().count(), 2);
    }

    #[test]
    fn test_explicit_positions() {
        let mut first = TrackRecord::new("/music/a.mp3");
        first.position = Some(10);
        let records = vec![first, TrackRecord::new("/music/b.mp3")];
        let catalog = TrackCatalog::load(&records).unwrap();
        assert_eq!(catalog.get_position(&TrackId::from_path("/music/a.mp3")), Some(10));
        assert_eq!(catalog.get_position(&TrackId::from_path("/music/b.mp3")), Some(11));
    }

    #[test]
    fn test_position_at_row_limit_is_malformed() {
        let mut last = TrackRecord::new("/music/a.mp3");
        last.position = Some(usize::MAX);
        let records = vec![last, TrackRecord::new("/music/b.mp3")];
        let err = TrackCatalog::load(&records).unwrap_err();
        assert!(matches!(err, CatalogParseError::Malformed { index: 0, .. }));
    }

    #[test]
    fn test_compatible_with_tempo_and_ratio() {
        let catalog = TrackCatalog::load(&three_tracks()).unwrap();
        let reference = catalog.get_by_position(0).unwrap();
        let hits: Vec<usize> = catalog
            .compatible_with_bpm(reference, 6.0)
            .iter()
            .filter_map(|t| t.catalog_position)
            .collect();
        // 124 is direct, 180 is the 1.5x ratio.
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn test_compatible_with_key_modes() {
        let records = vec![
            TrackRecord::new("/music/ref.mp3").with_bpm(120.0).with_key("8A"),
            TrackRecord::new("/music/same.mp3").with_bpm(121.0).with_key("9A"),
            TrackRecord::new("/music/clash.mp3").with_bpm(122.0).with_key("3B"),
            TrackRecord::new("/music/slow.mp3").with_bpm(97.0).with_key("8B"),
            TrackRecord::new("/music/nokey.mp3").with_bpm(119.0),
        ];
        let catalog = TrackCatalog::load(&records).unwrap();
        let reference = catalog.get_by_position(0).unwrap();
        let tol = TempoTolerance::default();
        let positions = |mode| -> Vec<usize> {
            catalog
                .compatible_with(reference, tol, mode)
                .iter()
                .filter_map(|t| t.catalog_position)
                .collect()
        };

        assert_eq!(positions(KeyMode::TempoOnly), vec![1, 2, 4]);
        assert_eq!(positions(KeyMode::Intersect), vec![1, 4]);
        assert_eq!(positions(KeyMode::Union), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_find_by_key_and_search() {
        let records = vec![
            TrackRecord::new("/music/a.mp3")
                .with_key("Am")
                .with_artist_title("Night Shift", "Lights"),
            TrackRecord::new("/music/b.mp3")
                .with_key("C")
                .with_artist_title("Day Crew", "Night Drive"),
        ];
        let catalog = TrackCatalog::load(&records).unwrap();
        let code = HarmonicKey::parse("8A").unwrap().code();
        assert_eq!(catalog.find_by_key(code).len(), 1);
        assert_eq!(catalog.search("night").len(), 2);
        assert_eq!(catalog.search("DRIVE").len(), 1);
        assert!(catalog.search("  ").is_empty());
        assert_eq!(catalog.tracks()[0].display_name(), "Night Shift - Lights");
    }
}
