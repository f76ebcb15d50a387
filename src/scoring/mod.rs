// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Next-track selection.
//!
//! Candidates are ranked by a weighted sum in which energy match dominates.
//! Genre variety, rating, popularity and harmonic fit only break ties
//! between tracks in the same tempo band. Remaining ties go to the lowest
//! browse position, so selection is fully deterministic.

pub mod energy;

pub use energy::{BpmBand, EnergyCurve, EventType, VenueType};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{KeyMode, Track, TrackCatalog, TrackId};
use crate::music::TempoTolerance;
use crate::session::SessionContext;

/// Genres this far back in history earn no variety bonus
pub const GENRE_LOOKBACK: usize = 3;

const SCORE_EPSILON: f64 = 1e-9;

/// Relative weight of each scoring term
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_energy_weight")]
    pub energy: f64,
    #[serde(default = "default_genre_weight")]
    pub genre_variety: f64,
    #[serde(default = "default_rating_weight")]
    pub rating_per_star: f64,
    #[serde(default = "default_popularity_weight")]
    pub popularity_per_play: f64,
    #[serde(default = "default_popularity_cap")]
    pub popularity_cap: f64,
    #[serde(default = "default_harmonic_weight")]
    pub harmonic: f64,
}

fn default_energy_weight() -> f64 {
    10.0
}
fn default_genre_weight() -> f64 {
    1.0
}
fn default_rating_weight() -> f64 {
    0.1
}
fn default_popularity_weight() -> f64 {
    0.005
}
fn default_popularity_cap() -> f64 {
    0.3
}
fn default_harmonic_weight() -> f64 {
    0.5
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            energy: default_energy_weight(),
            genre_variety: default_genre_weight(),
            rating_per_star: default_rating_weight(),
            popularity_per_play: default_popularity_weight(),
            popularity_cap: default_popularity_cap(),
            harmonic: default_harmonic_weight(),
        }
    }
}

impl ScoringWeights {
    /// Largest total the tie-breaking terms can contribute
    pub fn max_tie_breaker(&self) -> f64 {
        self.genre_variety + self.rating_per_star * 5.0 + self.popularity_cap + self.harmonic
    }

    /// Energy must outweigh every tie-breaker combined across one band step
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            self.energy,
            self.genre_variety,
            self.rating_per_star,
            self.popularity_per_play,
            self.popularity_cap,
            self.harmonic,
        ];
        if values.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("scoring weights must be finite and non-negative".to_string());
        }
        let band_step = BpmBand::Mid.energy_estimate() - BpmBand::Calm.energy_estimate();
        if self.energy * band_step <= self.max_tie_breaker() {
            return Err(format!(
                "energy weight {} too small: one band step is worth {:.2}, tie-breakers up to {:.2}",
                self.energy,
                self.energy * band_step,
                self.max_tie_breaker()
            ));
        }
        Ok(())
    }
}

/// Per-term explanation of a score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    /// 1 - |estimate - target|, 0 when the tempo is unknown
    pub energy_match: f64,
    pub genre_bonus: f64,
    pub rating_bonus: f64,
    pub popularity_bonus: f64,
    pub harmonic_bonus: f64,
    pub total: f64,
}

/// Ranks candidate tracks against the session context.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityScorer {
    weights: ScoringWeights,
    tolerance: TempoTolerance,
    key_mode: KeyMode,
}

impl CompatibilityScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            weights,
            ..Self::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: TempoTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_key_mode(mut self, key_mode: KeyMode) -> Self {
        self.key_mode = key_mode;
        self
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one candidate with every term spelled out
    pub fn breakdown(
        &self,
        candidate: &Track,
        current: Option<&Track>,
        context: &SessionContext,
    ) -> ScoreBreakdown {
        let target = context.target_energy();
        let energy_match = candidate
            .tempo_bpm
            .map(|bpm| 1.0 - (BpmBand::for_bpm(bpm).energy_estimate() - target).abs())
            .unwrap_or(0.0);

        let recent = context.recent_genres(GENRE_LOOKBACK);
        let genre_bonus = match &candidate.genre {
            Some(genre) if !recent.iter().any(|g| g.eq_ignore_ascii_case(genre)) => {
                self.weights.genre_variety
            }
            _ => 0.0,
        };

        let rating_bonus = f64::from(candidate.rating) * self.weights.rating_per_star;
        let popularity_bonus = (f64::from(candidate.play_count) * self.weights.popularity_per_play)
            .min(self.weights.popularity_cap);

        let harmonic_bonus = match (current.and_then(|t| t.key), candidate.key) {
            (Some(a), Some(b)) if a.is_compatible(b) => self.weights.harmonic,
            _ => 0.0,
        };

        let total = energy_match * self.weights.energy
            + genre_bonus
            + rating_bonus
            + popularity_bonus
            + harmonic_bonus;

        ScoreBreakdown {
            energy_match,
            genre_bonus,
            rating_bonus,
            popularity_bonus,
            harmonic_bonus,
            total,
        }
    }

    /// Higher is better
    pub fn score(&self, candidate: &Track, current: Option<&Track>, context: &SessionContext) -> f64 {
        self.breakdown(candidate, current, context).total
    }

    /// Best reachable candidate not excluded and not the current track.
    pub fn select_next<'a, I>(
        &self,
        candidates: I,
        current: Option<&Track>,
        context: &SessionContext,
        exclude: &HashSet<TrackId>,
    ) -> Option<&'a Track>
    where
        I: IntoIterator<Item = &'a Track>,
    {
        let mut best: Option<(&'a Track, usize, f64)> = None;

        for candidate in candidates {
            let Some(position) = candidate.catalog_position else {
                continue;
            };
            if exclude.contains(&candidate.id) || current.map_or(false, |c| c.id == candidate.id) {
                continue;
            }
            let score = self.score(candidate, current, context);
            let better = match best {
                None => true,
                Some((_, best_position, best_score)) => {
                    score > best_score + SCORE_EPSILON
                        || ((score - best_score).abs() <= SCORE_EPSILON && position < best_position)
                }
            };
            if better {
                best = Some((candidate, position, score));
            }
        }

        best.map(|(track, _, score)| {
            debug!("Selected {} (score {:.3})", track.id, score);
            track
        })
    }

    /// Full selection pipeline over a catalog: compatible tracks first,
    /// then anything reachable, then `None`.
    pub fn select_from_catalog<'a>(
        &self,
        catalog: &'a TrackCatalog,
        current: Option<&Track>,
        context: &SessionContext,
        exclude: &HashSet<TrackId>,
    ) -> Option<&'a Track> {
        if let Some(current) = current {
            let compatible = catalog.compatible_with(current, self.tolerance, self.key_mode);
            if let Some(track) = self.select_next(compatible, Some(current), context, exclude) {
                return Some(track);
            }
            debug!("No compatible candidate for {}, falling back to full catalog", current.id);
        }
        self.select_next(catalog.reachable(), current, context, exclude)
    }
}
