// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Energy curves and tempo bands.
//!
//! A session's energy curve is a list of target energies (0.0-1.0) spread
//! evenly across its planned duration. Energy maps to one of three tempo
//! bands, and a track's tempo maps back to an energy estimate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of venue the session plays in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VenueType {
    #[default]
    Club,
    Bar,
    Lounge,
    Festival,
    Private,
}

/// Kind of event the session serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Opening,
    #[default]
    PeakTime,
    Closing,
    Wedding,
    Corporate,
    Party,
}

/// Tempo band a target energy asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BpmBand {
    Calm,
    Mid,
    Peak,
}

impl BpmBand {
    /// Upper BPM bound of the calm band (exclusive)
    pub const CALM_MAX_BPM: f64 = 115.0;
    /// Upper BPM bound of the mid band (exclusive)
    pub const MID_MAX_BPM: f64 = 127.0;

    /// Band a tempo falls into
    pub fn for_bpm(bpm: f64) -> Self {
        if bpm < Self::CALM_MAX_BPM {
            BpmBand::Calm
        } else if bpm < Self::MID_MAX_BPM {
            BpmBand::Mid
        } else {
            BpmBand::Peak
        }
    }

    /// Energy a track in this band is assumed to carry
    pub fn energy_estimate(self) -> f64 {
        match self {
            BpmBand::Calm => 0.2,
            BpmBand::Mid => 0.5,
            BpmBand::Peak => 0.8,
        }
    }
}

impl fmt::Display for BpmBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BpmBand::Calm => "calm",
            BpmBand::Mid => "mid",
            BpmBand::Peak => "peak",
        };
        write!(f, "{}", name)
    }
}

/// Target energy over the session timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnergyCurve {
    points: Vec<f64>,
}

impl EnergyCurve {
    /// Energy used when a curve has no points
    pub const NEUTRAL: f64 = 0.5;

    pub fn new(points: Vec<f64>) -> Self {
        Self {
            points: points.into_iter().map(|p| p.clamp(0.0, 1.0)).collect(),
        }
    }

    /// Same energy for the whole session
    pub fn flat(energy: f64) -> Self {
        Self::new(vec![energy])
    }

    /// Preset shape for a venue, adjusted for the event
    pub fn preset(venue: VenueType, event: EventType) -> Self {
        let base: Vec<f64> = match venue {
            VenueType::Club => vec![0.3, 0.45, 0.6, 0.75, 0.9, 0.95, 0.85, 0.7],
            VenueType::Bar => vec![0.3, 0.4, 0.5, 0.6, 0.65, 0.6, 0.5],
            VenueType::Lounge => vec![0.2, 0.25, 0.3, 0.35, 0.3, 0.25],
            VenueType::Festival => vec![0.5, 0.65, 0.8, 0.9, 0.95, 0.95, 0.9],
            VenueType::Private => vec![0.3, 0.4, 0.55, 0.7, 0.75, 0.6, 0.45],
        };
        let adjusted: Vec<f64> = match event {
            EventType::PeakTime => base,
            EventType::Opening => base.iter().map(|e| e * 0.7).collect(),
            EventType::Closing => base.iter().rev().copied().collect(),
            EventType::Wedding => {
                let mut points: Vec<f64> = base.iter().map(|e| e * 0.85).collect();
                points.insert(0, 0.2);
                points
            }
            EventType::Corporate => base.iter().map(|e| (e * 0.6).min(0.5)).collect(),
            EventType::Party => base.iter().map(|e| e + 0.05).collect(),
        };
        Self::new(adjusted)
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Highest point on the curve
    pub fn peak(&self) -> f64 {
        self.points
            .iter()
            .copied()
            .reduce(f64::max)
            .unwrap_or(Self::NEUTRAL)
    }

    /// Linearly interpolated target energy at `progress` (0.0-1.0)
    pub fn energy_at(&self, progress: f64) -> f64 {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self.points.len() {
            0 => Self::NEUTRAL,
            1 => self.points[0],
            n => {
                let scaled = progress * (n - 1) as f64;
                let lower = scaled.floor() as usize;
                let upper = (lower + 1).min(n - 1);
                let fraction = scaled - lower as f64;
                self.points[lower] + (self.points[upper] - self.points[lower]) * fraction
            }
        }
    }
}

impl Default for EnergyCurve {
    fn default() -> Self {
        Self::preset(VenueType::default(), EventType::default())
    }
}
