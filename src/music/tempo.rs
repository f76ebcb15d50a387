// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tempo relationships between tracks.

/// Tempo ratios that mix musically (double/half time, triplet feels).
pub const MIX_RATIOS: [f64; 6] = [2.0, 0.5, 1.5, 0.75, 1.33, 0.67];

/// Default direct tolerance in BPM
pub const DEFAULT_BPM_TOLERANCE: f64 = 6.0;

/// Default absolute tolerance around each ratio target, in BPM
pub const DEFAULT_RATIO_TOLERANCE: f64 = 2.0;

/// How a candidate tempo relates to a reference tempo
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TempoRelation {
    /// Within the direct tolerance
    Direct,
    /// Close to `reference * ratio`
    Ratio(f64),
}

/// Tempo matching tolerances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoTolerance {
    /// Allowed direct difference in BPM
    pub bpm: f64,
    /// Allowed difference from each ratio target in BPM
    pub ratio: f64,
}

impl TempoTolerance {
    pub fn new(bpm: f64, ratio: f64) -> Self {
        Self {
            bpm: bpm.abs(),
            ratio: ratio.abs(),
        }
    }

    /// Classify how `candidate` relates to `reference`, if at all.
    pub fn relation(&self, reference: f64, candidate: f64) -> Option<TempoRelation> {
        if !is_valid_bpm(reference) || !is_valid_bpm(candidate) {
            return None;
        }
        if (candidate - reference).abs() <= self.bpm {
            return Some(TempoRelation::Direct);
        }
        MIX_RATIOS
            .iter()
            .find(|ratio| (candidate - reference * **ratio).abs() <= self.ratio)
            .map(|ratio| TempoRelation::Ratio(*ratio))
    }

    /// True when the two tempos can be mixed
    pub fn is_compatible(&self, reference: f64, candidate: f64) -> bool {
        self.relation(reference, candidate).is_some()
    }
}

impl Default for TempoTolerance {
    fn default() -> Self {
        Self::new(DEFAULT_BPM_TOLERANCE, DEFAULT_RATIO_TOLERANCE)
    }
}

/// Tempo values that mean "not analyzed"
pub fn is_valid_bpm(bpm: f64) -> bool {
    bpm.is_finite() && bpm > 0.0
}
