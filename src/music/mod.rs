// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities for track matching.
//!
//! This module provides the harmonic key wheel and the tempo relations
//! used to decide whether two tracks can be mixed.

pub mod key;
pub mod tempo;

pub use key::{HarmonicKey, Mode, Note};
pub use tempo::{is_valid_bpm, TempoRelation, TempoTolerance, MIX_RATIOS};
