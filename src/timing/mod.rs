// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing utilities.
//!
//! Crossfade ramps and the conversion of settle times into step
//! equivalents used by the navigation cost model.

pub mod ramp;

pub use ramp::{crossfader_side, CrossfadeRamp};

use std::time::Duration;

/// How many `step` intervals fit in `span`, rounded up. Zero step gives zero.
pub fn step_equivalents(span: Duration, step: Duration) -> u32 {
    if step.is_zero() {
        return 0;
    }
    let ratio = span.as_nanos().div_ceil(step.as_nanos());
    u32::try_from(ratio).unwrap_or(u32::MAX)
}
