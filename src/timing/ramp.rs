// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Crossfade ramp.
//!
//! A crossfade is a fixed number of discrete crossfader moves spread evenly
//! over a duration, moving linearly from one deck's side to the other's.

use std::time::Duration;

use crate::deck::DeckId;

/// Crossfader position that gives a deck full volume.
/// Decks A and C sit on the left (0.0), B and D on the right (1.0).
pub fn crossfader_side(deck: DeckId) -> f32 {
    match deck {
        DeckId::A | DeckId::C => 0.0,
        DeckId::B | DeckId::D => 1.0,
    }
}

/// Configuration for a crossfade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossfadeRamp {
    /// Starting crossfader position
    pub from: f32,
    /// Final crossfader position
    pub to: f32,
    /// Number of discrete moves (at least 1)
    pub steps: u32,
    /// Total duration of the ramp
    pub duration: Duration,
}

impl CrossfadeRamp {
    pub fn new(from: f32, to: f32, steps: u32, duration: Duration) -> Self {
        Self {
            from: from.clamp(0.0, 1.0),
            to: to.clamp(0.0, 1.0),
            steps: steps.max(1),
            duration,
        }
    }

    /// Ramp that hands the mix from one deck to another
    pub fn between(from: DeckId, to: DeckId, steps: u32, duration: Duration) -> Self {
        Self::new(crossfader_side(from), crossfader_side(to), steps, duration)
    }

    /// Wait before each move
    pub fn step_delay(&self) -> Duration {
        self.duration / self.steps
    }

    /// Position after move `step` (1-based); step 0 is the start
    pub fn position(&self, step: u32) -> f32 {
        let progress = step.min(self.steps) as f32 / self.steps as f32;
        self.from + (self.to - self.from) * progress
    }

    /// Positions of every move, in order, ending exactly at `to`
    pub fn positions(&self) -> impl Iterator<Item = f32> + '_ {
        (1..=self.steps).map(move |step| self.position(step))
    }
}
