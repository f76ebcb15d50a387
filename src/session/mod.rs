// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Autonomous session.
//!
//! [`SessionContext`] tracks what the session is for and what has played.
//! [`SessionOrchestrator`] runs the select → navigate → load → play →
//! crossfade cycle, publishing [`SessionEvent`]s as it goes.

pub mod events;
pub mod feed;
pub mod orchestrator;

pub use events::{EventBus, SessionEvent};
pub use feed::{ChannelFeed, ContextFeed, ContextOverride, NoOverrides, OverrideFileFeed};
pub use orchestrator::{CycleSettings, EndReason, SessionOrchestrator, SessionSummary, StopHandle};

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::catalog::{Track, TrackId};
use crate::scoring::{EnergyCurve, EventType, VenueType};

/// Default anti-repetition window
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Where the session is on its energy curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    WarmingUp,
    Building,
    Peak,
    WindingDown,
    Stopped,
}

impl SessionPhase {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionPhase::Building | SessionPhase::Peak | SessionPhase::WindingDown
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::WarmingUp => "warming up",
            SessionPhase::Building => "building",
            SessionPhase::Peak => "peak",
            SessionPhase::WindingDown => "winding down",
            SessionPhase::Stopped => "stopped",
        };
        write!(f, "{}", name)
    }
}

/// One played track
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub track_id: TrackId,
    pub genre: Option<String>,
    pub played_at: Instant,
}

/// Session parameters and bounded play history
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub venue: VenueType,
    pub event: EventType,
    pub start_time: Option<Instant>,
    pub target_duration: Duration,
    pub energy_curve: EnergyCurve,
    custom_curve: bool,
    history: VecDeque<HistoryEntry>,
    history_window: usize,
    stopped: bool,
}

impl SessionContext {
    /// A not-yet-started session. Without a custom curve the venue/event
    /// preset is used.
    pub fn new(
        venue: VenueType,
        event: EventType,
        target_duration: Duration,
        energy_curve: Option<EnergyCurve>,
    ) -> Self {
        let custom_curve = energy_curve.is_some();
        Self {
            venue,
            event,
            start_time: None,
            target_duration,
            energy_curve: energy_curve.unwrap_or_else(|| EnergyCurve::preset(venue, event)),
            custom_curve,
            history: VecDeque::new(),
            history_window: DEFAULT_HISTORY_WINDOW,
            stopped: false,
        }
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    /// Start the clock
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
        self.stopped = false;
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Elapsed fraction of the target duration, clamped to 0.0-1.0
    pub fn progress(&self) -> f64 {
        if self.target_duration.is_zero() {
            return if self.start_time.is_some() { 1.0 } else { 0.0 };
        }
        (self.elapsed().as_secs_f64() / self.target_duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.start_time.is_some() && self.elapsed() >= self.target_duration
    }

    /// Target energy right now
    pub fn target_energy(&self) -> f64 {
        self.energy_curve.energy_at(self.progress())
    }

    /// Phase derived from elapsed time and the curve shape
    pub fn phase(&self) -> SessionPhase {
        if self.stopped || self.is_complete() {
            return SessionPhase::Stopped;
        }
        if self.start_time.is_none() {
            return SessionPhase::Idle;
        }
        let progress = self.progress();
        if progress < 0.1 {
            return SessionPhase::WarmingUp;
        }
        let energy = self.energy_curve.energy_at(progress);
        if energy >= 0.9 * self.energy_curve.peak() {
            return SessionPhase::Peak;
        }
        let ahead = self.energy_curve.energy_at((progress + 0.05).min(1.0));
        if ahead >= energy {
            SessionPhase::Building
        } else {
            SessionPhase::WindingDown
        }
    }

    /// Change venue; the preset curve follows unless a custom one was given
    pub fn set_venue(&mut self, venue: VenueType) {
        self.venue = venue;
        self.refresh_curve();
    }

    pub fn set_event(&mut self, event: EventType) {
        self.event = event;
        self.refresh_curve();
    }

    pub fn set_target_duration(&mut self, target_duration: Duration) {
        self.target_duration = target_duration;
    }

    fn refresh_curve(&mut self) {
        if !self.custom_curve {
            self.energy_curve = EnergyCurve::preset(self.venue, self.event);
        }
    }

    /// Append a played track, dropping the oldest beyond the window
    pub fn record(&mut self, track: &Track) {
        self.history.push_back(HistoryEntry {
            track_id: track.id.clone(),
            genre: track.genre.clone(),
            played_at: Instant::now(),
        });
        while self.history.len() > self.history_window {
            self.history.pop_front();
        }
    }

    /// Oldest first
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.history.iter()
    }

    pub fn last_played(&self) -> Option<&TrackId> {
        self.history.back().map(|entry| &entry.track_id)
    }

    /// Ids inside the anti-repetition window
    pub fn recent_ids(&self) -> HashSet<TrackId> {
        self.history.iter().map(|e| e.track_id.clone()).collect()
    }

    /// Genres of the last `count` played tracks, newest first
    pub fn recent_genres(&self, count: usize) -> Vec<String> {
        self.history
            .iter()
            .rev()
            .take(count)
            .filter_map(|e| e.genre.clone())
            .collect()
    }
}
