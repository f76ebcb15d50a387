// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Deck transport state and verified command execution.
//!
//! The mixing console gives no read-back, so every deck's state here is the
//! executor's belief. Beliefs change only inside [`DeckCommandExecutor`],
//! after a command's signals went out and its settle delay elapsed.

pub mod executor;

pub use executor::{DeckCommandExecutor, ExecutorTiming};

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::catalog::TrackId;

/// Physical deck identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckId {
    A,
    B,
    C,
    D,
}

impl DeckId {
    /// All decks a console may expose
    pub const ALL: [DeckId; 4] = [DeckId::A, DeckId::B, DeckId::C, DeckId::D];
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeckId::A => "A",
            DeckId::B => "B",
            DeckId::C => "C",
            DeckId::D => "D",
        };
        write!(f, "{}", name)
    }
}

/// Transport state machine of one deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    Empty,
    LoadedPaused,
    LoadedPlaying,
}

/// Believed state of one deck
#[derive(Debug, Clone, PartialEq)]
pub struct DeckState {
    pub loaded: bool,
    pub playing: bool,
    pub loaded_track_id: Option<TrackId>,
    pub last_loaded_at: Option<Instant>,
    /// Channel fader level, 0.0-1.0
    pub level: f32,
}

impl DeckState {
    /// A deck with nothing loaded
    pub fn empty() -> Self {
        Self {
            loaded: false,
            playing: false,
            loaded_track_id: None,
            last_loaded_at: None,
            level: 0.0,
        }
    }

    /// Collapse the flags into the transport state machine
    pub fn transport(&self) -> TransportState {
        match (self.loaded, self.playing) {
            (false, _) => TransportState::Empty,
            (true, false) => TransportState::LoadedPaused,
            (true, true) => TransportState::LoadedPlaying,
        }
    }

    /// Time since the last load, if any
    pub fn since_load(&self) -> Option<Duration> {
        self.last_loaded_at.map(|at| at.elapsed())
    }

    fn apply(&mut self, transition: &Transition) {
        match transition {
            Transition::None => {}
            Transition::Loaded(track_id) => {
                self.loaded = true;
                self.playing = false;
                self.loaded_track_id = Some(track_id.clone());
                self.last_loaded_at = Some(Instant::now());
            }
            Transition::Playing => {
                if self.loaded {
                    self.playing = true;
                }
            }
            Transition::Paused => self.playing = false,
            Transition::Level(level) => self.level = level.clamp(0.0, 1.0),
        }
    }
}

impl Default for DeckState {
    fn default() -> Self {
        Self::empty()
    }
}

/// Belief update produced by a successful command action
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Signals went out but nothing is believed to have changed
    None,
    Loaded(TrackId),
    Playing,
    Paused,
    Level(f32),
}

/// Post-state a command is expected to produce. `None` fields are not checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectedState {
    pub loaded: Option<bool>,
    pub playing: Option<bool>,
    pub track_id: Option<TrackId>,
    pub level: Option<f32>,
}

impl ExpectedState {
    pub fn loaded_with(track_id: TrackId) -> Self {
        Self {
            loaded: Some(true),
            playing: Some(false),
            track_id: Some(track_id),
            level: None,
        }
    }

    pub fn playing() -> Self {
        Self {
            loaded: Some(true),
            playing: Some(true),
            ..Self::default()
        }
    }

    pub fn paused() -> Self {
        Self {
            playing: Some(false),
            ..Self::default()
        }
    }

    pub fn level(level: f32) -> Self {
        Self {
            level: Some(level.clamp(0.0, 1.0)),
            ..Self::default()
        }
    }

    /// Does `state` satisfy every checked field?
    pub fn matches(&self, state: &DeckState) -> bool {
        self.loaded.map_or(true, |v| v == state.loaded)
            && self.playing.map_or(true, |v| v == state.playing)
            && self
                .track_id
                .as_ref()
                .map_or(true, |id| state.loaded_track_id.as_ref() == Some(id))
            && self
                .level
                .map_or(true, |v| (v - state.level).abs() < 1.0 / 127.0)
    }
}

/// Logical command category; selects the settle delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Load,
    Play,
    Stop,
    Pause,
    Level,
    Crossfade,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Load => "load",
            CommandKind::Play => "play",
            CommandKind::Stop => "stop",
            CommandKind::Pause => "pause",
            CommandKind::Level => "level",
            CommandKind::Crossfade => "crossfade",
        };
        write!(f, "{}", name)
    }
}

/// Outcome classification of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Success,
    Timeout,
    Failed,
}

/// Record of one command invocation
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub deck: DeckId,
    pub kind: CommandKind,
    pub status: CommandStatus,
    pub verified: bool,
    pub retry_count: u32,
    pub elapsed_ms: u64,
    pub state_before: DeckState,
    pub state_after: DeckState,
    /// Human-readable cause when not successful
    pub reason: Option<String>,
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }

    /// One-line description of what happened, for session events
    pub fn describe(&self) -> String {
        let outcome = match self.status {
            CommandStatus::Success => "succeeded",
            CommandStatus::Timeout => "timed out",
            CommandStatus::Failed => "failed",
        };
        let mut text = format!(
            "{} on deck {} {} after {} retries ({} ms, {})",
            self.kind,
            self.deck,
            outcome,
            self.retry_count,
            self.elapsed_ms,
            if self.verified { "verified" } else { "unverified" }
        );
        if let Some(reason) = &self.reason {
            text.push_str(": ");
            text.push_str(reason);
        }
        text
    }
}

/// Bounds for the verified-execution wrapper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 2,
            backoff: Duration::from_millis(200),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> TrackId {
        TrackId::from_path(id)
    }

    #[test]
    fn test_transport_state_mapping() {
        let mut state = DeckState::empty();
        assert_eq!(state.transport(), TransportState::Empty);

        state.apply(&Transition::Playing);
        assert_eq!(state.transport(), TransportState::Empty, "cannot play an empty deck");

        state.apply(&Transition::Loaded(track("/music/a.mp3")));
        assert_eq!(state.transport(), TransportState::LoadedPaused);
        assert!(state.last_loaded_at.is_some());

        state.apply(&Transition::Playing);
        assert_eq!(state.transport(), TransportState::LoadedPlaying);

        state.apply(&Transition::Loaded(track("/music/b.mp3")));
        assert_eq!(state.transport(), TransportState::LoadedPaused);
        assert_eq!(state.loaded_track_id, Some(track("/music/b.mp3")));
    }

    #[test]
    fn test_expected_state_matching() {
        let mut state = DeckState::empty();
        state.apply(&Transition::Loaded(track("/music/a.mp3")));

        assert!(ExpectedState::loaded_with(track("/music/a.mp3")).matches(&state));
        assert!(!ExpectedState::loaded_with(track("/music/b.mp3")).matches(&state));
        assert!(!ExpectedState::playing().matches(&state));
        assert!(ExpectedState::paused().matches(&state));

        state.apply(&Transition::Level(0.5));
        assert!(ExpectedState::level(0.5).matches(&state));
        assert!(!ExpectedState::level(0.8).matches(&state));
    }

    #[test]
    fn test_describe_result() {
        let result = CommandResult {
            deck: DeckId::B,
            kind: CommandKind::Play,
            status: CommandStatus::Failed,
            verified: false,
            retry_count: 2,
            elapsed_ms: 1200,
            state_before: DeckState::empty(),
            state_after: DeckState::empty(),
            reason: Some("state never matched".into()),
        };
        let text = result.describe();
        assert!(text.starts_with("play on deck B failed after 2 retries"));
        assert!(text.contains("unverified"));
        assert!(text.ends_with("state never matched"));
    }
}
