// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for mixpilot.
//!
//! One [`AppConfig`] document (YAML, or TOML by `.toml` extension) covers the
//! device connection, the logical control table, timing, scoring and the
//! session plan. Every field has a default, so a minimal file is valid.
//! A separate overrides file can be watched while a session runs.

pub mod watcher;

pub use watcher::{OverridesWatcher, WatchEvent};

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::KeyMode;
use crate::deck::{ExecutorTiming, RetryPolicy};
use crate::error::ConfigError;
use crate::midi::ControlMap;
use crate::music::TempoTolerance;
use crate::navigation::NavigationTiming;
use crate::scoring::{CompatibilityScorer, EnergyCurve, EventType, ScoringWeights, VenueType};
use crate::session::orchestrator::CycleSettings;
use crate::session::SessionContext;

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiSettings,
    /// Logical control → CC table
    #[serde(default)]
    pub controls: ControlMap,
    #[serde(default)]
    pub timing: TimingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

impl AppConfig {
    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            Self::from_toml(&contents)?
        } else {
            Self::from_yaml(&contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse from a YAML string (not validated)
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse from a TOML string (not validated)
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        self.controls.validate().map_err(ConfigError::Invalid)?;
        if !(0.0..=1.0).contains(&self.midi.drop_rate) {
            return invalid(format!("midi.drop_rate {} outside 0.0-1.0", self.midi.drop_rate));
        }
        if self.timing.step_delay_ms == 0 {
            return invalid("timing.step_delay_ms must be non-zero".to_string());
        }
        if self.timing.command_timeout_ms == 0 {
            return invalid("timing.command_timeout_ms must be non-zero".to_string());
        }
        self.scoring
            .weights
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("scoring.weights: {}", e)))?;
        if self.scoring.bpm_tolerance < 0.0 || self.scoring.ratio_tolerance < 0.0 {
            return invalid("scoring tolerances must be non-negative".to_string());
        }
        if self.scoring.history_window == 0 {
            return invalid("scoring.history_window must be at least 1".to_string());
        }
        if self.session.crossfade_steps == 0 {
            return invalid("session.crossfade_steps must be at least 1".to_string());
        }
        if self.session.target_minutes == 0 {
            return invalid("session.target_minutes must be at least 1".to_string());
        }
        if self.session.cycle_secs == 0 {
            return invalid("session.cycle_secs must be at least 1".to_string());
        }
        if self.session.crossfade_secs > self.session.cycle_secs {
            return invalid(format!(
                "session.crossfade_secs {} exceeds session.cycle_secs {}",
                self.session.crossfade_secs, self.session.cycle_secs
            ));
        }
        let (outgoing, incoming) = self.session.cycle().decks;
        for deck in [outgoing, incoming] {
            if !self.controls.decks.contains_key(&deck) {
                return invalid(format!("controls.decks has no binding for deck {}", deck));
            }
        }
        if let Some(curve) = &self.session.energy_curve {
            if curve.is_empty() {
                return invalid("session.energy_curve is empty".to_string());
            }
            if let Some(bad) = curve.iter().find(|e| !(0.0..=1.0).contains(*e)) {
                return invalid(format!("session.energy_curve value {} outside 0.0-1.0", bad));
            }
        }
        Ok(())
    }
}

/// Device connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MidiSettings {
    /// Substring of the output port name to connect to
    #[serde(default)]
    pub port: Option<String>,
    /// Record signals instead of sending them
    #[serde(default)]
    pub simulate: bool,
    /// Seed for simulated signal drops
    #[serde(default)]
    pub fault_seed: Option<u64>,
    /// Fraction of simulated signals to drop (0.0-1.0)
    #[serde(default)]
    pub drop_rate: f64,
}

/// Settle delays, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingSettings {
    #[serde(default = "default_step_delay")]
    pub step_delay_ms: u64,
    #[serde(default = "default_reset_settle")]
    pub reset_settle_ms: u64,
    #[serde(default = "default_load_settle")]
    pub load_settle_ms: u64,
    #[serde(default = "default_play_settle")]
    pub play_settle_ms: u64,
    #[serde(default = "default_stop_settle")]
    pub stop_settle_ms: u64,
    #[serde(default = "default_pause_settle")]
    pub pause_settle_ms: u64,
    #[serde(default = "default_level_settle")]
    pub level_settle_ms: u64,
    #[serde(default = "default_load_stability")]
    pub load_stability_ms: u64,
    #[serde(default = "default_verify_poll")]
    pub verify_poll_ms: u64,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_step_delay() -> u64 {
    50
}
fn default_reset_settle() -> u64 {
    1500
}
fn default_load_settle() -> u64 {
    500
}
fn default_play_settle() -> u64 {
    300
}
fn default_stop_settle() -> u64 {
    200
}
fn default_pause_settle() -> u64 {
    300
}
fn default_level_settle() -> u64 {
    20
}
fn default_load_stability() -> u64 {
    1500
}
fn default_verify_poll() -> u64 {
    100
}
fn default_retry_backoff() -> u64 {
    200
}
fn default_command_timeout() -> u64 {
    5000
}
fn default_max_retries() -> u32 {
    2
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay(),
            reset_settle_ms: default_reset_settle(),
            load_settle_ms: default_load_settle(),
            play_settle_ms: default_play_settle(),
            stop_settle_ms: default_stop_settle(),
            pause_settle_ms: default_pause_settle(),
            level_settle_ms: default_level_settle(),
            load_stability_ms: default_load_stability(),
            verify_poll_ms: default_verify_poll(),
            retry_backoff_ms: default_retry_backoff(),
            command_timeout_ms: default_command_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl TimingSettings {
    pub fn navigation(&self) -> NavigationTiming {
        NavigationTiming {
            step_delay: Duration::from_millis(self.step_delay_ms),
            reset_settle: Duration::from_millis(self.reset_settle_ms),
        }
    }

    pub fn executor(&self) -> ExecutorTiming {
        ExecutorTiming {
            load_settle: Duration::from_millis(self.load_settle_ms),
            play_settle: Duration::from_millis(self.play_settle_ms),
            stop_settle: Duration::from_millis(self.stop_settle_ms),
            pause_settle: Duration::from_millis(self.pause_settle_ms),
            level_settle: Duration::from_millis(self.level_settle_ms),
            load_stability: Duration::from_millis(self.load_stability_ms),
            verify_poll: Duration::from_millis(self.verify_poll_ms),
            retry: RetryPolicy {
                timeout: Duration::from_millis(self.command_timeout_ms),
                max_retries: self.max_retries,
                backoff: Duration::from_millis(self.retry_backoff_ms),
            },
        }
    }
}

/// Selection tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default = "default_bpm_tolerance")]
    pub bpm_tolerance: f64,
    #[serde(default = "default_ratio_tolerance")]
    pub ratio_tolerance: f64,
    #[serde(default)]
    pub key_mode: KeyMode,
    /// Tracks remembered for anti-repetition
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_bpm_tolerance() -> f64 {
    TempoTolerance::default().bpm
}
fn default_ratio_tolerance() -> f64 {
    TempoTolerance::default().ratio
}
fn default_history_window() -> usize {
    crate::session::DEFAULT_HISTORY_WINDOW
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            bpm_tolerance: default_bpm_tolerance(),
            ratio_tolerance: default_ratio_tolerance(),
            key_mode: KeyMode::default(),
            history_window: default_history_window(),
        }
    }
}

impl ScoringSettings {
    pub fn scorer(&self) -> CompatibilityScorer {
        CompatibilityScorer::new(self.weights)
            .with_tolerance(TempoTolerance::new(self.bpm_tolerance, self.ratio_tolerance))
            .with_key_mode(self.key_mode)
    }
}

/// The session plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    #[serde(default)]
    pub venue: VenueType,
    #[serde(default)]
    pub event: EventType,
    #[serde(default = "default_target_minutes")]
    pub target_minutes: u64,
    /// Seconds between transitions
    #[serde(default = "default_cycle_secs")]
    pub cycle_secs: u64,
    #[serde(default = "default_crossfade_secs")]
    pub crossfade_secs: u64,
    #[serde(default = "default_crossfade_steps")]
    pub crossfade_steps: u32,
    /// Other candidates tried after a failed load or play
    #[serde(default = "default_max_alternates")]
    pub max_alternates: u32,
    /// Replaces the venue/event preset
    #[serde(default)]
    pub energy_curve: Option<Vec<f64>>,
}

fn default_target_minutes() -> u64 {
    60
}
fn default_cycle_secs() -> u64 {
    180
}
fn default_crossfade_secs() -> u64 {
    8
}
fn default_crossfade_steps() -> u32 {
    16
}
fn default_max_alternates() -> u32 {
    3
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            venue: VenueType::default(),
            event: EventType::default(),
            target_minutes: default_target_minutes(),
            cycle_secs: default_cycle_secs(),
            crossfade_secs: default_crossfade_secs(),
            crossfade_steps: default_crossfade_steps(),
            max_alternates: default_max_alternates(),
            energy_curve: None,
        }
    }
}

impl SessionSettings {
    /// Fresh, not-yet-started context for this plan
    pub fn context(&self, history_window: usize) -> SessionContext {
        SessionContext::new(
            self.venue,
            self.event,
            Duration::from_secs(self.target_minutes.saturating_mul(60)),
            self.energy_curve.clone().map(EnergyCurve::new),
        )
        .with_history_window(history_window)
    }

    pub fn cycle(&self) -> CycleSettings {
        CycleSettings {
            interval: Duration::from_secs(self.cycle_secs),
            crossfade_duration: Duration::from_secs(self.crossfade_secs),
            crossfade_steps: self.crossfade_steps,
            max_alternates: self.max_alternates,
            ..CycleSettings::default()
        }
    }
}

/// Live session overrides, read from the watched overrides file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OverridesFile {
    #[serde(default)]
    pub venue: Option<VenueType>,
    #[serde(default)]
    pub event: Option<EventType>,
    #[serde(default)]
    pub target_minutes: Option<u64>,
    /// End the session after the current cycle
    #[serde(default)]
    pub stop: bool,
}

impl OverridesFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}
