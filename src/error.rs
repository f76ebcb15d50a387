// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for mixpilot.
//!
//! Only catalog and configuration failures are terminal. Transport and
//! navigation errors are handled inside a single orchestration cycle and
//! surface to callers as failed `CommandResult`s and session events.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to build the track catalog. Fatal at load time.
#[derive(Error, Debug)]
pub enum CatalogParseError {
    /// The catalog source could not be read
    #[error("cannot read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog source is not a valid list of track records
    #[error("malformed catalog: {0}")]
    Format(String),

    /// A single record is unusable
    #[error("malformed track record #{index}: {reason}")]
    Malformed { index: usize, reason: String },

    /// The source parsed to zero tracks
    #[error("catalog contains no tracks")]
    Empty,
}

/// Failure reported by the device transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The device channel itself is down. Never retried.
    #[error("device transport unavailable: {0}")]
    Unavailable(String),

    /// A single signal could not be delivered
    #[error("signal send failed: {0}")]
    Send(String),

    /// No binding is configured for a logical control. Never retried.
    #[error("no control binding for {0}")]
    Unmapped(String),

    /// A control value fell outside the MIDI range
    #[error("invalid control value: channel {channel}, controller {controller}, value {value}")]
    InvalidValue {
        channel: u8,
        controller: u8,
        value: u8,
    },
}

impl TransportError {
    /// True when retrying cannot help
    pub fn is_unavailable(&self) -> bool {
        matches!(self, TransportError::Unavailable(_))
    }

    /// Only dropped signals are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Send(_))
    }
}

/// Failure while moving the browse cursor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// A move or load signal failed mid-sequence; the cursor is now stale
    #[error("navigation interrupted after {sent} of {planned} signals: {source}")]
    Transport {
        sent: u32,
        planned: u32,
        #[source]
        source: TransportError,
    },

    /// An earlier failure left the cursor untrusted; `resync()` first
    #[error("browse cursor desynchronised, resync required")]
    DesyncSuspected,

    /// The path was planned from a cursor position that no longer holds
    #[error("stale navigation plan: planned from {planned_from}, cursor at {current}")]
    StalePlan { planned_from: usize, current: usize },

    /// The track has no position in the browse list
    #[error("track {0} has no browse position")]
    Unreachable(String),
}

impl NavigationError {
    /// The transport error behind this failure, if any
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            NavigationError::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Why one attempt of a deck command did not go through
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// The command makes no sense for the deck's believed state
    #[error("{0}")]
    Rejected(String),
}

impl CommandError {
    /// Only transient send failures earn another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            CommandError::Transport(e) => e.is_retryable(),
            CommandError::Navigation(e) => e.transport().map_or(false, |t| t.is_retryable()),
            CommandError::Rejected(_) => false,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Terminal session failures
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
