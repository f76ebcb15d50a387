// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Clock/context feed.
//!
//! External callers (chat, GUI, an operator editing a file) can change the
//! venue, event or session length, or ask the session to stop. The
//! orchestrator polls its feed once per cycle and applies what it gets.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{OverridesFile, OverridesWatcher, WatchEvent};
use crate::scoring::{EventType, VenueType};

/// A change requested from outside the session
#[derive(Debug, Clone, PartialEq)]
pub enum ContextOverride {
    Venue(VenueType),
    Event(EventType),
    TargetDuration(Duration),
    /// End the session at the next cycle boundary
    Stop,
}

/// Source of overrides, polled once per cycle
pub trait ContextFeed: Send {
    /// Everything requested since the last poll, oldest first
    fn poll(&mut self) -> Vec<ContextOverride>;
}

/// A feed that never overrides anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverrides;

impl ContextFeed for NoOverrides {
    fn poll(&mut self) -> Vec<ContextOverride> {
        Vec::new()
    }
}

/// Overrides pushed through a channel by an in-process caller
pub struct ChannelFeed {
    rx: mpsc::UnboundedReceiver<ContextOverride>,
}

impl ChannelFeed {
    /// The feed and the sender callers use to reach it
    pub fn new() -> (mpsc::UnboundedSender<ContextOverride>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

impl ContextFeed for ChannelFeed {
    fn poll(&mut self) -> Vec<ContextOverride> {
        let mut overrides = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            overrides.push(item);
        }
        overrides
    }
}

/// Overrides read from a watched YAML file
pub struct OverrideFileFeed {
    watcher: OverridesWatcher,
    last: OverridesFile,
}

impl OverrideFileFeed {
    /// Start watching `path`. The file's current content is the baseline;
    /// only later edits produce overrides.
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: Option<u64>) -> Result<Self> {
        let last = OverridesFile::load(path.as_ref()).unwrap_or_default();
        let watcher = OverridesWatcher::new(path, debounce_ms)?;
        info!("Watching overrides file {:?}", watcher.watched_path());
        Ok(Self { watcher, last })
    }

    /// Overrides implied by moving from `last` to `next`
    pub fn diff(last: &OverridesFile, next: &OverridesFile) -> Vec<ContextOverride> {
        let mut overrides = Vec::new();
        if let Some(venue) = next.venue.filter(|v| last.venue != Some(*v)) {
            overrides.push(ContextOverride::Venue(venue));
        }
        if let Some(event) = next.event.filter(|e| last.event != Some(*e)) {
            overrides.push(ContextOverride::Event(event));
        }
        if let Some(minutes) = next.target_minutes.filter(|m| last.target_minutes != Some(*m)) {
            let target = Duration::from_secs(minutes.saturating_mul(60));
            overrides.push(ContextOverride::TargetDuration(target));
        }
        if next.stop && !last.stop {
            overrides.push(ContextOverride::Stop);
        }
        overrides
    }
}

impl ContextFeed for OverrideFileFeed {
    fn poll(&mut self) -> Vec<ContextOverride> {
        let mut overrides = Vec::new();
        for event in self.watcher.recv_all() {
            match event {
                WatchEvent::Reloaded(next) => {
                    overrides.extend(Self::diff(&self.last, &next));
                    self.last = next;
                }
                WatchEvent::Error(e) => warn!("Ignoring overrides file change: {}", e),
            }
        }
        overrides
    }
}
