// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The autonomous session loop.
//!
//! One task drives everything: each cycle polls the context feed, picks the
//! next track, loads it on the idle deck, force-plays it, crossfades and
//! pauses the old deck. Failures stay inside the cycle; only the duration,
//! a stop request or running out of candidates ends the session.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::events::{EventBus, SessionEvent};
use super::feed::{ContextFeed, ContextOverride, NoOverrides};
use super::SessionContext;
use crate::catalog::{Track, TrackCatalog, TrackId, TrackSource};
use crate::config::AppConfig;
use crate::deck::{DeckCommandExecutor, DeckId};
use crate::error::SessionError;
use crate::midi::{ControlSurface, DeviceTransport};
use crate::navigation::NavigationPlanner;
use crate::scoring::CompatibilityScorer;
use crate::timing::crossfader_side;

/// Cadence and transition shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSettings {
    /// Time from one cycle start to the next
    pub interval: Duration,
    pub crossfade_duration: Duration,
    pub crossfade_steps: u32,
    /// Other candidates tried in a cycle after a failed load or play
    pub max_alternates: u32,
    /// The two decks the session alternates between; the first opens
    pub decks: (DeckId, DeckId),
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(180),
            crossfade_duration: Duration::from_secs(8),
            crossfade_steps: 16,
            max_alternates: 3,
            decks: (DeckId::A, DeckId::B),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    DurationReached,
    StopRequested,
    NoCandidate,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EndReason::DurationReached => "duration reached",
            EndReason::StopRequested => "stop requested",
            EndReason::NoCandidate => "no candidate track",
        };
        write!(f, "{}", text)
    }
}

/// What a finished session did
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub tracks_played: usize,
    pub failed_cycles: usize,
    pub end_reason: EndReason,
    pub elapsed: Duration,
}

/// Requests a clean stop at the next cycle boundary
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

enum CycleOutcome {
    Played,
    Failed(String),
    NoCandidate,
}

/// Drives the select → navigate → load → play → crossfade loop.
pub struct SessionOrchestrator {
    catalog: Arc<TrackCatalog>,
    scorer: CompatibilityScorer,
    planner: Arc<NavigationPlanner>,
    executor: Arc<DeckCommandExecutor>,
    context: SessionContext,
    settings: CycleSettings,
    events: EventBus,
    feed: Box<dyn ContextFeed>,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
    /// Deck and track currently on air
    on_air: Option<(DeckId, TrackId)>,
    tracks_played: usize,
    failed_cycles: usize,
}

impl SessionOrchestrator {
    pub fn new(
        catalog: Arc<TrackCatalog>,
        scorer: CompatibilityScorer,
        planner: Arc<NavigationPlanner>,
        executor: Arc<DeckCommandExecutor>,
        context: SessionContext,
        settings: CycleSettings,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            catalog,
            scorer,
            planner,
            executor,
            context,
            settings,
            events: EventBus::default(),
            feed: Box::new(NoOverrides),
            stop_tx: Arc::new(stop_tx),
            stop_rx,
            on_air: None,
            tracks_played: 0,
            failed_cycles: 0,
        }
    }

    /// Wire a whole session from configuration: validate it, load the
    /// catalog and build the planner and executor over one control surface.
    pub fn from_config<S: TrackSource + ?Sized>(
        config: &AppConfig,
        source: &S,
        transport: Arc<dyn DeviceTransport>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let catalog = TrackCatalog::load(source)?;
        info!(
            "Session over {} tracks via {} ({} unreachable)",
            catalog.len(),
            transport.name(),
            catalog.stats().unreachable
        );

        let surface = ControlSurface::new(transport, config.controls.clone());
        let planner = NavigationPlanner::new(surface.clone(), config.timing.navigation());
        let executor = DeckCommandExecutor::new(surface, config.timing.executor());
        let context = config.session.context(config.scoring.history_window);

        Ok(Self::new(
            Arc::new(catalog),
            config.scoring.scorer(),
            Arc::new(planner),
            Arc::new(executor),
            context,
            config.session.cycle(),
        ))
    }

    pub fn with_feed(mut self, feed: Box<dyn ContextFeed>) -> Self {
        self.feed = feed;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: Arc::clone(&self.stop_tx),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Run until the duration is reached, a stop is requested, or nothing
    /// is left to play.
    pub async fn run(&mut self) -> SessionSummary {
        self.context.start();
        self.events.emit(SessionEvent::SessionStarted {
            venue: self.context.venue,
            event: self.context.event,
            target_secs: self.context.target_duration.as_secs(),
        });
        self.prepare_levels().await;

        let end_reason = loop {
            let cycle_started = Instant::now();

            if self.apply_overrides() || *self.stop_rx.borrow() {
                break EndReason::StopRequested;
            }
            if self.context.is_complete() {
                break EndReason::DurationReached;
            }

            let outcome = match self.on_air.clone() {
                None => self.start_initial().await,
                Some((deck, track_id)) => self.transition(deck, &track_id).await,
            };
            match outcome {
                CycleOutcome::Played => self.tracks_played += 1,
                CycleOutcome::Failed(reason) => {
                    self.failed_cycles += 1;
                    self.events.emit(SessionEvent::CycleSkipped { reason });
                }
                CycleOutcome::NoCandidate => break EndReason::NoCandidate,
            }
            debug!("Session phase: {}", self.context.phase());

            let remaining = self
                .context
                .target_duration
                .saturating_sub(self.context.elapsed());
            let next_cycle = cycle_started + self.settings.interval;
            let wake = Instant::now()
                .checked_add(remaining)
                .map_or(next_cycle, |end| next_cycle.min(end));
            tokio::select! {
                _ = sleep_until(wake) => {}
                _ = self.stop_rx.changed() => {}
            }
        };

        self.context.stop();
        self.events.emit(SessionEvent::SessionEnded {
            reason: end_reason,
            tracks_played: self.tracks_played,
        });
        SessionSummary {
            tracks_played: self.tracks_played,
            failed_cycles: self.failed_cycles,
            end_reason,
            elapsed: self.context.elapsed(),
        }
    }

    // Returns true when a stop was requested.
    fn apply_overrides(&mut self) -> bool {
        let mut stop = false;
        for item in self.feed.poll() {
            info!("Applying override {:?}", item);
            match item {
                ContextOverride::Venue(venue) => self.context.set_venue(venue),
                ContextOverride::Event(event) => self.context.set_event(event),
                ContextOverride::TargetDuration(duration) => {
                    self.context.set_target_duration(duration)
                }
                ContextOverride::Stop => stop = true,
            }
        }
        stop
    }

    async fn prepare_levels(&self) {
        let (first, second) = self.settings.decks;
        for deck in [first, second] {
            let result = self.executor.set_level(deck, 1.0).await;
            if !result.is_success() {
                self.events.emit(SessionEvent::CommandFailed {
                    deck,
                    reason: result.describe(),
                });
            }
        }
    }

    async fn start_initial(&mut self) -> CycleOutcome {
        let deck = self.settings.decks.0;
        let catalog = Arc::clone(&self.catalog);
        let mut exclude = self.context.recent_ids();

        for attempt in 0..=self.settings.max_alternates {
            let Some(track) = self
                .scorer
                .select_from_catalog(&catalog, None, &self.context, &exclude)
            else {
                return self.out_of_candidates(attempt);
            };
            self.announce(track, None, deck);

            if self.load_and_play(track, deck).await {
                if let Err(e) = self.executor.set_crossfader(crossfader_side(deck)).await {
                    warn!("Could not centre crossfader on deck {}: {}", deck, e);
                }
                self.context.record(track);
                self.on_air = Some((deck, track.id.clone()));
                return CycleOutcome::Played;
            }
            exclude.insert(track.id.clone());
        }
        CycleOutcome::Failed(format!(
            "no track could be started on deck {} after {} alternates",
            deck, self.settings.max_alternates
        ))
    }

    async fn transition(&mut self, from: DeckId, current_id: &TrackId) -> CycleOutcome {
        let to = self.other_deck(from);
        let catalog = Arc::clone(&self.catalog);
        let current = catalog.get(current_id);
        let mut exclude: HashSet<TrackId> = self.context.recent_ids();
        exclude.insert(current_id.clone());

        for attempt in 0..=self.settings.max_alternates {
            let Some(track) = self
                .scorer
                .select_from_catalog(&catalog, current, &self.context, &exclude)
            else {
                return self.out_of_candidates(attempt);
            };
            self.announce(track, current, to);

            if self.load_and_play(track, to).await {
                self.events.emit(SessionEvent::TransitionStarted { from, to });
                let fade = self
                    .executor
                    .crossfade(
                        from,
                        to,
                        self.settings.crossfade_steps,
                        self.settings.crossfade_duration,
                    )
                    .await;
                if !fade.is_success() {
                    self.events.emit(SessionEvent::CommandFailed {
                        deck: from,
                        reason: fade.describe(),
                    });
                }
                self.events.emit(SessionEvent::TransitionCompleted {
                    from,
                    to,
                    verified: fade.verified,
                });
                self.context.record(track);
                self.on_air = Some((to, track.id.clone()));
                return CycleOutcome::Played;
            }
            exclude.insert(track.id.clone());
        }
        CycleOutcome::Failed(format!(
            "no track could be loaded on deck {} after {} alternates",
            to, self.settings.max_alternates
        ))
    }

    // Nothing at all to select ends the session; running out only after
    // failed alternates just loses the cycle.
    fn out_of_candidates(&self, attempt: u32) -> CycleOutcome {
        if attempt == 0 {
            CycleOutcome::NoCandidate
        } else {
            CycleOutcome::Failed("candidates exhausted by failed alternates".to_string())
        }
    }

    fn other_deck(&self, deck: DeckId) -> DeckId {
        let (first, second) = self.settings.decks;
        if deck == first {
            second
        } else {
            first
        }
    }

    fn announce(&self, track: &Track, current: Option<&Track>, deck: DeckId) {
        self.events.emit(SessionEvent::TrackSelected {
            track_id: track.id.clone(),
            display_name: track.display_name(),
            score: self.scorer.score(track, current, &self.context),
            deck,
        });
    }

    // Navigate, load and force-play. Any failure is reported as an event.
    async fn load_and_play(&self, track: &Track, deck: DeckId) -> bool {
        if self.planner.needs_resync().await {
            if let Err(e) = self.planner.resync().await {
                self.events.emit(SessionEvent::CommandFailed {
                    deck,
                    reason: format!("cursor resync failed: {}", e),
                });
                return false;
            }
        }

        if let Some(target) = track.catalog_position {
            let path = self.planner.plan(target).await;
            self.events.emit(SessionEvent::NavigationStarted {
                track_id: track.id.clone(),
                from_position: path.from_position,
                target_position: target,
                strategy: path.strategy,
                step_count: path.step_count,
            });
        }

        let load = self.executor.load(deck, track, &self.planner).await;
        self.events.emit(SessionEvent::NavigationCompleted {
            track_id: track.id.clone(),
            deck,
            verified: load.verified,
        });
        if !load.is_success() {
            self.events.emit(SessionEvent::CommandFailed {
                deck,
                reason: load.describe(),
            });
            return false;
        }

        let play = self.executor.force_play(deck).await;
        if !play.is_success() {
            self.events.emit(SessionEvent::CommandFailed {
                deck,
                reason: play.describe(),
            });
            return false;
        }
        true
    }
}
