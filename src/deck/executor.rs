// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Verified command execution.
//!
//! Every deck command runs through [`DeckCommandExecutor::execute_with_verification`]:
//! capture the believed state, send, wait the settle delay for the command
//! kind, compare against the expected state, and retry with backoff. Play is
//! never a toggle; [`DeckCommandExecutor::force_play`] always drives a deck to
//! playing, stopping it first if it is believed to be playing already.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::{
    CommandKind, CommandResult, CommandStatus, DeckId, DeckState, ExpectedState, RetryPolicy,
    Transition,
};
use crate::catalog::Track;
use crate::error::{CommandError, NavigationError, TransportError};
use crate::midi::{ControlSurface, LogicalControl};
use crate::navigation::NavigationPlanner;
use crate::timing::CrossfadeRamp;

/// Settle delays and verification bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutorTiming {
    pub load_settle: Duration,
    pub play_settle: Duration,
    pub stop_settle: Duration,
    pub pause_settle: Duration,
    pub level_settle: Duration,
    /// Transport signals are unreliable this soon after a load
    pub load_stability: Duration,
    /// Interval between the post-play belief checks
    pub verify_poll: Duration,
    pub retry: RetryPolicy,
}

impl Default for ExecutorTiming {
    fn default() -> Self {
        Self {
            load_settle: Duration::from_millis(500),
            play_settle: Duration::from_millis(300),
            stop_settle: Duration::from_millis(200),
            pause_settle: Duration::from_millis(300),
            level_settle: Duration::from_millis(20),
            load_stability: Duration::from_millis(1500),
            verify_poll: Duration::from_millis(100),
            retry: RetryPolicy::default(),
        }
    }
}

impl ExecutorTiming {
    /// Wait after sending a command of this kind
    pub fn settle(&self, kind: CommandKind) -> Duration {
        match kind {
            CommandKind::Load => self.load_settle,
            CommandKind::Play => self.play_settle,
            CommandKind::Stop => self.stop_settle,
            CommandKind::Pause => self.pause_settle,
            CommandKind::Level | CommandKind::Crossfade => self.level_settle,
        }
    }
}

// Snapshot taken when a command starts.
struct Attempt {
    deck: DeckId,
    kind: CommandKind,
    started: Instant,
    state_before: DeckState,
}

impl Attempt {
    fn begin(deck: DeckId, kind: CommandKind, state: &DeckState) -> Self {
        Self {
            deck,
            kind,
            started: Instant::now(),
            state_before: state.clone(),
        }
    }

    fn finish(
        self,
        state: &DeckState,
        status: CommandStatus,
        verified: bool,
        retry_count: u32,
        reason: Option<String>,
    ) -> CommandResult {
        let result = CommandResult {
            deck: self.deck,
            kind: self.kind,
            status,
            verified,
            retry_count,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            state_before: self.state_before,
            state_after: state.clone(),
            reason,
        };
        match status {
            CommandStatus::Success => debug!("{}", result.describe()),
            _ => warn!("{}", result.describe()),
        }
        result
    }
}

/// Sole owner and writer of every deck's believed state.
pub struct DeckCommandExecutor {
    decks: BTreeMap<DeckId, Mutex<DeckState>>,
    crossfader: Mutex<f32>,
    surface: ControlSurface,
    timing: ExecutorTiming,
}

impl DeckCommandExecutor {
    /// One empty deck per deck bound in the control map
    pub fn new(surface: ControlSurface, timing: ExecutorTiming) -> Self {
        let decks = surface
            .map()
            .decks
            .keys()
            .map(|&id| (id, Mutex::new(DeckState::empty())))
            .collect();
        Self {
            decks,
            crossfader: Mutex::new(0.0),
            surface,
            timing,
        }
    }

    pub fn timing(&self) -> &ExecutorTiming {
        &self.timing
    }

    /// Decks this executor can drive, in order
    pub fn decks(&self) -> Vec<DeckId> {
        self.decks.keys().copied().collect()
    }

    /// Snapshot of a deck's believed state
    pub async fn state(&self, deck: DeckId) -> Option<DeckState> {
        match self.decks.get(&deck) {
            Some(slot) => Some(slot.lock().await.clone()),
            None => None,
        }
    }

    /// Believed crossfader position
    pub async fn crossfader(&self) -> f32 {
        *self.crossfader.lock().await
    }

    /// Run `action` until the deck's state matches `expected` or retries run
    /// out. The action receives the attempt number, starting at 0.
    ///
    /// Non-retryable errors fail immediately. After `max_retries` retries the
    /// result is `Failed` when under `policy.timeout`, otherwise `Timeout`.
    pub async fn execute_with_verification<F, Fut>(
        &self,
        deck: DeckId,
        kind: CommandKind,
        expected: ExpectedState,
        policy: RetryPolicy,
        action: F,
    ) -> CommandResult
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Transition, CommandError>>,
    {
        let Some(slot) = self.decks.get(&deck) else {
            return Self::unknown_deck(deck, kind);
        };
        let mut state = slot.lock().await;
        self.verify_locked(deck, &mut state, kind, &expected, policy, action)
            .await
    }

    async fn verify_locked<F, Fut>(
        &self,
        deck: DeckId,
        state: &mut DeckState,
        kind: CommandKind,
        expected: &ExpectedState,
        policy: RetryPolicy,
        mut action: F,
    ) -> CommandResult
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Transition, CommandError>>,
    {
        let attempt = Attempt::begin(deck, kind, state);
        let mut retry_count = 0u32;
        let mut last_reason;

        loop {
            match action(retry_count).await {
                Err(e) if !e.is_retryable() => {
                    let reason = Some(e.to_string());
                    return attempt.finish(state, CommandStatus::Failed, false, retry_count, reason);
                }
                Err(e) => {
                    debug!("{} on deck {} attempt {} failed: {}", kind, deck, retry_count, e);
                    last_reason = e.to_string();
                }
                Ok(transition) => {
                    state.apply(&transition);
                    sleep(self.timing.settle(kind)).await;
                    if expected.matches(state) {
                        return attempt.finish(
                            state,
                            CommandStatus::Success,
                            true,
                            retry_count,
                            None,
                        );
                    }
                    last_reason = "believed state does not match the expected transition".into();
                }
            }

            if retry_count >= policy.max_retries {
                break;
            }
            retry_count += 1;
            warn!("Retrying {} on deck {} ({}/{})", kind, deck, retry_count, policy.max_retries);
            sleep(policy.backoff).await;
        }

        let status = if attempt.started.elapsed() >= policy.timeout {
            CommandStatus::Timeout
        } else {
            CommandStatus::Failed
        };
        attempt.finish(state, status, false, retry_count, Some(last_reason))
    }

    // Transport commands on an empty deck send nothing.
    fn reject_empty(attempt: Attempt, state: &DeckState) -> CommandResult {
        let error = CommandError::Rejected(format!("deck {} is empty", attempt.deck));
        attempt.finish(state, CommandStatus::Failed, false, 0, Some(error.to_string()))
    }

    fn unknown_deck(deck: DeckId, kind: CommandKind) -> CommandResult {
        let state = DeckState::empty();
        Attempt::begin(deck, kind, &state).finish(
            &state,
            CommandStatus::Failed,
            false,
            0,
            Some(format!("deck {} has no control bindings", deck)),
        )
    }

    /// Navigate to `track` and load it into `deck`.
    ///
    /// A retry first resyncs the cursor if the failed attempt left it
    /// untrusted.
    pub async fn load(
        &self,
        deck: DeckId,
        track: &Track,
        planner: &NavigationPlanner,
    ) -> CommandResult {
        let action = |attempt: u32| {
            let id = track.id.clone();
            let position = track.catalog_position;
            async move {
                let position =
                    position.ok_or_else(|| NavigationError::Unreachable(id.to_string()))?;
                if attempt > 0 && planner.needs_resync().await {
                    planner.resync().await?;
                }
                planner.navigate_and_load(position, deck).await?;
                Ok::<_, CommandError>(Transition::Loaded(id))
            }
        };
        let result = self
            .execute_with_verification(
                deck,
                CommandKind::Load,
                ExpectedState::loaded_with(track.id.clone()),
                self.timing.retry,
                action,
            )
            .await;
        if result.is_success() {
            info!("Loaded {} into deck {}", track.display_name(), deck);
        }
        result
    }

    /// Drive `deck` to playing regardless of its believed state.
    ///
    /// Waits out the post-load stability window, sends stop before play if
    /// the deck is believed to be playing, then sets the belief to playing.
    pub async fn force_play(&self, deck: DeckId) -> CommandResult {
        let Some(slot) = self.decks.get(&deck) else {
            return Self::unknown_deck(deck, CommandKind::Play);
        };
        let mut state = slot.lock().await;
        let attempt = Attempt::begin(deck, CommandKind::Play, &state);

        if !state.loaded {
            return Self::reject_empty(attempt, &state);
        }

        if let Some(since) = state.since_load() {
            if since < self.timing.load_stability {
                let remaining = self.timing.load_stability - since;
                debug!("Deck {} loaded {:?} ago, waiting {:?}", deck, since, remaining);
                sleep(remaining).await;
            }
        }

        let stop_first = state.playing;
        let surface = &self.surface;
        let stop_settle = self.timing.stop_settle;
        let action = |_attempt: u32| async move {
            if stop_first {
                surface.trigger(LogicalControl::Stop(deck))?;
                sleep(stop_settle).await;
            }
            surface.trigger(LogicalControl::Play(deck))?;
            Ok::<_, CommandError>(Transition::Playing)
        };

        let mut result = self
            .verify_locked(
                deck,
                &mut state,
                CommandKind::Play,
                &ExpectedState::playing(),
                self.timing.retry,
                action,
            )
            .await;

        if result.is_success() {
            for _ in 0..2 {
                sleep(self.timing.verify_poll).await;
                result.verified &= state.playing;
            }
            result.state_after = state.clone();
        }
        result.state_before = attempt.state_before;
        result.elapsed_ms = attempt.started.elapsed().as_millis() as u64;
        result
    }

    /// Pause a playing deck. A deck believed paused gets no signal.
    pub async fn pause(&self, deck: DeckId) -> CommandResult {
        let Some(slot) = self.decks.get(&deck) else {
            return Self::unknown_deck(deck, CommandKind::Pause);
        };
        let mut state = slot.lock().await;
        if !state.playing {
            debug!("Deck {} already paused", deck);
            return Attempt::begin(deck, CommandKind::Pause, &state).finish(
                &state,
                CommandStatus::Success,
                true,
                0,
                None,
            );
        }

        let surface = &self.surface;
        let action = |_attempt: u32| async move {
            surface.trigger(LogicalControl::Pause(deck))?;
            Ok::<_, CommandError>(Transition::Paused)
        };
        self.verify_locked(
            deck,
            &mut state,
            CommandKind::Pause,
            &ExpectedState::paused(),
            self.timing.retry,
            action,
        )
        .await
    }

    /// Stop a deck. Stop is not a toggle, so it is always sent.
    pub async fn stop(&self, deck: DeckId) -> CommandResult {
        let Some(slot) = self.decks.get(&deck) else {
            return Self::unknown_deck(deck, CommandKind::Stop);
        };
        let mut state = slot.lock().await;
        if !state.loaded {
            return Self::reject_empty(Attempt::begin(deck, CommandKind::Stop, &state), &state);
        }

        let surface = &self.surface;
        let action = |_attempt: u32| async move {
            surface.trigger(LogicalControl::Stop(deck))?;
            Ok::<_, CommandError>(Transition::Paused)
        };
        let expected = ExpectedState {
            loaded: Some(true),
            ..ExpectedState::paused()
        };
        self.verify_locked(
            deck,
            &mut state,
            CommandKind::Stop,
            &expected,
            self.timing.retry,
            action,
        )
        .await
    }

    /// Set a deck's channel fader, 0.0-1.0
    pub async fn set_level(&self, deck: DeckId, level: f32) -> CommandResult {
        let level = level.clamp(0.0, 1.0);
        let surface = &self.surface;
        let action = |_attempt: u32| async move {
            surface.set(LogicalControl::Level(deck), level)?;
            Ok::<_, CommandError>(Transition::Level(level))
        };
        self.execute_with_verification(
            deck,
            CommandKind::Level,
            ExpectedState::level(level),
            self.timing.retry,
            action,
        )
        .await
    }

    /// Move the crossfader, 0.0 (left) to 1.0 (right)
    pub async fn set_crossfader(&self, position: f32) -> Result<(), TransportError> {
        let position = position.clamp(0.0, 1.0);
        let mut crossfader = self.crossfader.lock().await;
        self.surface.set(LogicalControl::Crossfader, position)?;
        *crossfader = position;
        Ok(())
    }

    /// Hand the mix from `from` to `to` in `steps` crossfader moves spread
    /// over `duration`, then pause `from`.
    ///
    /// A dropped intermediate move is skipped; the final position is resent
    /// once if it did not land.
    pub async fn crossfade(
        &self,
        from: DeckId,
        to: DeckId,
        steps: u32,
        duration: Duration,
    ) -> CommandResult {
        let before = self.state(from).await.unwrap_or_default();
        let attempt = Attempt::begin(from, CommandKind::Crossfade, &before);
        let ramp = CrossfadeRamp::between(from, to, steps, duration);
        debug!("Crossfade {} -> {}: {} steps over {:?}", from, to, ramp.steps, duration);

        let mut dropped = 0u32;
        for position in ramp.positions() {
            match self.set_crossfader(position).await {
                Ok(()) => {}
                Err(e) if e.is_retryable() => {
                    debug!("Crossfader move to {:.2} dropped: {}", position, e);
                    dropped += 1;
                }
                Err(e) => return self.abort(attempt, from, dropped, e).await,
            }
            sleep(ramp.step_delay()).await;
        }

        if (self.crossfader().await - ramp.to).abs() > f32::EPSILON {
            if let Err(e) = self.set_crossfader(ramp.to).await {
                return self.abort(attempt, from, dropped, e).await;
            }
        }

        let paused = self.pause(from).await;
        let status = paused.status;
        attempt.finish(
            &paused.state_after,
            status,
            paused.verified,
            dropped + paused.retry_count,
            paused.reason,
        )
    }

    async fn abort(
        &self,
        attempt: Attempt,
        deck: DeckId,
        dropped: u32,
        error: TransportError,
    ) -> CommandResult {
        let after = self.state(deck).await.unwrap_or_default();
        attempt.finish(&after, CommandStatus::Failed, false, dropped, Some(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{TrackCatalog, TrackRecord};
    use crate::deck::TransportState;
    use crate::midi::{ControlMap, SimulatedTransport};
    use crate::navigation::NavigationTiming;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    // Default map: deck A on channel 0, deck B on channel 1.
    const PLAY: u8 = 31;
    const STOP: u8 = 32;
    const PAUSE: u8 = 33;

    struct Rig {
        transport: Arc<SimulatedTransport>,
        executor: DeckCommandExecutor,
        planner: NavigationPlanner,
        catalog: TrackCatalog,
    }

    fn rig() -> Rig {
        let transport = Arc::new(SimulatedTransport::new());
        let surface = ControlSurface::new(transport.clone(), ControlMap::default());
        let records: Vec<TrackRecord> = (0..20)
            .map(|i| TrackRecord::new(format!("/music/{:02}.mp3", i)).with_bpm(120.0))
            .collect();
        Rig {
            transport,
            executor: DeckCommandExecutor::new(surface.clone(), ExecutorTiming::default()),
            planner: NavigationPlanner::new(surface, NavigationTiming::default()),
            catalog: TrackCatalog::load(&records).unwrap(),
        }
    }

    async fn load_and_play(rig: &Rig, deck: DeckId, position: usize) {
        let track = rig.catalog.get_by_position(position).unwrap();
        assert!(rig.executor.load(deck, track, &rig.planner).await.is_success());
        assert!(rig.executor.force_play(deck).await.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_verifies_and_moves_cursor() {
        let rig = rig();
        let track = rig.catalog.get_by_position(7).unwrap();
        let result = rig.executor.load(DeckId::B, track, &rig.planner).await;

        assert!(result.is_success());
        assert!(result.verified);
        assert_eq!(result.retry_count, 0);
        assert_eq!(result.state_before.transport(), TransportState::Empty);
        assert_eq!(result.state_after.transport(), TransportState::LoadedPaused);
        assert_eq!(result.state_after.loaded_track_id, Some(track.id.clone()));
        assert!(result.state_after.last_loaded_at.is_some());
        assert!(result.elapsed_ms >= 500);
        assert_eq!(rig.planner.current_position().await, 7);
        assert_eq!(rig.transport.count_controller(1, 30), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_unreachable_track_fails_without_signals() {
        let rig = rig();
        let mut track = rig.catalog.get_by_position(3).unwrap().clone();
        track.catalog_position = None;

        let result = rig.executor.load(DeckId::A, &track, &rig.planner).await;
        assert_eq!(result.status, CommandStatus::Failed);
        assert_eq!(result.retry_count, 0);
        assert!(rig.transport.signals().is_empty());
        assert_eq!(rig.executor.state(DeckId::A).await.unwrap().transport(), TransportState::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_retry_resyncs_cursor() {
        let rig = rig();
        let track = rig.catalog.get_by_position(5).unwrap();
        rig.transport.fail_next(1);

        let result = rig.executor.load(DeckId::A, track, &rig.planner).await;
        assert!(result.is_success());
        assert_eq!(result.retry_count, 1);
        assert!(!rig.planner.needs_resync().await);
        assert_eq!(rig.planner.current_position().await, 5);
        assert_eq!(rig.transport.count_controller(0, 22), 1, "one reset from resync");
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_device_is_not_retried() {
        let rig = rig();
        rig.transport.set_online(false);
        let track = rig.catalog.get_by_position(2).unwrap();

        let result = rig.executor.load(DeckId::A, track, &rig.planner).await;
        assert_eq!(result.status, CommandStatus::Failed);
        assert_eq!(result.retry_count, 0);
        assert!(result.reason.unwrap().contains("unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_play_on_empty_deck_sends_nothing() {
        let rig = rig();
        let result = rig.executor.force_play(DeckId::A).await;
        assert_eq!(result.status, CommandStatus::Failed);
        assert!(!result.verified);
        assert!(rig.transport.signals().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_on_empty_deck_is_rejected() {
        let rig = rig();
        let result = rig.executor.stop(DeckId::B).await;
        assert_eq!(result.status, CommandStatus::Failed);
        assert!(!result.verified);
        assert!(result.reason.unwrap().contains("deck B is empty"));
        assert!(rig.transport.signals().is_empty());

        load_and_play(&rig, DeckId::B, 1).await;
        rig.transport.clear();
        let result = rig.executor.stop(DeckId::B).await;
        assert!(result.is_success());
        assert!(result.verified);
        assert_eq!(result.state_after.transport(), TransportState::LoadedPaused);
        assert_eq!(rig.transport.count_controller(1, STOP), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_play_waits_out_load_stability() {
        let rig = rig();
        let track = rig.catalog.get_by_position(0).unwrap();
        rig.executor.load(DeckId::A, track, &rig.planner).await;
        let loaded_at = rig.executor.state(DeckId::A).await.unwrap().last_loaded_at.unwrap();

        let result = rig.executor.force_play(DeckId::A).await;
        assert!(result.is_success());
        assert!(result.verified);
        assert!(loaded_at.elapsed() >= Duration::from_millis(1500));
        assert_eq!(result.state_after.transport(), TransportState::LoadedPlaying);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_play_never_toggles() {
        let rig = rig();
        load_and_play(&rig, DeckId::A, 4).await;
        rig.transport.clear();

        for _ in 0..5 {
            let result = rig.executor.force_play(DeckId::A).await;
            assert!(result.is_success());
            assert_eq!(result.state_before.transport(), TransportState::LoadedPlaying);
            assert_eq!(result.state_after.transport(), TransportState::LoadedPlaying);
            assert_eq!(
                rig.executor.state(DeckId::A).await.unwrap().transport(),
                TransportState::LoadedPlaying
            );
        }

        // Every call re-asserts play as stop followed by play.
        let sequence: Vec<u8> = rig.transport.signals().iter().map(|s| s.controller).collect();
        assert_eq!(sequence, [STOP, PLAY].repeat(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_is_idempotent() {
        let rig = rig();
        load_and_play(&rig, DeckId::B, 1).await;
        rig.transport.clear();

        let first = rig.executor.pause(DeckId::B).await;
        assert!(first.is_success());
        assert_eq!(first.state_after.transport(), TransportState::LoadedPaused);

        let second = rig.executor.pause(DeckId::B).await;
        assert!(second.is_success());
        assert_eq!(rig.transport.count_controller(1, PAUSE), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_then_failed() {
        let rig = rig();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            timeout: Duration::from_secs(5),
            max_retries: 2,
            backoff: Duration::from_millis(200),
        };

        let result = rig
            .executor
            .execute_with_verification(
                DeckId::A,
                CommandKind::Play,
                ExpectedState::playing(),
                policy,
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Transition::None) }
                },
            )
            .await;

        assert_eq!(result.status, CommandStatus::Failed);
        assert!(!result.verified);
        assert_eq!(result.retry_count, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_then_timeout() {
        let rig = rig();
        let policy = RetryPolicy {
            timeout: Duration::from_millis(500),
            max_retries: 2,
            backoff: Duration::from_millis(200),
        };

        let result = rig
            .executor
            .execute_with_verification(
                DeckId::A,
                CommandKind::Play,
                ExpectedState::playing(),
                policy,
                |_| async { Ok(Transition::None) },
            )
            .await;

        assert_eq!(result.status, CommandStatus::Timeout);
        assert_eq!(result.retry_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_send_failure_retried() {
        let rig = rig();
        load_and_play(&rig, DeckId::A, 0).await;
        rig.transport.fail_next(1);

        let result = rig.executor.set_level(DeckId::A, 0.5).await;
        assert!(result.is_success());
        assert_eq!(result.retry_count, 1);
        assert_eq!(result.state_after.level, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbound_deck_fails() {
        let rig = rig();
        let result = rig.executor.stop(DeckId::C).await;
        assert_eq!(result.status, CommandStatus::Failed);
        assert!(result.reason.unwrap().contains("no control bindings"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_crossfade_ramps_then_pauses_origin() {
        let rig = rig();
        load_and_play(&rig, DeckId::A, 0).await;
        load_and_play(&rig, DeckId::B, 1).await;
        rig.transport.clear();

        let started = Instant::now();
        let result = rig
            .executor
            .crossfade(DeckId::A, DeckId::B, 4, Duration::from_secs(8))
            .await;

        assert!(result.is_success());
        assert!(started.elapsed() >= Duration::from_secs(8));
        let fader: Vec<u8> = rig
            .transport
            .signals()
            .iter()
            .filter(|s| s.channel == 0 && s.controller == 8)
            .map(|s| s.value)
            .collect();
        assert_eq!(fader, vec![32, 64, 95, 127]);
        assert_eq!(rig.executor.crossfader().await, 1.0);
        assert_eq!(
            rig.executor.state(DeckId::A).await.unwrap().transport(),
            TransportState::LoadedPaused
        );
        assert_eq!(
            rig.executor.state(DeckId::B).await.unwrap().transport(),
            TransportState::LoadedPlaying
        );
    }
}
