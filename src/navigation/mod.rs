// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Browse-cursor navigation.
//!
//! The console only understands "one row up", "one row down" and "jump to
//! the top", and never reports where its cursor is. The planner keeps an
//! optimistic cursor estimate, picks the cheapest way to reach a row, and
//! refuses to move again after a failed send until [`NavigationPlanner::resync`]
//! puts the cursor back on known ground.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::deck::DeckId;
use crate::error::{NavigationError, TransportError};
use crate::midi::{ControlSurface, LogicalControl};
use crate::timing::step_equivalents;

/// How the cursor gets to the target row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    StepForward,
    StepBackward,
    ResetThenForward,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::StepForward => "step forward",
            Strategy::StepBackward => "step backward",
            Strategy::ResetThenForward => "reset then forward",
        };
        write!(f, "{}", name)
    }
}

/// A planned cursor movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationPath {
    pub strategy: Strategy,
    /// Move signals to send; a reset counts as one
    pub step_count: u32,
    /// Step-equivalents this path costs, the quantity minimised
    pub cost: u32,
    pub from_position: usize,
    pub target_position: usize,
}

impl fmt::Display for NavigationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {} ({} signals, cost {})",
            self.from_position, self.target_position, self.strategy, self.step_count, self.cost
        )
    }
}

fn rows(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Cheapest path from `current` to `target`.
///
/// Stepping costs one per row. A reset costs `target + 1` signals plus
/// `reset_overhead` step-equivalents for the device to settle after the
/// jump. On equal cost, stepping wins.
pub fn plan_from(current: usize, target: usize, reset_overhead: u32) -> NavigationPath {
    let (strategy, steps) = if target >= current {
        (Strategy::StepForward, rows(target - current))
    } else {
        (Strategy::StepBackward, rows(current - target))
    };
    let reset_steps = rows(target).saturating_add(1);
    let reset_cost = reset_steps.saturating_add(reset_overhead);

    let (strategy, step_count, cost) = if reset_cost < steps {
        (Strategy::ResetThenForward, reset_steps, reset_cost)
    } else {
        (strategy, steps, steps)
    };

    NavigationPath {
        strategy,
        step_count,
        cost,
        from_position: current,
        target_position: target,
    }
}

/// Delays the device needs between navigation signals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationTiming {
    /// Wait after each row move; must be non-zero
    pub step_delay: Duration,
    /// Wait after a jump to the top
    pub reset_settle: Duration,
}

impl Default for NavigationTiming {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(50),
            reset_settle: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug)]
struct Cursor {
    position: usize,
    needs_resync: bool,
}

/// Owns the single browse cursor shared by every deck.
pub struct NavigationPlanner {
    cursor: Mutex<Cursor>,
    surface: ControlSurface,
    timing: NavigationTiming,
}

impl NavigationPlanner {
    /// Cursor starts at the top of the list
    pub fn new(surface: ControlSurface, timing: NavigationTiming) -> Self {
        Self {
            cursor: Mutex::new(Cursor {
                position: 0,
                needs_resync: false,
            }),
            surface,
            timing,
        }
    }

    /// Step-equivalents charged for the settle after a reset
    pub fn reset_overhead(&self) -> u32 {
        step_equivalents(self.timing.reset_settle, self.timing.step_delay)
    }

    pub async fn current_position(&self) -> usize {
        self.cursor.lock().await.position
    }

    pub async fn needs_resync(&self) -> bool {
        self.cursor.lock().await.needs_resync
    }

    /// Cheapest path from the current cursor estimate
    pub async fn plan(&self, target: usize) -> NavigationPath {
        let cursor = self.cursor.lock().await;
        plan_from(cursor.position, target, self.reset_overhead())
    }

    /// Send a planned path and load the row into `deck`.
    ///
    /// The path must have been planned from the current cursor. The cursor
    /// moves to the target only if every signal went out.
    pub async fn execute(&self, path: &NavigationPath, deck: DeckId) -> Result<(), NavigationError> {
        let mut cursor = self.cursor.lock().await;
        Self::check_trusted(&cursor)?;
        if cursor.position != path.from_position {
            return Err(NavigationError::StalePlan {
                planned_from: path.from_position,
                current: cursor.position,
            });
        }
        self.run(&mut cursor, path, deck).await
    }

    /// Plan and execute under one lock, so no other navigation can move the
    /// cursor in between.
    pub async fn navigate_and_load(
        &self,
        target: usize,
        deck: DeckId,
    ) -> Result<NavigationPath, NavigationError> {
        let mut cursor = self.cursor.lock().await;
        Self::check_trusted(&cursor)?;
        let path = plan_from(cursor.position, target, self.reset_overhead());
        self.run(&mut cursor, &path, deck).await?;
        Ok(path)
    }

    /// Jump to the top and trust position 0 again
    pub async fn resync(&self) -> Result<(), NavigationError> {
        let mut cursor = self.cursor.lock().await;
        info!("Resyncing browse cursor (estimate was {})", cursor.position);
        self.surface
            .trigger(LogicalControl::BrowseReset)
            .map_err(|source| {
                cursor.needs_resync = true;
                NavigationError::Transport {
                    sent: 0,
                    planned: 1,
                    source,
                }
            })?;
        sleep(self.timing.reset_settle).await;
        cursor.position = 0;
        cursor.needs_resync = false;
        Ok(())
    }

    fn check_trusted(cursor: &Cursor) -> Result<(), NavigationError> {
        if cursor.needs_resync {
            Err(NavigationError::DesyncSuspected)
        } else {
            Ok(())
        }
    }

    async fn run(
        &self,
        cursor: &mut Cursor,
        path: &NavigationPath,
        deck: DeckId,
    ) -> Result<(), NavigationError> {
        debug!("Navigating {}", path);
        let planned = path.step_count.saturating_add(1);
        let mut sent = 0u32;

        let result = self.send_path(path, deck, &mut sent).await;
        match result {
            Ok(()) => {
                cursor.position = path.target_position;
                Ok(())
            }
            Err(source) => {
                warn!(
                    "Navigation to {} failed after {} of {} signals: {}",
                    path.target_position, sent, planned, source
                );
                cursor.needs_resync = true;
                Err(NavigationError::Transport {
                    sent,
                    planned,
                    source,
                })
            }
        }
    }

    async fn send_path(
        &self,
        path: &NavigationPath,
        deck: DeckId,
        sent: &mut u32,
    ) -> Result<(), TransportError> {
        let (control, moves) = match path.strategy {
            Strategy::StepForward => (LogicalControl::BrowseDown, path.step_count),
            Strategy::StepBackward => (LogicalControl::BrowseUp, path.step_count),
            Strategy::ResetThenForward => {
                self.surface.trigger(LogicalControl::BrowseReset)?;
                *sent += 1;
                sleep(self.timing.reset_settle).await;
                (LogicalControl::BrowseDown, path.step_count.saturating_sub(1))
            }
        };

        for _ in 0..moves {
            self.surface.trigger(control)?;
            *sent += 1;
            sleep(self.timing.step_delay).await;
        }

        self.surface.trigger(LogicalControl::LoadSelected(deck))?;
        *sent += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{ControlMap, SimulatedTransport};
    use std::sync::Arc;

    fn planner() -> (Arc<SimulatedTransport>, NavigationPlanner) {
        let transport = Arc::new(SimulatedTransport::new());
        let surface = ControlSurface::new(transport.clone(), ControlMap::default());
        (transport, NavigationPlanner::new(surface, NavigationTiming::default()))
    }

    #[test]
    fn test_plan_from_literal_costs() {
        let forward = plan_from(3, 8, 0);
        assert_eq!((forward.strategy, forward.step_count), (Strategy::StepForward, 5));

        let backward = plan_from(8, 6, 0);
        assert_eq!((backward.strategy, backward.step_count), (Strategy::StepBackward, 2));

        let reset = plan_from(100, 2, 0);
        assert_eq!((reset.strategy, reset.step_count), (Strategy::ResetThenForward, 3));

        let stay = plan_from(7, 7, 0);
        assert_eq!((stay.strategy, stay.step_count), (Strategy::StepForward, 0));
    }

    #[test]
    fn test_ties_prefer_stepping() {
        // backward 5 vs reset 4 + 1
        let path = plan_from(9, 4, 0);
        assert_eq!(path.strategy, Strategy::StepBackward);
        assert_eq!(path.cost, 5);
    }

    #[test]
    fn test_minimality_over_all_pairs() {
        for overhead in [0u32, 30] {
            for current in 0..60usize {
                for target in 0..60usize {
                    let path = plan_from(current, target, overhead);
                    let forward = if target >= current { target - current } else { usize::MAX };
                    let backward = if target <= current { current - target } else { usize::MAX };
                    let reset = target + 1 + overhead as usize;
                    let best = forward.min(backward).min(reset);
                    assert_eq!(path.cost as usize, best, "{} -> {}", current, target);
                }
            }
        }
    }

    #[test]
    fn test_reset_overhead_from_timing() {
        let (_, planner) = planner();
        assert_eq!(planner.reset_overhead(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_plan_reflects_cursor_after_execute() {
        let (transport, planner) = planner();

        let first = planner.plan(50).await;
        assert_eq!((first.strategy, first.step_count), (Strategy::StepForward, 50));
        planner.execute(&first, DeckId::A).await.unwrap();
        assert_eq!(planner.current_position().await, 50);
        assert_eq!(transport.count_controller(0, 21), 50);
        assert_eq!(transport.count_controller(0, 30), 1);

        let second = planner.plan(10).await;
        assert_eq!((second.strategy, second.step_count), (Strategy::StepBackward, 40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_path_sends_reset_then_moves() {
        let (transport, planner) = planner();
        planner.navigate_and_load(200, DeckId::B).await.unwrap();
        transport.clear();

        let path = planner.navigate_and_load(3, DeckId::B).await.unwrap();
        assert_eq!(path.strategy, Strategy::ResetThenForward);
        assert_eq!(path.step_count, 4);
        assert_eq!(transport.count_controller(0, 22), 1);
        assert_eq!(transport.count_controller(0, 21), 3);
        assert_eq!(transport.count_controller(1, 30), 1);
        assert_eq!(planner.current_position().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_are_spaced_by_the_step_delay() {
        let (_, planner) = planner();
        let started = tokio::time::Instant::now();
        planner.navigate_and_load(10, DeckId::A).await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(520));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_plan_rejected() {
        let (_, planner) = planner();
        let stale = planner.plan(5).await;
        planner.navigate_and_load(2, DeckId::A).await.unwrap();

        let err = planner.execute(&stale, DeckId::A).await.unwrap_err();
        assert_eq!(
            err,
            NavigationError::StalePlan {
                planned_from: 0,
                current: 2
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_failure_requires_resync() {
        let (transport, planner) = planner();
        planner.navigate_and_load(4, DeckId::A).await.unwrap();

        transport.fail_next(1);
        let err = planner.navigate_and_load(9, DeckId::A).await.unwrap_err();
        assert!(matches!(
            err,
            NavigationError::Transport {
                sent: 0,
                planned: 6,
                ..
            }
        ));
        assert_eq!(planner.current_position().await, 4, "cursor left stale");
        assert!(planner.needs_resync().await);

        let refused = planner.navigate_and_load(9, DeckId::A).await.unwrap_err();
        assert_eq!(refused, NavigationError::DesyncSuspected);

        planner.resync().await.unwrap();
        assert_eq!(planner.current_position().await, 0);
        assert!(!planner.needs_resync().await);
        planner.navigate_and_load(9, DeckId::A).await.unwrap();
        assert_eq!(planner.current_position().await, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_failure_keeps_desync() {
        let (transport, planner) = planner();
        transport.set_online(false);
        assert!(planner.resync().await.is_err());
        assert!(planner.needs_resync().await);
    }
}
