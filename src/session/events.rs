// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session events.
//!
//! Fire-and-forget notifications for logging, GUI and chat layers. Every
//! event is also written to the log, so a run with no subscriber still
//! leaves a full trace.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::catalog::TrackId;
use crate::deck::DeckId;
use crate::navigation::Strategy;
use crate::scoring::{EventType, VenueType};
use crate::session::orchestrator::EndReason;

/// Something the session did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        venue: VenueType,
        event: EventType,
        target_secs: u64,
    },
    TrackSelected {
        track_id: TrackId,
        display_name: String,
        score: f64,
        deck: DeckId,
    },
    NavigationStarted {
        track_id: TrackId,
        from_position: usize,
        target_position: usize,
        strategy: Strategy,
        step_count: u32,
    },
    NavigationCompleted {
        track_id: TrackId,
        deck: DeckId,
        verified: bool,
    },
    TransitionStarted {
        from: DeckId,
        to: DeckId,
    },
    TransitionCompleted {
        from: DeckId,
        to: DeckId,
        verified: bool,
    },
    CommandFailed {
        deck: DeckId,
        reason: String,
    },
    CycleSkipped {
        reason: String,
    },
    SessionEnded {
        reason: EndReason,
        tracks_played: usize,
    },
}

impl SessionEvent {
    /// Short event name, matching the serialized tag
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted { .. } => "session_started",
            SessionEvent::TrackSelected { .. } => "track_selected",
            SessionEvent::NavigationStarted { .. } => "navigation_started",
            SessionEvent::NavigationCompleted { .. } => "navigation_completed",
            SessionEvent::TransitionStarted { .. } => "transition_started",
            SessionEvent::TransitionCompleted { .. } => "transition_completed",
            SessionEvent::CommandFailed { .. } => "command_failed",
            SessionEvent::CycleSkipped { .. } => "cycle_skipped",
            SessionEvent::SessionEnded { .. } => "session_ended",
        }
    }

    fn log(&self) {
        match self {
            SessionEvent::SessionStarted {
                venue,
                event,
                target_secs,
            } => info!("Session started: {:?} / {:?} for {}s", venue, event, target_secs),
            SessionEvent::TrackSelected {
                track_id,
                display_name,
                score,
                deck,
            } => info!(
                "Selected {} ({}) for deck {}, score {:.2}",
                display_name, track_id, deck, score
            ),
            SessionEvent::NavigationStarted {
                from_position,
                target_position,
                strategy,
                step_count,
                ..
            } => info!(
                "Navigating {} -> {} via {} ({} steps)",
                from_position, target_position, strategy, step_count
            ),
            SessionEvent::NavigationCompleted {
                track_id,
                deck,
                verified,
            } => info!("Loaded {} on deck {} (verified: {})", track_id, deck, verified),
            SessionEvent::TransitionStarted { from, to } => {
                info!("Crossfading deck {} -> deck {}", from, to)
            }
            SessionEvent::TransitionCompleted { from, to, verified } => info!(
                "Transition deck {} -> deck {} complete (verified: {})",
                from, to, verified
            ),
            SessionEvent::CommandFailed { deck, reason } => {
                warn!("Command failed on deck {}: {}", deck, reason)
            }
            SessionEvent::CycleSkipped { reason } => warn!("Cycle skipped: {}", reason),
            SessionEvent::SessionEnded {
                reason,
                tracks_played,
            } => info!("Session ended ({}), {} tracks played", reason, tracks_played),
        }
    }
}

/// Broadcast bus for session events
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Log the event and hand it to any subscribers. Nobody listening is fine.
    pub fn emit(&self, event: SessionEvent) {
        event.log();
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        bus.emit(SessionEvent::CycleSkipped {
            reason: "nothing to do".into(),
        });
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.emit(SessionEvent::TransitionStarted {
            from: DeckId::A,
            to: DeckId::B,
        });
        bus.emit(SessionEvent::TransitionCompleted {
            from: DeckId::A,
            to: DeckId::B,
            verified: true,
        });

        assert_eq!(rx.recv().await.unwrap().name(), "transition_started");
        assert_eq!(rx.recv().await.unwrap().name(), "transition_completed");
    }

    #[test]
    fn test_events_serialize_with_snake_case_tag() {
        let event = SessionEvent::CommandFailed {
            deck: DeckId::B,
            reason: "play on deck B failed".into(),
        };
        let yaml = serde_yaml::to_string(&event).unwrap();
        assert!(yaml.contains("type: command_failed"));
        assert!(yaml.contains("deck: b"));

        let ended = SessionEvent::SessionEnded {
            reason: EndReason::NoCandidate,
            tracks_played: 3,
        };
        let yaml = serde_yaml::to_string(&ended).unwrap();
        assert!(yaml.contains("reason: no_candidate"));
    }
}
