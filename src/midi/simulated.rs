// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Simulated device transport.
//!
//! Records every signal instead of sending it. Used for dry runs
//! (degraded mode, every command is assumed to succeed) and as the test
//! double. Failures can be injected deterministically or from a seeded RNG.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use super::{control_change_bytes, DeviceTransport};
use crate::error::TransportError;

/// A signal captured by the simulated transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentSignal {
    pub channel: u8,
    pub controller: u8,
    pub value: u8,
}

struct FaultInjector {
    rng: StdRng,
    drop_rate: f64,
}

/// In-process stand-in for the console
pub struct SimulatedTransport {
    signals: Mutex<Vec<SentSignal>>,
    online: AtomicBool,
    fail_next: AtomicU32,
    faults: Mutex<Option<FaultInjector>>,
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self {
            signals: Mutex::new(Vec::new()),
            online: AtomicBool::new(true),
            fail_next: AtomicU32::new(0),
            faults: Mutex::new(None),
        }
    }

    /// Randomly drop a fraction of signals, reproducibly for a given seed
    pub fn with_faults(seed: u64, drop_rate: f64) -> Self {
        let transport = Self::new();
        if let Ok(mut faults) = transport.faults.lock() {
            *faults = Some(FaultInjector {
                rng: StdRng::seed_from_u64(seed),
                drop_rate: drop_rate.clamp(0.0, 1.0),
            });
        }
        transport
    }

    /// Take the device channel up or down
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Make the next `count` sends fail with a transient error
    pub fn fail_next(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Everything delivered so far, in order
    pub fn signals(&self) -> Vec<SentSignal> {
        self.signals.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Number of delivered signals matching a controller number
    pub fn count_controller(&self, channel: u8, controller: u8) -> usize {
        self.signals()
            .iter()
            .filter(|s| s.channel == channel && s.controller == controller)
            .count()
    }

    /// Forget recorded signals
    pub fn clear(&self) {
        if let Ok(mut signals) = self.signals.lock() {
            signals.clear();
        }
    }

    fn should_drop(&self) -> bool {
        let forced = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            return true;
        }
        match self.faults.lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(faults) => faults.rng.gen_bool(faults.drop_rate),
                None => false,
            },
            Err(_) => false,
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceTransport for SimulatedTransport {
    fn send_control_change(
        &self,
        channel: u8,
        controller: u8,
        value: u8,
    ) -> Result<(), TransportError> {
        control_change_bytes(channel, controller, value)?;
        if !self.online.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("simulated device offline".into()));
        }
        if self.should_drop() {
            return Err(TransportError::Send("simulated signal drop".into()));
        }
        trace!("sim ch {} cc {} = {}", channel, controller, value);
        self.signals
            .lock()
            .map_err(|_| TransportError::Unavailable("signal log poisoned".into()))?
            .push(SentSignal {
                channel,
                controller,
                value,
            });
        Ok(())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_signals_in_order() {
        let transport = SimulatedTransport::new();
        transport.send_control_change(0, 20, 127).unwrap();
        transport.send_control_change(1, 31, 127).unwrap();

        let signals = transport.signals();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[1], SentSignal { channel: 1, controller: 31, value: 127 });
        assert_eq!(transport.count_controller(0, 20), 1);

        transport.clear();
        assert!(transport.signals().is_empty());
    }

    #[test]
    fn test_offline_is_unavailable() {
        let transport = SimulatedTransport::new();
        transport.set_online(false);
        let err = transport.send_control_change(0, 1, 1).unwrap_err();
        assert!(err.is_unavailable());
        assert!(transport.signals().is_empty());
    }

    #[test]
    fn test_fail_next_counts_down() {
        let transport = SimulatedTransport::new();
        transport.fail_next(2);
        assert!(transport.send_control_change(0, 1, 1).is_err());
        assert!(transport.send_control_change(0, 1, 1).is_err());
        assert!(transport.send_control_change(0, 1, 1).is_ok());
        assert_eq!(transport.signals().len(), 1);
    }

    #[test]
    fn test_seeded_faults_are_reproducible() {
        let run = |seed| {
            let transport = SimulatedTransport::with_faults(seed, 0.5);
            (0..32)
                .map(|_| transport.send_control_change(0, 1, 1).is_ok())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
        assert!(run(7).iter().any(|ok| !ok));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let transport = SimulatedTransport::new();
        assert!(matches!(
            transport.send_control_change(0, 1, 128),
            Err(TransportError::InvalidValue { .. })
        ));
    }
}
