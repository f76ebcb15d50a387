// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Device transport abstraction.
//!
//! The console is driven only through MIDI Control Change messages. This
//! module provides the trait the engine talks to, the logical control map
//! that turns intents ("move down", "play deck A") into CC triples, and the
//! available backends (simulated, and `midir` hardware output).

pub mod controls;
#[cfg(feature = "midir")]
pub mod midir_backend;
pub mod simulated;

pub use controls::{ControlBinding, ControlMap, ControlSurface, DeckControls, LogicalControl};
#[cfg(feature = "midir")]
pub use midir_backend::{list_output_ports, print_output_ports, MidirTransport};
pub use simulated::{SentSignal, SimulatedTransport};

use crate::error::TransportError;

/// Trait for the outbound control channel to the console.
///
/// Implementations are fire-and-forget: a successful return only means the
/// signal left this process, never that the device acted on it.
pub trait DeviceTransport: Send + Sync {
    /// Send one Control Change message.
    ///
    /// # Arguments
    /// * `channel` - MIDI channel (0-15)
    /// * `controller` - Controller number (0-127)
    /// * `value` - Controller value (0-127)
    fn send_control_change(&self, channel: u8, controller: u8, value: u8)
        -> Result<(), TransportError>;

    /// Short name for logs
    fn name(&self) -> &str {
        "device"
    }
}

/// MIDI message constants
pub mod messages {
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const MAX_CHANNEL: u8 = 0x0F;
    pub const MAX_DATA: u8 = 0x7F;
}

/// Encode a Control Change message, rejecting out-of-range fields.
pub fn control_change_bytes(
    channel: u8,
    controller: u8,
    value: u8,
) -> Result<[u8; 3], TransportError> {
    if channel > messages::MAX_CHANNEL
        || controller > messages::MAX_DATA
        || value > messages::MAX_DATA
    {
        return Err(TransportError::InvalidValue {
            channel,
            controller,
            value,
        });
    }
    Ok([messages::CONTROL_CHANGE | channel, controller, value])
}
