// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Hardware MIDI output through `midir`.
//!
//! This module provides a `midir` implementation of the `DeviceTransport`
//! trait, connecting to the console's control port by index or by name.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use midir::{MidiOutput, MidiOutputConnection};
use tracing::info;

use super::{control_change_bytes, DeviceTransport};
use crate::error::TransportError;

const CLIENT_NAME: &str = "mixpilot";

/// Connected MIDI output port
pub struct MidirTransport {
    connection: Mutex<MidiOutputConnection>,
    port_name: String,
}

impl MidirTransport {
    /// Connect to the output port at `index` in the system list.
    pub fn new(index: usize) -> Result<Self> {
        let output = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;
        let ports = output.ports();
        let port = ports.get(index).ok_or_else(|| {
            anyhow!("MIDI output {} not found (only {} available)", index, ports.len())
        })?;
        let port_name = output
            .port_name(port)
            .unwrap_or_else(|_| format!("Unknown {}", index));
        let connection = output
            .connect(port, "mixpilot-out")
            .map_err(|e| anyhow!("Failed to connect to {}: {}", port_name, e))?;

        info!("Connected MIDI output '{}'", port_name);
        Ok(Self {
            connection: Mutex::new(connection),
            port_name,
        })
    }

    /// Connect to the first output port whose name contains `name`
    /// (case-insensitive).
    pub fn new_by_name(name: &str) -> Result<Self> {
        let needle = name.to_lowercase();
        let index = list_output_ports()?
            .into_iter()
            .find(|(_, port)| port.to_lowercase().contains(&needle))
            .map(|(index, _)| index)
            .ok_or_else(|| anyhow!("No MIDI output matching '{}' found", name))?;
        Self::new(index)
    }
}

impl DeviceTransport for MidirTransport {
    fn send_control_change(
        &self,
        channel: u8,
        controller: u8,
        value: u8,
    ) -> Result<(), TransportError> {
        let message = control_change_bytes(channel, controller, value)?;
        let mut connection = self
            .connection
            .lock()
            .map_err(|_| TransportError::Unavailable(format!("{} connection poisoned", self.port_name)))?;
        connection
            .send(&message)
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

/// List all MIDI output ports as (index, name) pairs.
pub fn list_output_ports() -> Result<Vec<(usize, String)>> {
    let output = MidiOutput::new(CLIENT_NAME)
        .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;
    Ok(output
        .ports()
        .iter()
        .enumerate()
        .map(|(i, port)| {
            let name = output
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown {}", i));
            (i, name)
        })
        .collect())
}

/// Print all MIDI output ports to stdout.
pub fn print_output_ports() -> Result<()> {
    let ports = list_output_ports()?;
    if ports.is_empty() {
        println!("No MIDI outputs found.");
    } else {
        println!("Available MIDI outputs:");
        for (i, name) in ports {
            println!("  {}: {}", i, name);
        }
    }
    Ok(())
}
