// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Logical control mapping.
//!
//! The console's MIDI mapping is external configuration. The engine only
//! names logical operations; [`ControlMap`] resolves them to
//! `(channel, controller, value)` triples and [`ControlSurface`] sends them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{messages, DeviceTransport};
use crate::deck::DeckId;
use crate::error::TransportError;

/// A named operation on the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalControl {
    /// Move the browse selection one row up
    BrowseUp,
    /// Move the browse selection one row down
    BrowseDown,
    /// Jump the browse selection to the first row
    BrowseReset,
    /// Load the selected row into a deck
    LoadSelected(DeckId),
    Play(DeckId),
    Stop(DeckId),
    Pause(DeckId),
    /// Channel fader (continuous)
    Level(DeckId),
    /// Crossfader (continuous)
    Crossfader,
}

impl LogicalControl {
    /// Continuous controls take a computed value instead of the bound one
    pub fn is_continuous(&self) -> bool {
        matches!(self, LogicalControl::Level(_) | LogicalControl::Crossfader)
    }
}

impl fmt::Display for LogicalControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalControl::BrowseUp => write!(f, "browse up"),
            LogicalControl::BrowseDown => write!(f, "browse down"),
            LogicalControl::BrowseReset => write!(f, "browse reset"),
            LogicalControl::LoadSelected(deck) => write!(f, "load deck {}", deck),
            LogicalControl::Play(deck) => write!(f, "play deck {}", deck),
            LogicalControl::Stop(deck) => write!(f, "stop deck {}", deck),
            LogicalControl::Pause(deck) => write!(f, "pause deck {}", deck),
            LogicalControl::Level(deck) => write!(f, "level deck {}", deck),
            LogicalControl::Crossfader => write!(f, "crossfader"),
        }
    }
}

/// A single CC binding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlBinding {
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Controller number (0-127)
    pub controller: u8,
    /// Value sent for button-style controls (0-127)
    #[serde(default = "default_press_value")]
    pub value: u8,
    /// Follow the press with a value-0 release
    #[serde(default)]
    pub release: bool,
}

fn default_press_value() -> u8 {
    127
}

impl ControlBinding {
    pub fn new(channel: u8, controller: u8) -> Self {
        Self {
            channel,
            controller,
            value: default_press_value(),
            release: false,
        }
    }

    fn validate(&self, name: &str) -> Result<(), String> {
        if self.channel > messages::MAX_CHANNEL {
            return Err(format!("{}: channel {} out of range 0-15", name, self.channel));
        }
        if self.controller > messages::MAX_DATA || self.value > messages::MAX_DATA {
            return Err(format!(
                "{}: controller {} / value {} out of range 0-127",
                name, self.controller, self.value
            ));
        }
        Ok(())
    }
}

/// Per-deck bindings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeckControls {
    pub load: ControlBinding,
    pub play: ControlBinding,
    pub stop: ControlBinding,
    pub pause: ControlBinding,
    pub level: ControlBinding,
}

impl DeckControls {
    /// Conventional layout: one channel per deck, fixed controller numbers
    pub fn on_channel(channel: u8) -> Self {
        Self {
            load: ControlBinding::new(channel, 30),
            play: ControlBinding::new(channel, 31),
            stop: ControlBinding::new(channel, 32),
            pause: ControlBinding::new(channel, 33),
            level: ControlBinding::new(channel, 7),
        }
    }
}

/// Logical control → CC table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlMap {
    #[serde(default = "default_browse_up")]
    pub browse_up: ControlBinding,
    #[serde(default = "default_browse_down")]
    pub browse_down: ControlBinding,
    #[serde(default = "default_browse_reset")]
    pub browse_reset: ControlBinding,
    #[serde(default = "default_crossfader")]
    pub crossfader: ControlBinding,
    #[serde(default = "default_decks")]
    pub decks: BTreeMap<DeckId, DeckControls>,
}

fn default_browse_up() -> ControlBinding {
    ControlBinding::new(0, 20)
}
fn default_browse_down() -> ControlBinding {
    ControlBinding::new(0, 21)
}
fn default_browse_reset() -> ControlBinding {
    ControlBinding::new(0, 22)
}
fn default_crossfader() -> ControlBinding {
    ControlBinding::new(0, 8)
}
fn default_decks() -> BTreeMap<DeckId, DeckControls> {
    let mut decks = BTreeMap::new();
    decks.insert(DeckId::A, DeckControls::on_channel(0));
    decks.insert(DeckId::B, DeckControls::on_channel(1));
    decks
}

impl Default for ControlMap {
    fn default() -> Self {
        Self {
            browse_up: default_browse_up(),
            browse_down: default_browse_down(),
            browse_reset: default_browse_reset(),
            crossfader: default_crossfader(),
            decks: default_decks(),
        }
    }
}

impl ControlMap {
    /// Resolve a logical control to its binding
    pub fn binding(&self, control: LogicalControl) -> Option<ControlBinding> {
        let deck = |id: DeckId| self.decks.get(&id);
        match control {
            LogicalControl::BrowseUp => Some(self.browse_up),
            LogicalControl::BrowseDown => Some(self.browse_down),
            LogicalControl::BrowseReset => Some(self.browse_reset),
            LogicalControl::Crossfader => Some(self.crossfader),
            LogicalControl::LoadSelected(id) => deck(id).map(|d| d.load),
            LogicalControl::Play(id) => deck(id).map(|d| d.play),
            LogicalControl::Stop(id) => deck(id).map(|d| d.stop),
            LogicalControl::Pause(id) => deck(id).map(|d| d.pause),
            LogicalControl::Level(id) => deck(id).map(|d| d.level),
        }
    }

    /// Check every binding is inside the MIDI range
    pub fn validate(&self) -> Result<(), String> {
        self.browse_up.validate("browse_up")?;
        self.browse_down.validate("browse_down")?;
        self.browse_reset.validate("browse_reset")?;
        self.crossfader.validate("crossfader")?;
        for (id, deck) in &self.decks {
            let prefix = format!("decks.{}", id);
            deck.load.validate(&format!("{}.load", prefix))?;
            deck.play.validate(&format!("{}.play", prefix))?;
            deck.stop.validate(&format!("{}.stop", prefix))?;
            deck.pause.validate(&format!("{}.pause", prefix))?;
            deck.level.validate(&format!("{}.level", prefix))?;
        }
        Ok(())
    }
}

/// Sends logical controls through a transport.
#[derive(Clone)]
pub struct ControlSurface {
    transport: Arc<dyn DeviceTransport>,
    map: Arc<ControlMap>,
}

impl ControlSurface {
    pub fn new(transport: Arc<dyn DeviceTransport>, map: ControlMap) -> Self {
        Self {
            transport,
            map: Arc::new(map),
        }
    }

    /// The active control map
    pub fn map(&self) -> &ControlMap {
        &self.map
    }

    /// Press a button-style control
    pub fn trigger(&self, control: LogicalControl) -> Result<(), TransportError> {
        let binding = self.resolve(control)?;
        debug!(
            "{} -> ch {} cc {} = {}",
            control, binding.channel, binding.controller, binding.value
        );
        self.transport
            .send_control_change(binding.channel, binding.controller, binding.value)?;
        if binding.release {
            self.transport
                .send_control_change(binding.channel, binding.controller, 0)?;
        }
        Ok(())
    }

    /// Set a continuous control from a normalized 0.0-1.0 position
    pub fn set(&self, control: LogicalControl, position: f32) -> Result<(), TransportError> {
        let binding = self.resolve(control)?;
        let value = (position.clamp(0.0, 1.0) * messages::MAX_DATA as f32).round() as u8;
        debug!(
            "{} -> ch {} cc {} = {} ({:.2})",
            control, binding.channel, binding.controller, value, position
        );
        self.transport
            .send_control_change(binding.channel, binding.controller, value)
    }

    fn resolve(&self, control: LogicalControl) -> Result<ControlBinding, TransportError> {
        self.map
            .binding(control)
            .ok_or_else(|| TransportError::Unmapped(control.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::SimulatedTransport;

    #[test]
    fn test_default_map_resolves_both_decks() {
        let map = ControlMap::default();
        assert_eq!(map.binding(LogicalControl::Play(DeckId::A)).unwrap().channel, 0);
        assert_eq!(map.binding(LogicalControl::Play(DeckId::B)).unwrap().channel, 1);
        assert!(map.binding(LogicalControl::Play(DeckId::C)).is_none());
        assert!(map.validate().is_ok());
    }

    #[test]
    fn test_parse_control_map() {
        let yaml = r#"
browse_down:
  channel: 2
  controller: 64
decks:
  a:
    load: { channel: 0, controller: 70 }
    play: { channel: 0, controller: 71, release: true }
    stop: { channel: 0, controller: 72 }
    pause: { channel: 0, controller: 71, value: 0 }
    level: { channel: 0, controller: 7 }
"#;
        let map: ControlMap = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(map.browse_down.channel, 2);
        assert_eq!(map.browse_down.value, 127);
        assert_eq!(map.browse_up, default_browse_up());
        assert!(map.decks[&DeckId::A].play.release);
        assert_eq!(map.decks[&DeckId::A].pause.value, 0);
        assert!(!map.decks.contains_key(&DeckId::B));
    }

    #[test]
    fn test_validate_rejects_bad_channel() {
        let mut map = ControlMap::default();
        map.browse_up.channel = 16;
        let err = map.validate().unwrap_err();
        assert!(err.contains("browse_up"));
    }

    #[test]
    fn test_surface_trigger_and_release() {
        let transport = Arc::new(SimulatedTransport::new());
        let mut map = ControlMap::default();
        map.browse_down.release = true;
        let surface = ControlSurface::new(transport.clone(), map);

        surface.trigger(LogicalControl::BrowseDown).unwrap();
        let sent = transport.signals();
        assert_eq!(sent.len(), 2);
        assert_eq!((sent[0].controller, sent[0].value), (21, 127));
        assert_eq!((sent[1].controller, sent[1].value), (21, 0));
    }

    #[test]
    fn test_surface_continuous_scaling() {
        let transport = Arc::new(SimulatedTransport::new());
        let surface = ControlSurface::new(transport.clone(), ControlMap::default());

        surface.set(LogicalControl::Crossfader, 0.5).unwrap();
        surface.set(LogicalControl::Crossfader, 1.5).unwrap();
        let values: Vec<u8> = transport.signals().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![64, 127]);
    }

    #[test]
    fn test_surface_unmapped_control() {
        let transport = Arc::new(SimulatedTransport::new());
        let surface = ControlSurface::new(transport.clone(), ControlMap::default());

        let err = surface.trigger(LogicalControl::Play(DeckId::D)).unwrap_err();
        assert_eq!(err, TransportError::Unmapped("play deck D".into()));
        assert!(transport.signals().is_empty());
    }
}
