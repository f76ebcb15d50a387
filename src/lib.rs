// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! mixpilot - autonomous DJ console engine.
//!
//! Picks the next track from an ordered catalog, walks the console's
//! browse cursor to it one signal at a time, loads and plays it on the idle
//! deck and crossfades over. The console is blind: every command is
//! verified against a believed deck state, never against device feedback.

pub mod catalog;
pub mod config;
pub mod deck;
pub mod error;
pub mod midi;
pub mod music;
pub mod navigation;
pub mod scoring;
pub mod session;
pub mod timing;
