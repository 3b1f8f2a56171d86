//! RadThing firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod connectivity;
pub mod discovery;
pub mod error;
pub mod ha;
pub mod pins;

// The ESP-IDF implementations are guarded by cfg attributes inside;
// host builds get the simulation variants.
pub mod adapters;
