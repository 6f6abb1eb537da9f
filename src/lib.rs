//! Tallymaster firmware library.
//!
//! Exposes the pure-logic modules for integration testing and the host
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod clock;
pub mod config;
pub mod cycle_timer;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod slaves;
