//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the cycle driver for the tally master: polling,
//! aggregation, link diagnostics and sink fan-out.  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
