//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the tap: command
//! interpretation, the state machine, and pour pacing.  All interaction
//! with the messaging layer, the display, and the clock happens through
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without a broker.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
