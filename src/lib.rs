//! Beverage tap simulator library.
//!
//! A tap listens for commands on `{prefix}/{id}/cmd`, drives a small
//! state machine, and simulates a pour by publishing cumulative weight
//! readings on `{prefix}/{id}/amount` at a fixed cadence.  Everything
//! that touches the outside world sits behind a port trait in
//! [`app::ports`], so the whole simulator runs against in-memory mocks
//! in tests.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pour;
pub mod runtime;
pub mod topics;
