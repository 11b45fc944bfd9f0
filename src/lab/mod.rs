//! Deterministic lab host for tests and demos.
//!
//! The lab host provides:
//!
//! - A microtask queue that promise cells dispatch through
//! - Virtual time (no wall-clock dependencies)
//! - Timers standing in for the external code that settles cells later

pub mod host;

pub use host::{LabHost, LabReport, TimerHandle};
