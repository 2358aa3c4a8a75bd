//! Flume monitor node library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each adapter.

#![deny(unused_must_use)]

pub mod app;
pub mod config;

mod error;

pub use error::{Error, Result};

// Adapters are dual-target: real peripherals on ESP-IDF, deterministic
// simulation backends everywhere else.
pub mod adapters;
