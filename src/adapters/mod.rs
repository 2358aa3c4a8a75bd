//! Concrete adapters behind the port traits.
//!
//! Every adapter is dual-target: real ESP-IDF peripheral code under
//! `#[cfg(target_os = "espidf")]`, a deterministic simulation backend on
//! every other target so the full pipeline runs in host tests.

pub mod analog_level;
pub mod http_push;
pub mod log_sink;
pub mod sd_volume;
pub mod sntp_clock;
