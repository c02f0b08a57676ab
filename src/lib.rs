//! Improv serial WiFi provisioning library.
//!
//! Exposes the pure-logic modules for integration testing and host tooling.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each adapter.

#![deny(unused_must_use)]

#[cfg(all(target_os = "espidf", not(feature = "espidf")))]
compile_error!("building for ESP-IDF requires the `espidf` feature (cargo build --features espidf)");

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod protocol;

pub mod adapters;
