//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the provisioning rules of the Improv service:
//! command dispatch, state announcements and the association check.
//! All interaction with the device happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
pub mod timeout;
