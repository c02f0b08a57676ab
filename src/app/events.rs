//! Outbound application events.
//!
//! The [`ImprovService`](super::service::ImprovService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. They mirror what goes
//! over the wire, for the device's own log.

use crate::protocol::command::Ssid;
use crate::protocol::{DeviceState, ErrorCode};

/// Structured events emitted by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImprovEvent {
    /// The service was constructed (carries the initial state).
    Started(DeviceState),

    /// The provisioning state changed.
    StateChanged { from: DeviceState, to: DeviceState },

    /// An error frame was sent to the host.
    ErrorReported(ErrorCode),

    /// New WiFi credentials arrived. The password is never carried.
    CredentialsReceived { ssid: Ssid, persisted: bool },
}
