//! Provisioning state machine.
//!
//! ```text
//!   Authorized ──CredentialsSubmitted──▶ Provisioning ──Connected──▶ Provisioned
//!        ▲                                 │      ▲                       │
//!        └──────────── TimedOut ───────────┘      └─ CredentialsSubmitted ┘
//! ```
//!
//! Pure state logic only. The [`ImprovService`](crate::app::service::ImprovService)
//! performs the side effects (frames, network calls) around each transition.

use log::info;

pub use crate::protocol::DeviceState;

/// Events that can move the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningEvent {
    /// A `WifiSettings` RPC arrived.
    CredentialsSubmitted,
    /// The network reported association (or AP mode) while provisioning.
    Connected,
    /// The caller's provisioning window ran out.
    TimedOut,
}

/// Transition table. `None` means the event is ignored in `state`.
pub fn next_state(state: DeviceState, event: ProvisioningEvent) -> Option<DeviceState> {
    use DeviceState::{Authorized, Provisioned, Provisioning};
    use ProvisioningEvent::{Connected, CredentialsSubmitted, TimedOut};

    match (state, event) {
        (_, CredentialsSubmitted) => Some(Provisioning),
        (Provisioning, Connected) => Some(Provisioned),
        (Provisioning, TimedOut) => Some(Authorized),
        _ => None,
    }
}

/// Holder for the current state; only [`apply`](Self::apply) mutates it.
#[derive(Debug)]
pub struct ProvisioningFsm {
    current: DeviceState,
}

impl ProvisioningFsm {
    pub fn new(initial: DeviceState) -> Self {
        Self { current: initial }
    }

    /// Initial state from the network status at boot.
    pub fn initial_state(station_associated: bool) -> DeviceState {
        if station_associated {
            DeviceState::Provisioned
        } else {
            DeviceState::Authorized
        }
    }

    pub fn current_state(&self) -> DeviceState {
        self.current
    }

    /// Apply `event`. Returns `(from, to)` if it was accepted.
    pub fn apply(&mut self, event: ProvisioningEvent) -> Option<(DeviceState, DeviceState)> {
        let to = next_state(self.current, event)?;
        let from = self.current;
        self.current = to;
        info!("Improv FSM: {} -> {} ({:?})", from.name(), to.name(), event);
        Some((from, to))
    }
}
