//! Provisioning window tracking.
//!
//! The service only consumes a `timed_out` flag; the polling loop owns the
//! clock. [`ProvisioningWatch`] turns "time spent in `Provisioning`" into
//! that flag.

use crate::protocol::DeviceState;

#[derive(Debug, Clone)]
pub struct ProvisioningWatch {
    timeout_ms: u32,
    started_ms: Option<u32>,
}

impl ProvisioningWatch {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            started_ms: None,
        }
    }

    /// Feed the current state. Returns `true` once the service has been in
    /// `Provisioning` for at least the timeout. Leaving `Provisioning` rearms.
    pub fn observe(&mut self, state: DeviceState, now_ms: u32) -> bool {
        if state != DeviceState::Provisioning {
            self.started_ms = None;
            return false;
        }
        let started = *self.started_ms.get_or_insert(now_ms);
        now_ms.wrapping_sub(started) >= self.timeout_ms
    }

    pub fn clear(&mut self) {
        self.started_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.started_ms.is_some()
    }
}
