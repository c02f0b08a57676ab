//! System configuration parameters
//!
//! Timing and identity settings for the Improv serial service.
//! The identity is what `GetDeviceInfo` reports to the host.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::parser::DEFAULT_SILENCE_MS;

/// Capacity of each identity string.
pub const MAX_IDENTITY_FIELD_LEN: usize = 32;

pub type IdentityField = heapless::String<MAX_IDENTITY_FIELD_LEN>;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovConfig {
    // --- Serial ---
    /// UART baud rate
    pub baud_rate: u32,
    /// Max gap between bytes of one frame before it is discarded (ms)
    pub silence_window_ms: u32,

    // --- Provisioning ---
    /// How long to wait for association after credentials arrive (ms)
    pub provisioning_timeout_ms: u32,
    /// Main loop polling interval (ms)
    pub poll_interval_ms: u32,

    // --- Identity ---
    pub identity: DeviceIdentity,
}

impl Default for ImprovConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            silence_window_ms: DEFAULT_SILENCE_MS,

            provisioning_timeout_ms: 30_000,
            poll_interval_ms: 10,

            identity: DeviceIdentity::default(),
        }
    }
}

impl ImprovConfig {
    /// Range-check every field.
    pub fn validate(&self) -> Result<()> {
        if !(9_600..=921_600).contains(&self.baud_rate) {
            return Err(Error::Config("baud_rate must be 9600–921600"));
        }
        if !(10..=1_000).contains(&self.silence_window_ms) {
            return Err(Error::Config("silence_window_ms must be 10–1000"));
        }
        if !(5_000..=300_000).contains(&self.provisioning_timeout_ms) {
            return Err(Error::Config("provisioning_timeout_ms must be 5000–300000"));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms >= self.silence_window_ms {
            return Err(Error::Config(
                "poll_interval_ms must be non-zero and below silence_window_ms",
            ));
        }
        if self.identity.device_name().is_empty() {
            return Err(Error::Config("identity.device_name must not be empty"));
        }
        Ok(())
    }
}

/// What the device reports about itself. Fixed after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    firmware_name: IdentityField,
    firmware_version: IdentityField,
    hardware_variant: IdentityField,
    device_name: IdentityField,
}

impl DeviceIdentity {
    /// Build an identity, rejecting any field over
    /// [`MAX_IDENTITY_FIELD_LEN`] bytes.
    pub fn new(
        firmware_name: &str,
        firmware_version: &str,
        hardware_variant: &str,
        device_name: &str,
    ) -> Result<Self> {
        Ok(Self {
            firmware_name: field(firmware_name, "firmware_name too long")?,
            firmware_version: field(firmware_version, "firmware_version too long")?,
            hardware_variant: field(hardware_variant, "hardware_variant too long")?,
            device_name: field(device_name, "device_name too long")?,
        })
    }

    /// Same identity under a different device name (e.g. MAC-derived).
    pub fn with_device_name(&self, device_name: &str) -> Result<Self> {
        Ok(Self {
            device_name: field(device_name, "device_name too long")?,
            ..self.clone()
        })
    }

    pub fn firmware_name(&self) -> &str {
        &self.firmware_name
    }

    pub fn firmware_version(&self) -> &str {
        &self.firmware_version
    }

    pub fn hardware_variant(&self) -> &str {
        &self.hardware_variant
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            firmware_name: truncated(env!("CARGO_PKG_NAME")),
            firmware_version: truncated(env!("CARGO_PKG_VERSION")),
            hardware_variant: truncated("ESP32-S3"),
            device_name: truncated("improv-device"),
        }
    }
}

fn field(value: &str, reason: &'static str) -> Result<IdentityField> {
    let mut s = IdentityField::new();
    s.push_str(value).map_err(|()| Error::Identity(reason))?;
    Ok(s)
}

/// Longest prefix of `value` that fits, cut on a char boundary.
fn truncated(value: &str) -> IdentityField {
    let mut s = IdentityField::new();
    for c in value.chars() {
        if s.push(c).is_err() {
            break;
        }
    }
    s
}
