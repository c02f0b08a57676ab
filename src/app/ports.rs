//! Port traits: the hexagonal boundary between protocol logic and the device.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ImprovService (domain)
//! ```
//!
//! Driven adapters (WiFi, NVS, event sinks) implement these traits. The
//! [`ImprovService`](super::service::ImprovService) takes them as generic
//! parameters at each call, so the protocol core never touches ESP-IDF.
//! The byte channel itself is [`Transport`](crate::protocol::transport::Transport).
//!
//! ## Security notes
//!
//! - **CredentialStore** implementations SHOULD place credentials on the
//!   encrypted NVS partition.
//! - Passwords must never be logged by adapters.

use core::fmt;
use core::net::Ipv4Addr;

use crate::protocol::command::WifiCredentials;

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain ↔ WiFi stack)
// ───────────────────────────────────────────────────────────────

/// Radio operating mode as reported by the WiFi stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiMode {
    Off,
    Station,
    AccessPoint,
    /// Station and access point at once.
    Mixed,
}

/// Association status and the two control calls provisioning needs.
pub trait NetworkPort {
    fn mode(&self) -> WifiMode;

    /// Whether the station interface is associated with an AP.
    fn is_associated(&self) -> bool;

    /// Drop any current association. Never fails from the caller's view.
    fn disconnect(&mut self);

    /// Switch to station mode and start associating with `ssid`.
    /// Returns once the attempt is started, not when it completes.
    fn begin_station(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError>;

    /// Station IPv4 address, if one has been assigned.
    fn local_address(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Credential store port (driven adapter: domain ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// Persists the WiFi credentials submitted over Improv.
pub trait CredentialStore {
    fn write_wifi_config(&mut self, ssid: &str, password: &str) -> Result<(), StoreError>;

    /// Credentials saved by a previous [`write_wifi_config`](Self::write_wifi_config).
    fn load_wifi_config(&self) -> Result<Option<WifiCredentials>, StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The service emits structured [`ImprovEvent`](super::events::ImprovEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ImprovEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`NetworkPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// SSID empty, too long or not printable ASCII.
    InvalidSsid,
    /// Password neither empty nor 8–64 bytes.
    InvalidPassword,
    /// The WiFi driver refused the request.
    Driver,
}

/// Errors from [`CredentialStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Storage partition is full.
    Full,
    /// Stored blob failed to deserialize.
    Corrupted,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::Driver => write!(f, "WiFi driver error"),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "storage full"),
            Self::Corrupted => write!(f, "stored credentials corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for NetworkError {}

impl std::error::Error for StoreError {}
