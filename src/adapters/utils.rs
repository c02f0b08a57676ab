//! Shared credential validation for the network adapters.

use crate::app::ports::NetworkError;
use crate::protocol::command::{MAX_PASSWORD_LEN, MAX_SSID_LEN};

/// Shortest WPA2 passphrase the radio accepts.
pub(super) const MIN_WPA2_PASSWORD_LEN: usize = 8;

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E` (space through tilde, inclusive).
pub(super) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// 1–32 printable ASCII bytes.
pub(super) fn validate_ssid(ssid: &str) -> Result<(), NetworkError> {
    if ssid.is_empty() || ssid.len() > MAX_SSID_LEN || !is_printable_ascii(ssid) {
        return Err(NetworkError::InvalidSsid);
    }
    Ok(())
}

/// Empty for an open network, otherwise 8–64 bytes.
pub(super) fn validate_password(password: &str) -> Result<(), NetworkError> {
    if password.is_empty() {
        return Ok(());
    }
    if !(MIN_WPA2_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password.len()) {
        return Err(NetworkError::InvalidPassword);
    }
    Ok(())
}
