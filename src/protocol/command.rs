//! RPC command decoding.
//!
//! RPC payload layout:
//!
//! ```text
//! ┌─────────┬──────────┬──────────────────────────────────────┐
//! │ cmd (1B)│ len (1B) │ data (len bytes)                      │
//! └─────────┴──────────┴──────────────────────────────────────┘
//!   WifiSettings data:  [ssid_len][ssid][pass_len][password]
//!   queries:            empty
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, FrameError};

use super::codec::{push_field, read_field};
use super::{CommandCode, MAX_PAYLOAD_LEN};

/// 802.11 SSID limit.
pub const MAX_SSID_LEN: usize = 32;
/// WPA2 passphrase / PSK limit.
pub const MAX_PASSWORD_LEN: usize = 64;

pub type Ssid = heapless::String<MAX_SSID_LEN>;
pub type Password = heapless::String<MAX_PASSWORD_LEN>;

/// Credentials carried by a `WifiSettings` RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredentials {
    pub ssid: Ssid,
    pub password: Password,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, DecodeError> {
        let mut s = Ssid::new();
        s.push_str(ssid).map_err(|()| DecodeError::FieldTooLong)?;
        let mut p = Password::new();
        p.push_str(password).map_err(|()| DecodeError::FieldTooLong)?;
        Ok(Self { ssid: s, password: p })
    }
}

/// A recognised RPC command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetWifi(WifiCredentials),
    GetCurrentState,
    GetDeviceInfo,
}

/// Result of decoding a well-formed RPC payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Command(Command),
    /// Command byte this firmware does not implement.
    Unrecognized(u8),
}

impl Command {
    pub fn code(&self) -> CommandCode {
        match self {
            Self::SetWifi(_) => CommandCode::WifiSettings,
            Self::GetCurrentState => CommandCode::GetCurrentState,
            Self::GetDeviceInfo => CommandCode::GetDeviceInfo,
        }
    }

    /// Encode as an RPC payload (the host side of [`decode`]).
    pub fn encode(&self) -> Result<heapless::Vec<u8, MAX_PAYLOAD_LEN>, FrameError> {
        let mut data: heapless::Vec<u8, MAX_PAYLOAD_LEN> = heapless::Vec::new();
        if let Self::SetWifi(creds) = self {
            push_field(&mut data, creds.ssid.as_bytes())?;
            push_field(&mut data, creds.password.as_bytes())?;
        }

        let mut out: heapless::Vec<u8, MAX_PAYLOAD_LEN> = heapless::Vec::new();
        let overflow = FrameError::PayloadTooLong(data.len() + 2);
        out.push(self.code() as u8).map_err(|_| overflow)?;
        out.push(data.len() as u8).map_err(|_| overflow)?;
        out.extend_from_slice(&data).map_err(|()| overflow)?;
        Ok(out)
    }
}

/// Decode an RPC payload.
///
/// Unknown command bytes are not an error here; they come back as
/// [`Decoded::Unrecognized`] for the caller to classify.
pub fn decode(payload: &[u8]) -> Result<Decoded, DecodeError> {
    let [cmd, declared, data @ ..] = payload else {
        return Err(DecodeError::Empty);
    };
    let declared = *declared as usize;
    if declared != data.len() {
        return Err(DecodeError::LengthMismatch {
            declared,
            actual: data.len(),
        });
    }

    let Some(code) = CommandCode::from_u8(*cmd) else {
        return Ok(Decoded::Unrecognized(*cmd));
    };

    let command = match code {
        CommandCode::WifiSettings => {
            let mut pos = 0;
            let ssid = read_field(data, &mut pos).ok_or(DecodeError::FieldOverrun)?;
            let password = read_field(data, &mut pos).ok_or(DecodeError::FieldOverrun)?;
            Command::SetWifi(WifiCredentials::new(
                as_str(ssid, MAX_SSID_LEN)?,
                as_str(password, MAX_PASSWORD_LEN)?,
            )?)
        }
        CommandCode::GetCurrentState => Command::GetCurrentState,
        CommandCode::GetDeviceInfo => Command::GetDeviceInfo,
    };
    Ok(Decoded::Command(command))
}

fn as_str(raw: &[u8], capacity: usize) -> Result<&str, DecodeError> {
    if raw.len() > capacity {
        return Err(DecodeError::FieldTooLong);
    }
    core::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)
}
