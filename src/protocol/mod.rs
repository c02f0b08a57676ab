//! Improv serial wire protocol.
//!
//! ```text
//! ┌──────────────┬─────────┬──────┬────────┬─────────────┬──────────┐
//! │ "IMPROV" (6B)│ ver (1B)│ type │ len L  │ payload (L) │ checksum │
//! └──────────────┴─────────┴──────┴────────┴─────────────┴──────────┘
//!   checksum = sum of every preceding byte, mod 256
//! ```
//!
//! ```text
//! Transport ──▶ FrameParser ──▶ command::decode ──▶ ImprovService
//!     ▲                                                  │
//!     └──────────────── response builders ◀──────────────┘
//! ```

pub mod codec;
pub mod command;
pub mod parser;
pub mod response;
pub mod transport;

/// Literal that opens every frame.
pub const MAGIC: [u8; 6] = *b"IMPROV";

/// Improv serial protocol version spoken by this firmware.
pub const VERSION: u8 = 1;

/// Magic + version + type + length.
pub const HEADER_LEN: usize = 9;

/// The payload length is a single byte.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Header, largest payload and checksum.
pub const MAX_FRAME_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN + 1;

/// Appended after every outbound frame; not covered by the checksum.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Frame type tag (byte 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Device → host: current provisioning state.
    CurrentState = 0x01,
    /// Device → host: error notification.
    ErrorState = 0x02,
    /// Host → device: RPC command.
    Rpc = 0x03,
    /// Device → host: RPC result.
    RpcResponse = 0x04,
}

impl FrameType {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::CurrentState),
            0x02 => Some(Self::ErrorState),
            0x03 => Some(Self::Rpc),
            0x04 => Some(Self::RpcResponse),
            _ => None,
        }
    }
}

/// Provisioning state as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceState {
    /// Idle, ready to accept credentials.
    Authorized = 0x02,
    /// Credentials submitted, waiting for the network to come up.
    Provisioning = 0x03,
    /// Associated with a network.
    Provisioned = 0x04,
}

impl DeviceState {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x02 => Some(Self::Authorized),
            0x03 => Some(Self::Provisioning),
            0x04 => Some(Self::Provisioned),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Authorized => "Authorized",
            Self::Provisioning => "Provisioning",
            Self::Provisioned => "Provisioned",
        }
    }
}

/// Error code carried by error-state frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// Clears the host's error indicator.
    None = 0x00,
    /// Checksum or framing failure.
    InvalidPayload = 0x01,
    /// Well-framed RPC with a command this device does not handle.
    UnknownCommand = 0x02,
    /// The provisioning window elapsed without association.
    UnableToConnect = 0x03,
}

impl ErrorCode {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(Self::None),
            0x01 => Some(Self::InvalidPayload),
            0x02 => Some(Self::UnknownCommand),
            0x03 => Some(Self::UnableToConnect),
            _ => None,
        }
    }
}

/// RPC command code (first byte of an RPC payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandCode {
    WifiSettings = 0x01,
    GetCurrentState = 0x02,
    GetDeviceInfo = 0x03,
}

impl CommandCode {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::WifiSettings),
            0x02 => Some(Self::GetCurrentState),
            0x03 => Some(Self::GetDeviceInfo),
            _ => None,
        }
    }
}
