//! Outbound frame builders.
//!
//! State and error notifications are fixed 11-byte frames and are built on
//! the stack without any failure path. RPC responses carry a list of
//! length-prefixed strings:
//!
//! ```text
//! payload = [cmd][data_len][len][str]...[len][str]
//! ```

use core::fmt::Write as _;
use core::net::Ipv4Addr;

use crate::config::DeviceIdentity;
use crate::error::FrameError;

use super::codec::{FrameBuf, checksum, encode_frame, push_field};
use super::{CommandCode, DeviceState, ErrorCode, FrameType, HEADER_LEN, MAGIC, MAX_PAYLOAD_LEN, VERSION};

/// Length of a state or error notification frame.
pub const STATUS_FRAME_LEN: usize = HEADER_LEN + 2;

pub type StatusFrame = [u8; STATUS_FRAME_LEN];

/// `http://` plus the longest dotted quad.
pub type DeviceUrl = heapless::String<24>;

/// Current-state notification.
pub fn state_frame(state: DeviceState) -> StatusFrame {
    status_frame(FrameType::CurrentState, state as u8)
}

/// Error notification.
pub fn error_frame(code: ErrorCode) -> StatusFrame {
    status_frame(FrameType::ErrorState, code as u8)
}

fn status_frame(frame_type: FrameType, value: u8) -> StatusFrame {
    let mut f = [0u8; STATUS_FRAME_LEN];
    f[..MAGIC.len()].copy_from_slice(&MAGIC);
    f[6] = VERSION;
    f[7] = frame_type as u8;
    f[8] = 1;
    f[9] = value;
    f[10] = checksum(&f[..10]);
    f
}

/// RPC response frame answering `command` with `fields`.
pub fn rpc_response(command: CommandCode, fields: &[&str]) -> Result<FrameBuf, FrameError> {
    let mut data: heapless::Vec<u8, MAX_PAYLOAD_LEN> = heapless::Vec::new();
    for field in fields {
        push_field(&mut data, field.as_bytes())?;
    }
    if data.len() > MAX_PAYLOAD_LEN - 2 {
        return Err(FrameError::PayloadTooLong(data.len() + 2));
    }

    let mut payload = [0u8; MAX_PAYLOAD_LEN];
    payload[0] = command as u8;
    payload[1] = data.len() as u8;
    payload[2..2 + data.len()].copy_from_slice(&data);
    encode_frame(FrameType::RpcResponse, &payload[..2 + data.len()])
}

/// Answer to `GetDeviceInfo`: firmware name, version, hardware variant,
/// device name, in that order.
pub fn device_info_response(identity: &DeviceIdentity) -> Result<FrameBuf, FrameError> {
    rpc_response(
        CommandCode::GetDeviceInfo,
        &[
            identity.firmware_name(),
            identity.firmware_version(),
            identity.hardware_variant(),
            identity.device_name(),
        ],
    )
}

/// Connection-info response carrying the device-local URL.
///
/// Without an address the response is sent with no URL so the host still
/// gets a result for its RPC.
pub fn url_response(command: CommandCode, address: Option<Ipv4Addr>) -> Result<FrameBuf, FrameError> {
    match address {
        Some(addr) => rpc_response(command, &[device_url(addr).as_str()]),
        None => rpc_response(command, &[]),
    }
}

pub fn device_url(addr: Ipv4Addr) -> DeviceUrl {
    let mut url = DeviceUrl::new();
    // 22 bytes at most; always fits
    let _ = write!(url, "http://{}", addr);
    url
}
