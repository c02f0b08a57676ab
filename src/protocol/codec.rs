//! Frame codec: stateless encode/decode of whole Improv frames.
//!
//! Inbound traffic normally goes through the incremental
//! [`FrameParser`](super::parser::FrameParser); these functions cover the
//! other direction and whole-buffer validation (host tooling, tests, fuzz).

use heapless::Vec;

use crate::error::FrameError;

use super::{FrameType, HEADER_LEN, LINE_TERMINATOR, MAGIC, MAX_FRAME_LEN, MAX_PAYLOAD_LEN, VERSION};

/// Owned, fixed-capacity buffer large enough for any frame.
pub type FrameBuf = Vec<u8, MAX_FRAME_LEN>;

/// Sum of `bytes`, mod 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Build a complete frame around `payload`.
pub fn encode_frame(frame_type: FrameType, payload: &[u8]) -> Result<FrameBuf, FrameError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLong(payload.len()));
    }

    let total = HEADER_LEN + payload.len() + 1;
    let mut raw = [0u8; MAX_FRAME_LEN];
    raw[..MAGIC.len()].copy_from_slice(&MAGIC);
    raw[6] = VERSION;
    raw[7] = frame_type as u8;
    raw[8] = payload.len() as u8;
    raw[HEADER_LEN..total - 1].copy_from_slice(payload);
    raw[total - 1] = checksum(&raw[..total - 1]);

    FrameBuf::from_slice(&raw[..total]).map_err(|()| FrameError::PayloadTooLong(payload.len()))
}

/// A validated frame borrowed from its source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Raw type byte; unknown values are preserved.
    pub frame_type: u8,
    pub payload: &'a [u8],
}

impl Frame<'_> {
    pub fn kind(&self) -> Option<FrameType> {
        FrameType::from_u8(self.frame_type)
    }
}

/// Validate exactly one frame occupying all of `bytes`.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame<'_>, FrameError> {
    let (frame, used) = frame_at_start(bytes)?;
    if used != bytes.len() {
        return Err(FrameError::TrailingBytes(bytes.len() - used));
    }
    Ok(frame)
}

/// Split the first frame off a device output stream.
///
/// Skips one [`LINE_TERMINATOR`] after the checksum if present and returns
/// the remainder. The terminator can't be used to find frame boundaries
/// because payload and checksum bytes may themselves be `\n`.
pub fn next_frame(stream: &[u8]) -> Result<(Frame<'_>, &[u8]), FrameError> {
    let (frame, mut used) = frame_at_start(stream)?;
    if stream.get(used) == Some(&LINE_TERMINATOR) {
        used += 1;
    }
    Ok((frame, &stream[used..]))
}

fn frame_at_start(bytes: &[u8]) -> Result<(Frame<'_>, usize), FrameError> {
    if bytes.len() < HEADER_LEN + 1 {
        return Err(FrameError::Truncated);
    }
    if bytes[..MAGIC.len()] != MAGIC {
        return Err(FrameError::BadMagic);
    }
    if bytes[6] != VERSION {
        return Err(FrameError::BadVersion(bytes[6]));
    }

    let end = HEADER_LEN + bytes[8] as usize;
    if bytes.len() <= end {
        return Err(FrameError::Truncated);
    }

    let expected = checksum(&bytes[..end]);
    let found = bytes[end];
    if expected != found {
        return Err(FrameError::BadChecksum { expected, found });
    }

    Ok((
        Frame {
            frame_type: bytes[7],
            payload: &bytes[HEADER_LEN..end],
        },
        end + 1,
    ))
}

/// Append `field` as `[len][bytes]`.
pub fn push_field<const N: usize>(out: &mut Vec<u8, N>, field: &[u8]) -> Result<(), FrameError> {
    let len = u8::try_from(field.len()).map_err(|_| FrameError::PayloadTooLong(field.len()))?;
    let needed = out.len() + 1 + field.len();
    out.push(len).map_err(|_| FrameError::PayloadTooLong(needed))?;
    out.extend_from_slice(field)
        .map_err(|()| FrameError::PayloadTooLong(needed))
}

/// Read one `[len][bytes]` field starting at `*pos`, advancing `*pos`.
///
/// Returns `None` if the length byte or the field body runs past `data`.
pub fn read_field<'a>(data: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let len = *data.get(*pos)? as usize;
    let start = *pos + 1;
    let field = data.get(start..start + len)?;
    *pos = start + len;
    Some(field)
}
