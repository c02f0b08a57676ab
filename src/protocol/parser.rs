//! Incremental Improv frame parser.
//!
//! Bytes arrive one at a time from the serial port, possibly split across
//! many polling ticks. Each byte is appended to a bounded receive buffer and
//! checked against the frame shape at its position, so a bad header is
//! rejected on the first wrong byte instead of after a whole frame:
//!
//! ```text
//!  at 0..=5   must match "IMPROV"          else Reset
//!  at 6       must equal VERSION           else Reset
//!  at 7       type tag                     Continue
//!  at 8       payload length L             Continue
//!  at 9..9+L  payload                      Continue
//!  at 9+L     checksum                     Command | Error | Reset
//! ```
//!
//! Every terminal outcome clears the buffer, so the byte after a checksum
//! always starts a new frame. A separate silence check drops a partial
//! frame left behind by a stalled or disconnected host.

use heapless::Vec;
use log::{debug, warn};

use super::codec::checksum;
use super::command::{self, Command, Decoded};
use super::{ErrorCode, FrameType, HEADER_LEN, MAGIC, MAX_FRAME_LEN, VERSION};

/// Default quiescence window between bytes of one frame.
pub const DEFAULT_SILENCE_MS: u32 = 50;

/// What a single byte did to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Byte fits the frame so far; keep feeding.
    Continue,
    /// Frame abandoned without an error report (bad header, or a valid
    /// frame of a type the device doesn't act on).
    Reset,
    /// Checksum-valid RPC frame carrying a recognised command.
    Command(Command),
    /// Frame rejected with an error the host should be told about.
    Error(ErrorCode),
}

/// Byte-at-a-time frame parser.
pub struct FrameParser {
    buf: Vec<u8, MAX_FRAME_LEN>,
    last_activity_ms: u32,
    silence_ms: u32,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_MS)
    }
}

impl FrameParser {
    pub fn new(silence_ms: u32) -> Self {
        Self {
            buf: Vec::new(),
            last_activity_ms: 0,
            silence_ms,
        }
    }

    /// Drop any partial frame if the link has been quiet for longer than
    /// the silence window. Returns `true` if bytes were discarded.
    pub fn expire_if_silent(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_activity_ms) <= self.silence_ms {
            return false;
        }
        self.last_activity_ms = now_ms;
        let discarded = !self.buf.is_empty();
        if discarded {
            debug!("improv: discarding {} stale bytes after silence", self.buf.len());
        }
        self.buf.clear();
        discarded
    }

    /// Consume one byte received at `now_ms`.
    pub fn feed(&mut self, byte: u8, now_ms: u32) -> ParseOutcome {
        let at = self.buf.len();
        if self.buf.push(byte).is_err() {
            // Unreachable: a terminal outcome fires at the checksum position,
            // which is always inside the buffer.
            self.buf.clear();
            return ParseOutcome::Reset;
        }
        debug!("improv: byte 0x{:02X} at {}", byte, at);

        let outcome = self.evaluate(at, byte);
        match outcome {
            ParseOutcome::Continue => self.last_activity_ms = now_ms,
            ParseOutcome::Command(_) => {
                self.last_activity_ms = now_ms;
                self.buf.clear();
            }
            ParseOutcome::Reset | ParseOutcome::Error(_) => self.buf.clear(),
        }
        outcome
    }

    /// Number of bytes of the current partial frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Discard any partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    fn evaluate(&self, at: usize, byte: u8) -> ParseOutcome {
        if at < MAGIC.len() {
            return if byte == MAGIC[at] {
                ParseOutcome::Continue
            } else {
                ParseOutcome::Reset
            };
        }
        if at == 6 {
            return if byte == VERSION {
                ParseOutcome::Continue
            } else {
                ParseOutcome::Reset
            };
        }
        if at < HEADER_LEN {
            // type tag and payload length: no constraint yet
            return ParseOutcome::Continue;
        }

        let payload_end = HEADER_LEN + self.buf[8] as usize;
        if at < payload_end {
            return ParseOutcome::Continue;
        }

        // at == payload_end: checksum byte
        let expected = checksum(&self.buf[..at]);
        if expected != byte {
            warn!(
                "improv: checksum mismatch (expected 0x{:02X}, got 0x{:02X})",
                expected, byte
            );
            return ParseOutcome::Error(ErrorCode::InvalidPayload);
        }

        if FrameType::from_u8(self.buf[7]) != Some(FrameType::Rpc) {
            debug!("improv: ignoring frame of type 0x{:02X}", self.buf[7]);
            return ParseOutcome::Reset;
        }

        match command::decode(&self.buf[HEADER_LEN..payload_end]) {
            Ok(Decoded::Command(cmd)) => ParseOutcome::Command(cmd),
            Ok(Decoded::Unrecognized(code)) => {
                warn!("improv: unknown RPC command 0x{:02X}", code);
                ParseOutcome::Error(ErrorCode::UnknownCommand)
            }
            Err(e) => {
                warn!("improv: malformed RPC payload ({})", e);
                ParseOutcome::Error(ErrorCode::UnknownCommand)
            }
        }
    }
}
