//! Fuzz target: `FrameParser::feed`
//!
//! Drives arbitrary byte sequences through the byte-at-a-time parser and
//! the whole-buffer codec, asserting that neither panics, that the parser
//! buffer stays bounded, and that every accepted command re-encodes to a
//! frame the parser accepts again.
//!
//! cargo fuzz run fuzz_frame_parser

#![no_main]

use improv_serial::protocol::codec::{decode_frame, encode_frame, next_frame};
use improv_serial::protocol::parser::{FrameParser, ParseOutcome};
use improv_serial::protocol::{FrameType, MAX_FRAME_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut parser = FrameParser::default();

    // The first byte picks a clock step so silence expiry is exercised too.
    let (step, bytes) = match data.split_first() {
        Some((s, rest)) => (u32::from(*s), rest),
        None => return,
    };

    let mut now: u32 = 0;
    for &b in bytes {
        now = now.wrapping_add(step);
        parser.expire_if_silent(now);
        match parser.feed(b, now) {
            ParseOutcome::Command(cmd) => {
                assert_eq!(parser.buffered(), 0, "terminal outcome must clear buffer");

                let payload = cmd.encode().expect("decoded command must re-encode");
                let frame = encode_frame(FrameType::Rpc, &payload).expect("payload fits");
                let mut again = FrameParser::default();
                let last = frame
                    .iter()
                    .map(|&x| again.feed(x, 0))
                    .last()
                    .expect("frame is non-empty");
                assert_eq!(last, ParseOutcome::Command(cmd));
            }
            ParseOutcome::Reset | ParseOutcome::Error(_) => {
                assert_eq!(parser.buffered(), 0, "terminal outcome must clear buffer");
            }
            ParseOutcome::Continue => {}
        }
        assert!(parser.buffered() < MAX_FRAME_LEN);
    }

    // Whole-buffer decoding must never panic either.
    let _ = decode_frame(bytes);
    let mut rest = bytes;
    while let Ok((_, tail)) = next_frame(rest) {
        if tail.len() >= rest.len() {
            break;
        }
        rest = tail;
    }
});
