//! Integration tests for queries and frame-level error handling.

use std::net::Ipv4Addr;

use improv_serial::app::events::ImprovEvent;
use improv_serial::config::DeviceIdentity;
use improv_serial::protocol::codec::encode_frame;
use improv_serial::protocol::command::Command;
use improv_serial::protocol::response::error_frame;
use improv_serial::protocol::{CommandCode, DeviceState, ErrorCode, FrameType, LINE_TERMINATOR};

use crate::mock_ports::{Harness, Reply, rpc_frame};

fn device_info_reply() -> Reply {
    let id = DeviceIdentity::default();
    Reply::Rpc {
        command: CommandCode::GetDeviceInfo as u8,
        fields: vec![
            id.firmware_name().to_string(),
            id.firmware_version().to_string(),
            id.hardware_variant().to_string(),
            id.device_name().to_string(),
        ],
    }
}

// ── GetDeviceInfo ─────────────────────────────────────────────

#[test]
fn device_info_in_every_state() {
    let harnesses = [
        Harness::new(),
        Harness::provisioning(),
        Harness::provisioned(Ipv4Addr::new(192, 168, 4, 1)),
    ];
    let expected_states = [
        DeviceState::Authorized,
        DeviceState::Provisioning,
        DeviceState::Provisioned,
    ];

    for (mut h, state) in harnesses.into_iter().zip(expected_states) {
        h.send(&rpc_frame(&Command::GetDeviceInfo));
        h.tick();
        assert_eq!(
            h.replies(),
            vec![Reply::Error(ErrorCode::None), device_info_reply()],
            "in {state:?}"
        );
        assert_eq!(h.service.state(), state);
    }
}

#[test]
fn device_info_field_order() {
    let mut h = Harness::new();
    h.send(&rpc_frame(&Command::GetDeviceInfo));
    h.tick();
    let replies = h.replies();
    let Reply::Rpc { fields, .. } = &replies[1] else {
        panic!("expected RPC response, got {:?}", replies[1]);
    };
    assert_eq!(fields[0], "improv-serial");
    assert_eq!(fields[1], env!("CARGO_PKG_VERSION"));
    assert_eq!(fields[2], "ESP32-S3");
    assert_eq!(fields[3], "improv-device");
}

// ── GetCurrentState ───────────────────────────────────────────

#[test]
fn current_state_when_authorized() {
    let mut h = Harness::new();
    h.send(&rpc_frame(&Command::GetCurrentState));
    h.tick();
    assert_eq!(
        h.replies(),
        vec![Reply::Error(ErrorCode::None), Reply::State(DeviceState::Authorized)]
    );
}

#[test]
fn current_state_when_provisioned_includes_url() {
    let mut h = Harness::provisioned(Ipv4Addr::new(192, 168, 1, 77));
    h.send(&rpc_frame(&Command::GetCurrentState));
    h.tick();
    assert_eq!(
        h.replies(),
        vec![
            Reply::Error(ErrorCode::None),
            Reply::State(DeviceState::Provisioned),
            Reply::Rpc {
                command: CommandCode::GetCurrentState as u8,
                fields: vec!["http://192.168.1.77".to_string()],
            },
        ]
    );
}

#[test]
fn current_state_while_provisioning_has_no_url() {
    let mut h = Harness::provisioning();
    h.send(&rpc_frame(&Command::GetCurrentState));
    h.tick();
    assert_eq!(
        h.replies(),
        vec![Reply::Error(ErrorCode::None), Reply::State(DeviceState::Provisioning)]
    );
}

// ── Errors ────────────────────────────────────────────────────

#[test]
fn unknown_command_clears_then_reports_error() {
    let mut h = Harness::new();
    // 0x04 is a valid Improv command this firmware does not implement.
    let frame = encode_frame(FrameType::Rpc, &[0x04, 0x00]).unwrap();
    h.send(&frame);
    h.tick();

    assert_eq!(h.replies(), vec![Reply::Error(ErrorCode::None), Reply::Error(ErrorCode::UnknownCommand)]);
    assert_eq!(h.service.state(), DeviceState::Authorized);
    assert_eq!(h.service.last_error(), ErrorCode::UnknownCommand);
    assert_eq!(
        h.sink.events.last(),
        Some(&ImprovEvent::ErrorReported(ErrorCode::UnknownCommand))
    );
}

#[test]
fn malformed_rpc_payload_reports_unknown_command() {
    let mut h = Harness::new();
    // Declares 5 data bytes, carries 1.
    let frame = encode_frame(FrameType::Rpc, &[0x01, 0x05, 0x00]).unwrap();
    h.send(&frame);
    h.tick();
    assert_eq!(h.replies(), vec![Reply::Error(ErrorCode::None), Reply::Error(ErrorCode::UnknownCommand)]);
}

#[test]
fn bad_checksum_reports_invalid_payload() {
    let mut h = Harness::provisioning();
    let mut frame = rpc_frame(&Command::GetDeviceInfo);
    let last = frame.len() - 1;
    frame[last] = frame[last].wrapping_add(1);
    h.send(&frame);
    h.tick();

    assert_eq!(h.replies(), vec![Reply::Error(ErrorCode::InvalidPayload)]);
    assert_eq!(h.service.state(), DeviceState::Provisioning);
    assert_eq!(h.service.last_error(), ErrorCode::InvalidPayload);
}

#[test]
fn non_rpc_frames_are_ignored() {
    let mut h = Harness::new();
    let frame = encode_frame(FrameType::CurrentState, &[0x02]).unwrap();
    h.send(&frame);
    h.tick();
    assert!(h.replies().is_empty());
    assert_eq!(h.service.last_error(), ErrorCode::None);
}

#[test]
fn success_clears_previous_error() {
    let mut h = Harness::new();
    h.send(&encode_frame(FrameType::Rpc, &[0x04, 0x00]).unwrap());
    h.tick();
    assert_eq!(h.service.last_error(), ErrorCode::UnknownCommand);

    h.send(&rpc_frame(&Command::GetCurrentState));
    h.tick();
    assert_eq!(h.service.last_error(), ErrorCode::None);
}

// ── Framing on the wire ───────────────────────────────────────

#[test]
fn every_frame_is_newline_terminated() {
    let mut h = Harness::new();
    h.send(&rpc_frame(&Command::GetCurrentState));
    h.tick();
    let raw = h.raw_output();

    let mut expected = error_frame(ErrorCode::None).to_vec();
    expected.push(LINE_TERMINATOR);
    assert_eq!(&raw[..expected.len()], &expected[..]);
    assert_eq!(raw.last(), Some(&LINE_TERMINATOR));
}

#[test]
fn noise_before_frame_is_skipped() {
    let mut h = Harness::new();
    h.send(b"boot log line\r\n");
    h.send(&rpc_frame(&Command::GetCurrentState));
    h.tick();
    assert_eq!(
        h.replies(),
        vec![Reply::Error(ErrorCode::None), Reply::State(DeviceState::Authorized)]
    );
}

#[test]
fn back_to_back_frames_answered_in_order() {
    let mut h = Harness::new();
    h.send(&rpc_frame(&Command::GetCurrentState));
    h.send(&rpc_frame(&Command::GetDeviceInfo));
    h.tick();
    assert_eq!(
        h.replies(),
        vec![
            Reply::Error(ErrorCode::None),
            Reply::State(DeviceState::Authorized),
            Reply::Error(ErrorCode::None),
            device_info_reply(),
        ]
    );
}

#[test]
fn frame_split_across_ticks_within_window() {
    let mut h = Harness::new();
    let frame = rpc_frame(&Command::GetCurrentState);
    let (head, tail) = frame.split_at(4);

    h.send(head);
    h.tick();
    assert!(h.replies().is_empty());

    h.advance(30);
    h.send(tail);
    h.tick();
    assert_eq!(
        h.replies(),
        vec![Reply::Error(ErrorCode::None), Reply::State(DeviceState::Authorized)]
    );
}

#[test]
fn silence_gap_discards_partial_frame() {
    let mut h = Harness::new();
    let frame = rpc_frame(&Command::GetCurrentState);
    let (head, tail) = frame.split_at(4);

    h.send(head);
    h.tick();

    h.advance(100);
    h.send(tail);
    h.tick();
    assert!(h.replies().is_empty());

    // A complete frame afterwards still parses.
    h.advance(1);
    h.send(&frame);
    h.tick();
    assert_eq!(
        h.replies(),
        vec![Reply::Error(ErrorCode::None), Reply::State(DeviceState::Authorized)]
    );
}
