//! Integration tests for the serial provisioning flow.
//!
//! Drives `ImprovService` through credentials → association → provisioned,
//! and through the timeout path, asserting on the exact frames the host
//! would see.

use std::net::Ipv4Addr;

use improv_serial::app::events::ImprovEvent;
use improv_serial::app::ports::{CredentialStore, NetworkPort, WifiMode};
use improv_serial::app::timeout::ProvisioningWatch;
use improv_serial::protocol::{CommandCode, DeviceState, ErrorCode};

use crate::mock_ports::{Harness, Reply, set_wifi};

// ── Credentials ───────────────────────────────────────────────

#[test]
fn set_wifi_from_authorized() {
    let mut h = Harness::new();
    assert_eq!(h.service.state(), DeviceState::Authorized);

    h.send(&set_wifi("HomeWiFi", "mysecret8"));
    assert!(!h.tick());

    assert_eq!(
        h.replies(),
        vec![Reply::Error(ErrorCode::None), Reply::State(DeviceState::Provisioning)]
    );
    assert_eq!(h.service.state(), DeviceState::Provisioning);

    // Network: dropped any association, then started the new one.
    assert_eq!(h.wifi.disconnect_count(), 1);
    assert_eq!(h.wifi.station_ssid(), Some("HomeWiFi"));
    assert_eq!(h.wifi.station_password(), Some("mysecret8"));

    // Persisted and retained.
    let stored = h.nvs.load_wifi_config().unwrap().unwrap();
    assert_eq!(stored.ssid.as_str(), "HomeWiFi");
    assert_eq!(stored.password.as_str(), "mysecret8");
    let last = h.service.last_credentials().unwrap();
    assert_eq!(last.ssid.as_str(), "HomeWiFi");
    assert_eq!(last.password.as_str(), "mysecret8");
}

#[test]
fn set_wifi_emits_events_in_order() {
    let mut h = Harness::new();
    h.send(&set_wifi("HomeWiFi", "mysecret8"));
    h.tick();

    assert_eq!(h.sink.events.len(), 3);
    assert_eq!(h.sink.events[0], ImprovEvent::Started(DeviceState::Authorized));
    assert_eq!(
        h.sink.events[1],
        ImprovEvent::StateChanged {
            from: DeviceState::Authorized,
            to: DeviceState::Provisioning,
        }
    );
    match &h.sink.events[2] {
        ImprovEvent::CredentialsReceived { ssid, persisted } => {
            assert_eq!(ssid.as_str(), "HomeWiFi");
            assert!(*persisted);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn persist_failure_is_not_fatal() {
    let mut h = Harness::new();
    h.nvs.set_fail_writes(true);

    h.send(&set_wifi("HomeWiFi", "mysecret8"));
    h.tick();

    assert_eq!(
        h.replies(),
        vec![Reply::Error(ErrorCode::None), Reply::State(DeviceState::Provisioning)]
    );
    assert_eq!(h.wifi.station_ssid(), Some("HomeWiFi"));
    assert!(h.nvs.load_wifi_config().unwrap().is_none());
    assert!(h.sink.events.contains(&ImprovEvent::CredentialsReceived {
        ssid: "HomeWiFi".try_into().unwrap(),
        persisted: false,
    }));
}

#[test]
fn station_start_failure_still_enters_provisioning() {
    let mut h = Harness::new();
    h.wifi.fail_next_start();

    h.send(&set_wifi("HomeWiFi", "mysecret8"));
    h.tick();

    assert_eq!(h.service.state(), DeviceState::Provisioning);
    assert_eq!(h.wifi.station_ssid(), None);

    // The timeout path is what recovers.
    h.replies();
    h.tick_with(true);
    assert_eq!(
        h.replies(),
        vec![Reply::Error(ErrorCode::UnableToConnect), Reply::State(DeviceState::Authorized)]
    );
}

#[test]
fn rejected_password_leaves_station_idle() {
    // Too short for WPA2: the adapter refuses to start, the service waits.
    let mut h = Harness::new();
    h.send(&set_wifi("HomeWiFi", "short"));
    h.tick();
    assert_eq!(h.service.state(), DeviceState::Provisioning);
    assert_eq!(h.wifi.station_ssid(), None);
}

// ── Association ───────────────────────────────────────────────

#[test]
fn association_completes_provisioning() {
    let mut h = Harness::provisioning();

    // Not yet associated: nothing happens.
    assert!(!h.tick());
    assert!(h.replies().is_empty());

    h.wifi.set_associated(true);
    h.wifi.set_address(Some(Ipv4Addr::new(192, 168, 1, 50)));
    assert!(h.tick());

    assert_eq!(
        h.replies(),
        vec![
            Reply::State(DeviceState::Provisioned),
            Reply::Rpc {
                command: CommandCode::WifiSettings as u8,
                fields: vec!["http://192.168.1.50".to_string()],
            },
        ]
    );
    assert_eq!(h.service.state(), DeviceState::Provisioned);
    assert_eq!(h.service.last_error(), ErrorCode::None);

    // Exactly once.
    assert!(!h.tick());
    assert!(h.replies().is_empty());
}

#[test]
fn access_point_mode_counts_as_connected() {
    let mut h = Harness::provisioning();
    h.wifi.set_mode(WifiMode::AccessPoint);

    assert!(h.tick());
    assert_eq!(
        h.replies(),
        vec![
            Reply::State(DeviceState::Provisioned),
            Reply::Rpc {
                command: CommandCode::WifiSettings as u8,
                fields: vec![],
            },
        ]
    );
}

#[test]
fn connection_wins_over_timeout_in_same_tick() {
    let mut h = Harness::provisioning();
    h.wifi.set_associated(true);
    h.wifi.set_address(Some(Ipv4Addr::new(10, 0, 0, 7)));

    assert!(h.tick_with(true));
    assert_eq!(h.service.state(), DeviceState::Provisioned);
    assert!(!h.replies().contains(&Reply::Error(ErrorCode::UnableToConnect)));
}

// ── Timeout ───────────────────────────────────────────────────

#[test]
fn timeout_reverts_to_authorized() {
    let mut h = Harness::provisioning();
    let disconnects = h.wifi.disconnect_count();

    assert!(!h.tick_with(true));

    assert_eq!(
        h.replies(),
        vec![Reply::Error(ErrorCode::UnableToConnect), Reply::State(DeviceState::Authorized)]
    );
    assert_eq!(h.service.state(), DeviceState::Authorized);
    assert_eq!(h.service.last_error(), ErrorCode::UnableToConnect);
    assert_eq!(h.wifi.disconnect_count(), disconnects + 1);
    assert_eq!(
        h.sink.events,
        vec![
            ImprovEvent::ErrorReported(ErrorCode::UnableToConnect),
            ImprovEvent::StateChanged {
                from: DeviceState::Provisioning,
                to: DeviceState::Authorized,
            },
        ]
    );

    // Outside Provisioning the flag is ignored.
    assert!(!h.tick_with(true));
    assert!(h.replies().is_empty());
}

#[test]
fn retry_after_timeout_succeeds() {
    let mut h = Harness::provisioning();
    h.tick_with(true);
    h.replies();

    h.send(&set_wifi("OtherNet", ""));
    h.tick();
    assert_eq!(h.service.state(), DeviceState::Provisioning);
    assert_eq!(h.wifi.station_ssid(), Some("OtherNet"));

    h.wifi.set_associated(true);
    assert!(h.tick());
    assert_eq!(h.service.last_error(), ErrorCode::None);
}

#[test]
fn watch_drives_timeout_from_clock() {
    let mut h = Harness::new();
    let mut watch = ProvisioningWatch::new(30_000);

    h.send(&set_wifi("HomeWiFi", "mysecret8"));
    let timed_out = watch.observe(h.service.state(), h.now_ms);
    h.tick_with(timed_out);
    h.replies();
    // Arms at t=0 now that the service is provisioning.
    assert!(!watch.observe(h.service.state(), h.now_ms));

    for _ in 0..29 {
        h.advance(1_000);
        let timed_out = watch.observe(h.service.state(), h.now_ms);
        h.tick_with(timed_out);
    }
    assert_eq!(h.service.state(), DeviceState::Provisioning);

    h.advance(1_000);
    let timed_out = watch.observe(h.service.state(), h.now_ms);
    assert!(timed_out);
    h.tick_with(timed_out);
    assert_eq!(h.service.state(), DeviceState::Authorized);
    assert!(!watch.observe(h.service.state(), h.now_ms));
}

// ── Re-provisioning ───────────────────────────────────────────

#[test]
fn provisioned_device_accepts_new_credentials() {
    let mut h = Harness::provisioned(Ipv4Addr::new(192, 168, 1, 2));
    assert_eq!(h.service.state(), DeviceState::Provisioned);

    h.send(&set_wifi("NewNet", "newpassword"));
    h.tick();

    assert_eq!(
        h.replies(),
        vec![Reply::Error(ErrorCode::None), Reply::State(DeviceState::Provisioning)]
    );
    assert_eq!(h.wifi.station_ssid(), Some("NewNet"));
    assert!(!h.wifi.is_associated());
}

#[test]
fn resubmission_while_provisioning_restates_provisioning() {
    let mut h = Harness::provisioning();
    h.send(&set_wifi("Second", "password2"));
    h.tick();
    assert_eq!(
        h.replies(),
        vec![Reply::Error(ErrorCode::None), Reply::State(DeviceState::Provisioning)]
    );
    assert_eq!(h.service.last_credentials().unwrap().ssid.as_str(), "Second");
}
