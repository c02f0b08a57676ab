//! Application service, the hexagonal core.
//!
//! [`ImprovService`] owns the frame parser, the provisioning FSM and the
//! device identity. All I/O flows through port traits injected at call
//! sites, so the whole service runs against mock adapters in tests.
//!
//! ```text
//!  Transport ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                │     ImprovService      │
//! NetworkPort ◀──│  Parser · FSM · Replies│──▶ CredentialStore
//!                └────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::{DeviceIdentity, ImprovConfig};
use crate::fsm::{DeviceState, ProvisioningEvent, ProvisioningFsm};
use crate::protocol::command::{Command, WifiCredentials};
use crate::protocol::parser::{FrameParser, ParseOutcome};
use crate::protocol::response::{device_info_response, error_frame, state_frame, url_response};
use crate::protocol::transport::Transport;
use crate::protocol::{CommandCode, ErrorCode, LINE_TERMINATOR};

use super::events::ImprovEvent;
use super::ports::{CredentialStore, EventSink, NetworkPort, WifiMode};

// ───────────────────────────────────────────────────────────────
// ImprovService
// ───────────────────────────────────────────────────────────────

/// Device side of the Improv serial protocol.
pub struct ImprovService {
    fsm: ProvisioningFsm,
    parser: FrameParser,
    identity: DeviceIdentity,
    /// Credentials from the most recent `WifiSettings` RPC.
    last_credentials: Option<WifiCredentials>,
    /// Last error code sent to the host.
    last_error: ErrorCode,
}

impl ImprovService {
    /// Construct the service. The initial state is `Provisioned` when the
    /// station is already associated, `Authorized` otherwise.
    pub fn new(config: &ImprovConfig, network: &impl NetworkPort, sink: &mut impl EventSink) -> Self {
        let associated = network.mode() == WifiMode::Station && network.is_associated();
        let initial = ProvisioningFsm::initial_state(associated);
        let identity = config.identity.clone();

        info!(
            "Improv serial ready: {} {} on {} as '{}', state {}",
            identity.firmware_name(),
            identity.firmware_version(),
            identity.hardware_variant(),
            identity.device_name(),
            initial.name()
        );
        sink.emit(&ImprovEvent::Started(initial));

        Self {
            fsm: ProvisioningFsm::new(initial),
            parser: FrameParser::new(config.silence_window_ms),
            identity,
            last_credentials: None,
            last_error: ErrorCode::None,
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one polling cycle: silence check → drain input → connection check.
    ///
    /// `timed_out` is the caller's provisioning-window signal (see
    /// [`ProvisioningWatch`](super::timeout::ProvisioningWatch)). Returns
    /// `true` if provisioning completed during this tick.
    pub fn tick(
        &mut self,
        now_ms: u32,
        timed_out: bool,
        transport: &mut impl Transport,
        network: &mut impl NetworkPort,
        store: &mut impl CredentialStore,
        sink: &mut impl EventSink,
    ) -> bool {
        // 1. Inter-byte silence
        self.parser.expire_if_silent(now_ms);

        // 2. Drain everything the transport has buffered
        while transport.available() > 0 {
            let byte = match transport.read_byte() {
                Ok(Some(b)) => b,
                Ok(None) => break,
                Err(e) => {
                    warn!("improv: transport read failed: {:?}", e);
                    break;
                }
            };
            match self.parser.feed(byte, now_ms) {
                ParseOutcome::Continue | ParseOutcome::Reset => {}
                ParseOutcome::Command(cmd) => {
                    self.send_error(ErrorCode::None, transport, sink);
                    self.handle_command(cmd, transport, network, store, sink);
                }
                ParseOutcome::Error(code) => {
                    // Only checksum-valid RPC frames reach command decoding;
                    // those always clear the host's error first.
                    if code == ErrorCode::UnknownCommand {
                        self.send_error(ErrorCode::None, transport, sink);
                    }
                    self.send_error(code, transport, sink);
                }
            }
        }

        // 3. Association progress
        if self.fsm.current_state() != DeviceState::Provisioning {
            return false;
        }
        if is_connected(network) {
            self.transition(ProvisioningEvent::Connected, transport, sink);
            self.last_error = ErrorCode::None;
            let addr = network.local_address();
            match url_response(CommandCode::WifiSettings, addr) {
                Ok(frame) => send(transport, &frame),
                Err(e) => warn!("improv: cannot build provisioning response: {}", e),
            }
            info!("Improv: provisioned, address {:?}", addr);
            return true;
        }
        if timed_out {
            warn!("Improv: association timed out");
            self.send_error(ErrorCode::UnableToConnect, transport, sink);
            self.transition(ProvisioningEvent::TimedOut, transport, sink);
            network.disconnect();
        }
        false
    }

    // ── Command handling ──────────────────────────────────────

    fn handle_command(
        &mut self,
        cmd: Command,
        transport: &mut impl Transport,
        network: &mut impl NetworkPort,
        store: &mut impl CredentialStore,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            Command::SetWifi(creds) => {
                info!(
                    "Improv: credentials received for '{}' (password {})",
                    creds.ssid,
                    mask(&creds.password)
                );
                let persisted = match store.write_wifi_config(&creds.ssid, &creds.password) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Improv: failed to persist WiFi config: {}", e);
                        false
                    }
                };

                self.transition(ProvisioningEvent::CredentialsSubmitted, transport, sink);

                network.disconnect();
                if let Err(e) = network.begin_station(&creds.ssid, &creds.password) {
                    warn!("Improv: station start failed: {}", e);
                }

                sink.emit(&ImprovEvent::CredentialsReceived {
                    ssid: creds.ssid.clone(),
                    persisted,
                });
                self.last_credentials = Some(creds);
            }
            Command::GetCurrentState => {
                let state = self.fsm.current_state();
                send(transport, &state_frame(state));
                if state == DeviceState::Provisioned {
                    match url_response(CommandCode::GetCurrentState, network.local_address()) {
                        Ok(frame) => send(transport, &frame),
                        Err(e) => warn!("improv: cannot build state response: {}", e),
                    }
                }
            }
            Command::GetDeviceInfo => match device_info_response(&self.identity) {
                Ok(frame) => send(transport, &frame),
                Err(e) => warn!("improv: cannot build device info: {}", e),
            },
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current provisioning state.
    pub fn state(&self) -> DeviceState {
        self.fsm.current_state()
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Credentials from the most recent `WifiSettings` RPC, if any.
    pub fn last_credentials(&self) -> Option<&WifiCredentials> {
        self.last_credentials.as_ref()
    }

    /// Last error code reported to the host (`None` after a success).
    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    // ── Internal ──────────────────────────────────────────────

    /// Apply `event` and announce the new state if the FSM moved.
    fn transition(&mut self, event: ProvisioningEvent, transport: &mut impl Transport, sink: &mut impl EventSink) {
        if let Some((from, to)) = self.fsm.apply(event) {
            send(transport, &state_frame(to));
            sink.emit(&ImprovEvent::StateChanged { from, to });
        }
    }

    fn send_error(&mut self, code: ErrorCode, transport: &mut impl Transport, sink: &mut impl EventSink) {
        self.last_error = code;
        send(transport, &error_frame(code));
        if code != ErrorCode::None {
            warn!("Improv: reporting error {:?}", code);
            sink.emit(&ImprovEvent::ErrorReported(code));
        }
    }
}

/// Associated in station mode, or serving as an access point.
fn is_connected(network: &impl NetworkPort) -> bool {
    match network.mode() {
        WifiMode::AccessPoint => true,
        WifiMode::Station => network.is_associated(),
        WifiMode::Off | WifiMode::Mixed => false,
    }
}

/// Write one frame followed by the line terminator. Failures are logged.
fn send<T: Transport>(transport: &mut T, frame: &[u8]) {
    let result = write_all(transport, frame)
        .and_then(|()| write_all(transport, &[LINE_TERMINATOR]))
        .and_then(|()| transport.flush());
    match result {
        Ok(()) => debug!("improv: sent {} byte frame", frame.len()),
        Err(e) => warn!("improv: transport write failed: {:?}", e),
    }
}

fn write_all<T: Transport>(transport: &mut T, mut data: &[u8]) -> Result<(), T::Error> {
    while !data.is_empty() {
        let n = transport.write(data)?;
        if n == 0 {
            warn!("improv: transport stalled, dropping {} bytes", data.len());
            break;
        }
        data = &data[n.min(data.len())..];
    }
    Ok(())
}

fn mask(password: &str) -> &'static str {
    if password.is_empty() { "<open>" } else { "********" }
}
