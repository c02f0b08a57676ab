//! Improv Serial Firmware: main entry point
//!
//! Hexagonal architecture around a single cooperative polling loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UartTransport   WifiAdapter    NvsAdapter       LogEventSink  │
//! │  (Transport)     (NetworkPort)  (CredentialStore)(EventSink)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ImprovService (pure logic)                  │    │
//! │  │  FrameParser · ProvisioningFsm · responses             │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Esp32TimeAdapter · ProvisioningWatch (caller-owned clock)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::{info, warn};

use improv_serial::adapters::device_id;
use improv_serial::adapters::log_sink::LogEventSink;
use improv_serial::adapters::nvs::NvsAdapter;
use improv_serial::adapters::time::Esp32TimeAdapter;
use improv_serial::adapters::uart::UartTransport;
use improv_serial::adapters::wifi::WifiAdapter;
use improv_serial::app::ports::{CredentialStore, NetworkPort};
use improv_serial::app::service::ImprovService;
use improv_serial::app::timeout::ProvisioningWatch;
use improv_serial::config::ImprovConfig;

/// How long boot waits for stored credentials to associate before the
/// initial state is decided.
const BOOT_CONNECT_WAIT_MS: u32 = 10_000;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Improv Serial v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration + identity ───────────────────────────
    let mut config = ImprovConfig::default();
    let mac = device_id::read_mac();
    let name = device_id::device_name(&mac);
    config.identity = config.identity.with_device_name(&name)?;
    config.validate()?;
    info!("Device name: {}", name);

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    let mut nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs_partition))?;
    let mut network = WifiAdapter::new(wifi);

    // ── 4. Reconnect with stored credentials ──────────────────
    let clock = Esp32TimeAdapter::new();
    match nvs.load_wifi_config() {
        Ok(Some(creds)) => match network.begin_station(&creds.ssid, &creds.password) {
            Ok(()) => {
                let started = clock.uptime_ms();
                while !network.is_associated()
                    && clock.uptime_ms().wrapping_sub(started) < BOOT_CONNECT_WAIT_MS
                {
                    FreeRtos::delay_ms(100);
                }
                info!("Boot reconnect: associated={}", network.is_associated());
            }
            Err(e) => warn!("Boot reconnect failed: {}", e),
        },
        Ok(None) => info!("No stored WiFi credentials; waiting for Improv"),
        Err(e) => warn!("Stored WiFi credentials unreadable: {}", e),
    }

    // ── 5. Serial transport ───────────────────────────────────
    let uart_config = UartConfig::default().baudrate(Hertz(config.baud_rate));
    let driver = UartDriver::new(
        peripherals.uart0,
        peripherals.pins.gpio43,
        peripherals.pins.gpio44,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )?;
    let mut transport = UartTransport::new(driver);

    // ── 6. Service ────────────────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut service = ImprovService::new(&config, &network, &mut sink);
    let mut watch = ProvisioningWatch::new(config.provisioning_timeout_ms);

    info!("System ready. Entering poll loop.");

    // ── 7. Poll loop ──────────────────────────────────────────
    loop {
        let now = clock.uptime_ms();
        let timed_out = watch.observe(service.state(), now);
        if service.tick(now, timed_out, &mut transport, &mut network, &mut nvs, &mut sink) {
            watch.clear();
            info!("Provisioning complete");
        }
        FreeRtos::delay_ms(config.poll_interval_ms);
    }
}
