//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`], the hexagonal boundary for network
//! connectivity.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: a simulation whose association and address are
//!   driven by the test, with every control call recorded.
//!
//! `begin_station` only starts the attempt. Whether it succeeded is read
//! back through `is_associated`, which the service polls every tick.

use core::net::Ipv4Addr;

use log::info;

use super::utils::{validate_password, validate_ssid};
use crate::app::ports::{NetworkError, NetworkPort, WifiMode};

// ───────────────────────────────────────────────────────────────
// ESP-IDF
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use core::net::Ipv4Addr;

    use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};
    use log::{debug, info, warn};

    use crate::app::ports::{NetworkError, WifiMode};

    pub struct Platform {
        wifi: EspWifi<'static>,
    }

    impl Platform {
        pub fn new(wifi: EspWifi<'static>) -> Self {
            Self { wifi }
        }

        pub fn mode(&self) -> WifiMode {
            match self.wifi.get_configuration() {
                Ok(Configuration::Client(_)) => WifiMode::Station,
                Ok(Configuration::AccessPoint(_)) => WifiMode::AccessPoint,
                Ok(Configuration::Mixed(..)) => WifiMode::Mixed,
                Ok(Configuration::None) => WifiMode::Off,
                Err(e) => {
                    warn!("WiFi: cannot read configuration: {}", e);
                    WifiMode::Off
                }
            }
        }

        pub fn is_associated(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }

        pub fn disconnect(&mut self) {
            // Fails harmlessly when not connected.
            if let Err(e) = self.wifi.disconnect() {
                debug!("WiFi: disconnect: {}", e);
            }
        }

        pub fn begin_station(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
            let config = ClientConfiguration {
                ssid: ssid.try_into().map_err(|_| NetworkError::InvalidSsid)?,
                password: password.try_into().map_err(|_| NetworkError::InvalidPassword)?,
                auth_method: if password.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            };
            self.wifi
                .set_configuration(&Configuration::Client(config))
                .map_err(|e| {
                    warn!("WiFi: set_configuration failed: {}", e);
                    NetworkError::Driver
                })?;
            if !self.wifi.is_started().unwrap_or(false) {
                self.wifi.start().map_err(|e| {
                    warn!("WiFi: start failed: {}", e);
                    NetworkError::Driver
                })?;
            }
            self.wifi.connect().map_err(|e| {
                warn!("WiFi: connect failed: {}", e);
                NetworkError::Driver
            })?;
            info!("WiFi(espidf): association with '{}' started", ssid);
            Ok(())
        }

        pub fn local_address(&self) -> Option<Ipv4Addr> {
            self.wifi
                .sta_netif()
                .get_ip_info()
                .ok()
                .map(|info| info.ip)
                .filter(|ip| !ip.is_unspecified())
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod platform {
    use core::net::Ipv4Addr;

    use log::info;

    use crate::app::ports::{NetworkError, WifiMode};
    use crate::protocol::command::{Password, Ssid};

    #[derive(Debug)]
    pub struct Platform {
        pub(super) mode: WifiMode,
        pub(super) associated: bool,
        pub(super) address: Option<Ipv4Addr>,
        pub(super) fail_next_start: bool,
        pub(super) disconnects: u32,
        pub(super) station_ssid: Option<Ssid>,
        pub(super) station_password: Option<Password>,
    }

    impl Platform {
        pub fn new() -> Self {
            Self {
                mode: WifiMode::Station,
                associated: false,
                address: None,
                fail_next_start: false,
                disconnects: 0,
                station_ssid: None,
                station_password: None,
            }
        }

        pub fn mode(&self) -> WifiMode {
            self.mode
        }

        pub fn is_associated(&self) -> bool {
            self.associated
        }

        pub fn disconnect(&mut self) {
            self.associated = false;
            self.address = None;
            self.disconnects += 1;
            info!("WiFi(sim): disconnected");
        }

        pub fn begin_station(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
            if core::mem::take(&mut self.fail_next_start) {
                return Err(NetworkError::Driver);
            }
            self.mode = WifiMode::Station;
            self.associated = false;
            let mut s = Ssid::new();
            s.push_str(ssid).map_err(|()| NetworkError::InvalidSsid)?;
            let mut p = Password::new();
            p.push_str(password).map_err(|()| NetworkError::InvalidPassword)?;
            self.station_ssid = Some(s);
            self.station_password = Some(p);
            info!("WiFi(sim): association with '{}' started", ssid);
            Ok(())
        }

        pub fn local_address(&self) -> Option<Ipv4Addr> {
            self.address
        }
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    inner: platform::Platform,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(wifi: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self {
            inner: platform::Platform::new(wifi),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    /// Station mode, not associated, no address.
    pub fn new() -> Self {
        Self {
            inner: platform::Platform::new(),
        }
    }

    pub fn set_mode(&mut self, mode: WifiMode) {
        self.inner.mode = mode;
    }

    /// Simulate the AP accepting (or dropping) the station.
    pub fn set_associated(&mut self, associated: bool) {
        self.inner.associated = associated;
    }

    pub fn set_address(&mut self, address: Option<Ipv4Addr>) {
        self.inner.address = address;
    }

    /// Make the next `begin_station` fail with a driver error.
    pub fn fail_next_start(&mut self) {
        self.inner.fail_next_start = true;
    }

    pub fn disconnect_count(&self) -> u32 {
        self.inner.disconnects
    }

    /// SSID of the last successfully started association.
    pub fn station_ssid(&self) -> Option<&str> {
        self.inner.station_ssid.as_deref()
    }

    /// Password handed to the last successfully started association.
    pub fn station_password(&self) -> Option<&str> {
        self.inner.station_password.as_deref()
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn mode(&self) -> WifiMode {
        self.inner.mode()
    }

    fn is_associated(&self) -> bool {
        self.inner.is_associated()
    }

    fn disconnect(&mut self) {
        self.inner.disconnect();
    }

    fn begin_station(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        info!("WiFi: connecting to '{}'", ssid);
        self.inner.begin_station(ssid, password)
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.inner.local_address()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
