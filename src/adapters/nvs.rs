//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`CredentialStore`] for the Improv service. The submitted
//! credentials are stored as one `postcard` blob so SSID and password are
//! always written together.
//!
//! # Security
//!
//! - Encrypted NVS: on ESP32, the `improv` namespace should live on the
//!   encrypted NVS partition. The simulation backend uses plaintext
//!   (dev/test only).
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.

use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use core::ffi::CStr;

use crate::app::ports::{CredentialStore, StoreError};
use crate::protocol::command::WifiCredentials;

#[cfg(target_os = "espidf")]
const NAMESPACE: &CStr = c"improv";
#[cfg(target_os = "espidf")]
const WIFI_KEY: &CStr = c"wifi";

#[cfg(target_os = "espidf")]
const OK: esp_err_t = ESP_OK as esp_err_t;
#[cfg(target_os = "espidf")]
const NOT_FOUND: esp_err_t = ESP_ERR_NVS_NOT_FOUND as esp_err_t;

#[cfg(not(target_os = "espidf"))]
const NAMESPACE: &str = "improv";
#[cfg(not(target_os = "espidf"))]
const WIFI_KEY: &str = "wifi";

/// Upper bound for the encoded credentials blob (32 + 64 bytes of text
/// plus varint lengths).
const MAX_BLOB_SIZE: usize = 128;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
    #[cfg(not(target_os = "espidf"))]
    fail_writes: bool,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StoreError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
            {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != OK || unsafe { nvs_flash_init() } != OK {
                    return Err(StoreError::IoError);
                }
            } else if ret != OK {
                return Err(StoreError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
            #[cfg(not(target_os = "espidf"))]
            fail_writes: false,
        })
    }

    /// Open the `improv` namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, esp_err_t>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(NAMESPACE.as_ptr(), mode, &mut handle) };
        if ret != OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key() -> String {
        format!("{}::{}", NAMESPACE, WIFI_KEY)
    }

    /// Simulation: make every subsequent write fail with `IoError`.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Simulation: overwrite the raw stored blob.
    #[cfg(not(target_os = "espidf"))]
    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.store.insert(Self::composite_key(), bytes.to_vec());
    }
}

impl CredentialStore for NvsAdapter {
    fn write_wifi_config(&mut self, ssid: &str, password: &str) -> Result<(), StoreError> {
        let creds = WifiCredentials::new(ssid, password).map_err(|_| StoreError::IoError)?;
        let bytes = postcard::to_allocvec(&creds).map_err(|_| StoreError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(StoreError::Full);
        }

        #[cfg(not(target_os = "espidf"))]
        {
            if self.fail_writes {
                return Err(StoreError::IoError);
            }
            self.store.insert(Self::composite_key(), bytes);
            info!("NvsAdapter: WiFi config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(handle, WIFI_KEY.as_ptr(), bytes.as_ptr().cast(), bytes.len())
                };
                if ret != OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: WiFi config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE as esp_err_t => Err(StoreError::Full),
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(StoreError::IoError)
                }
            }
        }
    }

    fn load_wifi_config(&self) -> Result<Option<WifiCredentials>, StoreError> {
        #[cfg(not(target_os = "espidf"))]
        let bytes = self.store.get(&Self::composite_key()).cloned();

        #[cfg(target_os = "espidf")]
        let bytes = {
            let result = Self::with_nvs_handle(false, |handle| {
                let mut buf = [0u8; MAX_BLOB_SIZE];
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(handle, WIFI_KEY.as_ptr(), buf.as_mut_ptr().cast(), &mut size)
                };
                if ret != OK {
                    return Err(ret);
                }
                Ok(buf[..size].to_vec())
            });
            match result {
                Ok(bytes) => Some(bytes),
                // A missing namespace or key both mean nothing was saved yet.
                Err(NOT_FOUND) => None,
                Err(e) => {
                    warn!("NvsAdapter: NVS read error {}", e);
                    return Err(StoreError::IoError);
                }
            }
        };

        let Some(bytes) = bytes else {
            info!("NvsAdapter: no stored WiFi config");
            return Ok(None);
        };
        let creds: WifiCredentials = postcard::from_bytes(&bytes).map_err(|_| StoreError::Corrupted)?;
        info!("NvsAdapter: loaded WiFi config for '{}'", creds.ssid);
        Ok(Some(creds))
    }
}
