//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements      | Connects to                |
//! |-------------|-----------------|----------------------------|
//! | `uart`      | Transport       | ESP-IDF UART / loopback    |
//! | `wifi`      | NetworkPort     | ESP-IDF WiFi STA           |
//! | `nvs`       | CredentialStore | NVS / in-memory store      |
//! | `log_sink`  | EventSink       | Serial log output          |
//! | `time`      | (clock)         | ESP32 system timer         |
//! | `device_id` | (identity)      | eFuse factory MAC          |

pub mod device_id;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod uart;
pub(super) mod utils;
pub mod wifi;
