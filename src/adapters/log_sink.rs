//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing provisioning events to the ESP-IDF
//! logger (UART / USB-CDC in production). Passwords never reach this sink.

use log::{info, warn};

use crate::app::events::ImprovEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ImprovEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ImprovEvent) {
        match event {
            ImprovEvent::Started(state) => {
                info!("START | initial_state={}", state.name());
            }
            ImprovEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            ImprovEvent::ErrorReported(code) => {
                warn!("ERROR | reported {:?} to host", code);
            }
            ImprovEvent::CredentialsReceived { ssid, persisted } => {
                info!(
                    "CREDS | ssid='{}' | {}",
                    ssid,
                    if *persisted { "persisted" } else { "NOT persisted" }
                );
            }
        }
    }
}
