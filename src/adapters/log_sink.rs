//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! The reporting uplink implements the same trait on the backend side.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::LinkStateChanged { from, to } => {
                info!("LINK  | {:?} -> {:?}", from, to);
            }
            AppEvent::ProvisioningOpened => {
                info!("PROV  | channel advertised");
            }
            AppEvent::ProvisioningClosed => {
                info!("PROV  | channel closed");
            }
            AppEvent::CredentialsAccepted => {
                info!("PROV  | credential bundle accepted");
            }
            AppEvent::CredentialsRejected(e) => {
                warn!("PROV  | submission rejected: {e}");
            }
            AppEvent::CredentialPersistFailed(e) => {
                warn!("PROV  | persist failed ({e}), continuing on in-memory credentials");
            }
            AppEvent::WateringStarted { milliliters, ticks } => {
                info!("WATER | dispensing {milliliters:.0} mL over {ticks} tick(s)");
            }
            AppEvent::WateringFinished => {
                info!("WATER | run complete");
            }
            AppEvent::WateringCancelled => {
                warn!("WATER | run cancelled");
            }
        }
    }
}
