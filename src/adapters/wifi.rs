//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`] — the hexagonal boundary for network
//! association. The connectivity state machine owns all retry and fallback
//! policy; this adapter only starts attempts, reports link status, and
//! surfaces explicit disconnect events.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via
//!   `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use core::fmt;
use log::{error, info, warn};

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

pub use crate::error::LinkError;

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

/// Driven port for the network link layer.
pub trait LinkPort {
    /// Begin an association attempt with the given credentials. The
    /// attempt proceeds asynchronously; progress is observed via `poll`
    /// and `is_up`.
    fn begin(&mut self, network_id: &str, secret: &str) -> Result<(), LinkError>;

    /// Advance the driver's internal state. Called once per tick.
    fn poll(&mut self);

    /// The link layer reports an established association.
    fn is_up(&self) -> bool;

    /// Consume an explicitly observed disconnect event, if one occurred
    /// since the last call (distinct from a single failed status check).
    fn take_disconnect(&mut self) -> bool;

    /// Tear the interface down.
    fn shutdown(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Down,
    Associating,
    Up,
}

impl fmt::Display for WifiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "down"),
            Self::Associating => write!(f, "associating"),
            Self::Up => write!(f, "up"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation control
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_LINK_AVAILABLE: AtomicBool = AtomicBool::new(false);

/// Make the simulated access point reachable or not. An adapter in
/// `Associating` comes up on its next poll while available; an adapter in
/// `Up` observes an explicit disconnect when availability is withdrawn.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_link_available(available: bool) {
    SIM_LINK_AVAILABLE.store(available, Ordering::Relaxed);
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    disconnect_pending: bool,
    #[cfg(target_os = "espidf")]
    driver: esp_idf_svc::wifi::EspWifi<'static>,
}

impl WifiAdapter {
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Down,
            ssid: heapless::String::new(),
            disconnect_pending: false,
        }
    }

    /// Wrap a driver built in `main`, where peripheral ownership is
    /// established (the modem is shared with the BLE stack).
    #[cfg(target_os = "espidf")]
    pub fn new(driver: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Down,
            ssid: heapless::String::new(),
            disconnect_pending: false,
            driver,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_begin(&mut self, network_id: &str, secret: &str) -> Result<(), LinkError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if secret.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: network_id.try_into().map_err(|_| LinkError::BeginFailed)?,
            password: secret.try_into().map_err(|_| LinkError::BeginFailed)?,
            auth_method,
            ..Default::default()
        });

        self.driver
            .set_configuration(&config)
            .map_err(|_| LinkError::BeginFailed)?;
        if !self.driver.is_started().unwrap_or(false) {
            self.driver.start().map_err(|_| LinkError::BeginFailed)?;
        }
        self.driver.connect().map_err(|_| LinkError::BeginFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin(&mut self, _network_id: &str, _secret: &str) -> Result<(), LinkError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_poll(&mut self) {
        let connected = self.driver.is_connected().unwrap_or(false);
        match self.state {
            WifiState::Associating if connected => {
                self.state = WifiState::Up;
                info!("WiFi: associated with '{}'", self.ssid);
            }
            WifiState::Up if !connected => {
                self.state = WifiState::Down;
                self.disconnect_pending = true;
                warn!("WiFi: link to '{}' dropped", self.ssid);
            }
            _ => {}
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_poll(&mut self) {
        let available = SIM_LINK_AVAILABLE.load(Ordering::Relaxed);
        match self.state {
            WifiState::Associating if available => {
                self.state = WifiState::Up;
                info!("WiFi(sim): associated with '{}'", self.ssid);
            }
            WifiState::Up if !available => {
                self.state = WifiState::Down;
                self.disconnect_pending = true;
                warn!("WiFi(sim): link to '{}' dropped", self.ssid);
            }
            _ => {}
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_shutdown(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            warn!("WiFi: disconnect failed: {e}");
        }
        if let Err(e) = self.driver.stop() {
            warn!("WiFi: stop failed: {e}");
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_shutdown(&mut self) {
        info!("WiFi(sim): interface down");
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn begin(&mut self, network_id: &str, secret: &str) -> Result<(), LinkError> {
        if network_id.is_empty() {
            return Err(LinkError::NoCredentials);
        }

        self.ssid.clear();
        self.ssid
            .push_str(network_id)
            .map_err(|_| LinkError::BeginFailed)?;

        info!("WiFi: starting association with '{}'", self.ssid);
        match self.platform_begin(network_id, secret) {
            Ok(()) => {
                self.state = WifiState::Associating;
                Ok(())
            }
            Err(e) => {
                error!("WiFi: association request failed — {e}");
                self.state = WifiState::Down;
                Err(e)
            }
        }
    }

    fn poll(&mut self) {
        self.platform_poll();
    }

    fn is_up(&self) -> bool {
        self.state == WifiState::Up
    }

    fn take_disconnect(&mut self) -> bool {
        core::mem::take(&mut self.disconnect_pending)
    }

    fn shutdown(&mut self) {
        self.platform_shutdown();
        self.state = WifiState::Down;
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
