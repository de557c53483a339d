//! FloraNode Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single 1 Hz cooperative tick.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiAdapter    BleGateway       NvsStore       Esp32Clock     │
//! │  (LinkPort)     (Provisioning)   (Config+Creds) (timestamps)   │
//! │  PumpDriver     LogEventSink                                   │
//! │  (PumpPort)     (EventSink)                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Sampler · LinkMachine · Watering                      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};

use floranode::adapters::ble::BleGateway;
use floranode::adapters::log_sink::LogEventSink;
use floranode::adapters::nvs::NvsStore;
use floranode::adapters::time::Esp32Clock;
use floranode::adapters::wifi::WifiAdapter;
use floranode::app::ports::{ConfigPort, CredentialStore};
use floranode::app::service::AppService;
use floranode::config::SystemConfig;
use floranode::drivers::{hw_init, pump::PumpDriver};
use floranode::sensors::candidate_sources;
use floranode::signals::SensorRegistry;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  FloraNode v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    hw_init::init_peripherals().map_err(|e| anyhow::anyhow!("HAL init failed: {e}"))?;

    // ── 2. Load config and credentials from NVS ───────────────
    let mut nvs = NvsStore::new().map_err(|e| anyhow::anyhow!("NVS init failed: {e}"))?;
    let config = match ConfigPort::load(&nvs) {
        Ok(c) => c,
        Err(e) => {
            warn!("config load failed ({e}), using defaults");
            SystemConfig::default()
        }
    };
    let stored = CredentialStore::load(&nvs);
    info!(
        "boot: stored credentials {}",
        if stored.is_some() { "present" } else { "absent" }
    );

    // ── 3. Discover the populated sensor set ──────────────────
    let registry = SensorRegistry::discover(candidate_sources(&config), &config);
    if registry.is_empty() {
        warn!("no sensors discovered — node will report nothing this boot");
    }

    // ── 4. Build adapters ─────────────────────────────────────
    let peripherals = esp_idf_svc::hal::peripherals::Peripherals::take()
        .context("peripherals already taken")?;
    let sysloop = esp_idf_svc::eventloop::EspSystemEventLoop::take()?;
    let nvs_partition = esp_idf_svc::nvs::EspDefaultNvsPartition::take()?;
    let wifi_driver = esp_idf_svc::wifi::EspWifi::new(
        peripherals.modem,
        sysloop,
        Some(nvs_partition),
    )?;

    let mut link = WifiAdapter::new(wifi_driver);
    // SNTP syncs the wall clock once the link is up; until then report
    // timestamps render as "never recorded".
    let _sntp = esp_idf_svc::sntp::EspSntp::new_default()?;
    let mut gateway = BleGateway::new();
    let mut pump = PumpDriver::new();
    let mut sink = LogEventSink::new();
    let clock = Esp32Clock::new();

    // ── 5. Start the service and run the tick loop ────────────
    let tick_period = Duration::from_millis(u64::from(config.sample_interval_ms));
    let mut service = AppService::new(config, registry, stored.as_ref());
    service.start(&mut gateway, &mut sink);

    loop {
        let tick_started = Instant::now();

        service.tick(
            clock.stamp(),
            &mut link,
            &mut gateway,
            &mut nvs,
            &mut pump,
            &mut sink,
        );

        // A slow sensor read eats into this tick's budget rather than
        // skewing the schedule.
        let elapsed = tick_started.elapsed();
        if let Some(remaining) = tick_period.checked_sub(elapsed) {
            std::thread::sleep(remaining);
        } else {
            warn!("tick overran its period ({} ms)", elapsed.as_millis());
        }
    }
}
