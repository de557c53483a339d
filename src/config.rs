//! System configuration parameters
//!
//! All tunable parameters for the FloraNode system.
//! Values can be overridden via NVS (non-volatile storage); the connection
//! timeout additionally accepts a per-provisioning override.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Sampling ---
    /// Sampling/tick interval (milliseconds). One reading per active signal
    /// is pulled every tick.
    pub sample_interval_ms: u32,
    /// Retention of the smoothing window (milliseconds).
    pub short_window_ms: u32,
    /// Retention of the min/max/average reporting window (seconds).
    pub long_window_secs: u32,

    // --- Connectivity ---
    /// Failed connection ticks before falling back to provisioning.
    pub connect_timeout_ticks: u32,
    /// How long an operator-requested provisioning window stays open (seconds).
    pub provisioning_window_secs: u32,

    // --- Watering pump ---
    /// Pump delivery rate in mL/min (120 L/h class peristaltic pump).
    pub pump_flow_ml_per_min: u16,
    /// Hard cap on a single watering run (seconds).
    pub max_watering_secs: u16,

    // --- Soil-moisture calibration ---
    /// Raw ADC count of a probe in dry air (0 % moisture).
    pub soil_dry_raw: u16,
    /// Raw ADC count of a probe in water (100 % moisture).
    pub soil_wet_raw: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sampling
            sample_interval_ms: 1000, // 1 Hz
            short_window_ms: 1000,
            long_window_secs: 86_400, // 24 h

            // Connectivity
            connect_timeout_ticks: 30,
            provisioning_window_secs: 300, // 5 min

            // Watering
            pump_flow_ml_per_min: 2000, // 120 L/h
            max_watering_secs: 30,

            // Soil calibration (probe-specific, set at assembly)
            soil_dry_raw: 2800,
            soil_wet_raw: 800,
        }
    }
}
