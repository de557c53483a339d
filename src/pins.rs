//! GPIO / peripheral pin assignments for the FloraNode carrier board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Sensors — Digital
// ---------------------------------------------------------------------------

/// DHT22 combined temperature/humidity sensor — single-wire data line.
pub const DHT_DATA_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1)
// ---------------------------------------------------------------------------

/// Capacitive soil-moisture probe — analog voltage output.
/// ADC1 channel 6 (GPIO 34, input-only on ESP32).
pub const SOIL_ADC_GPIO: i32 = 34;

/// Photoresistor divider for ambient light — analog voltage output.
/// ADC1 channel 7 (GPIO 35, input-only on ESP32).
pub const LIGHT_ADC_GPIO: i32 = 35;

/// ADC attenuation for both analog channels (11 dB → 0 – 3.1 V range).
pub const SENSOR_ADC_ATTEN: u32 = 3; // esp_idf_hal::adc::attenuation::DB_11

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Watering pump MOSFET gate (active HIGH). The pump itself runs from the
/// 12 V rail; this pin only switches the low-side MOSFET.
pub const PUMP_GATE_GPIO: i32 = 18;
