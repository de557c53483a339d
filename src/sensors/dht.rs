//! DHT22 combined temperature/humidity sensor driver.
//!
//! One bus transaction yields both channels: ambient temperature (°C) and
//! relative humidity (%). A failed transaction (bus timeout, checksum
//! mismatch) yields NaN on both channels for that tick; the next tick
//! retries from scratch. The single-wire protocol is re-driven on every
//! read — the driver keeps no session state, so a sensor that was absent
//! at one read can answer the next without re-initialisation.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the single-wire protocol via hw_init.
//! On host/test: reads from a pair of static AtomicU32 f32-bit cells.

use core::sync::atomic::AtomicU32;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::signals::{ChannelSample, SignalKind, SignalSource, MAX_CHANNELS};

static SIM_DHT_TEMP_BITS: AtomicU32 = AtomicU32::new(f32::NAN.to_bits());
static SIM_DHT_HUMIDITY_BITS: AtomicU32 = AtomicU32::new(f32::NAN.to_bits());

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_dht(temperature_c: f32, humidity_pct: f32) {
    SIM_DHT_TEMP_BITS.store(temperature_c.to_bits(), Ordering::Relaxed);
    SIM_DHT_HUMIDITY_BITS.store(humidity_pct.to_bits(), Ordering::Relaxed);
}

/// Physically plausible DHT22 output ranges; anything outside is a glitch.
const TEMP_RANGE_C: core::ops::RangeInclusive<f32> = -40.0..=80.0;
const HUMIDITY_RANGE_PCT: core::ops::RangeInclusive<f32> = 0.0..=100.0;

pub struct DhtSensor {
    data_gpio: i32,
}

impl DhtSensor {
    pub fn new(data_gpio: i32) -> Self {
        Self { data_gpio }
    }

    #[cfg(target_os = "espidf")]
    fn read_pair(&mut self) -> (f32, f32) {
        match hw_init::dht22_read(self.data_gpio) {
            Some((t, h)) => (t, h),
            None => (f32::NAN, f32::NAN),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_pair(&mut self) -> (f32, f32) {
        let _ = self.data_gpio;
        (
            f32::from_bits(SIM_DHT_TEMP_BITS.load(Ordering::Relaxed)),
            f32::from_bits(SIM_DHT_HUMIDITY_BITS.load(Ordering::Relaxed)),
        )
    }

    fn checked(value: f32, range: &core::ops::RangeInclusive<f32>) -> f32 {
        if value.is_finite() && range.contains(&value) {
            value
        } else {
            f32::NAN
        }
    }
}

impl SignalSource for DhtSensor {
    fn family(&self) -> &'static str {
        "dht22"
    }

    fn channels(&self) -> &'static [SignalKind] {
        &[SignalKind::EnvTemperature, SignalKind::EnvHumidity]
    }

    fn sample(&mut self) -> heapless::Vec<ChannelSample, MAX_CHANNELS> {
        let (temperature, humidity) = self.read_pair();
        let mut out = heapless::Vec::new();
        let _ = out.push(ChannelSample {
            kind: SignalKind::EnvTemperature,
            value: Self::checked(temperature, &TEMP_RANGE_C),
        });
        let _ = out.push(ChannelSample {
            kind: SignalKind::EnvHumidity,
            value: Self::checked(humidity, &HUMIDITY_RANGE_PCT),
        });
        out
    }
}
