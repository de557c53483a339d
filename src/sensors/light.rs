//! Ambient-light sensor driver (photoresistor divider).
//!
//! Remaps the raw ADC count linearly from the converter's full range onto
//! 0 – 100 %. A count pinned at an ADC rail reads as NaN — a shorted or
//! missing divider, not darkness.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the ADC via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static AtomicU16 for injection.

use core::sync::atomic::AtomicU16;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::signals::{ChannelSample, SignalKind, SignalSource, ADC_FULL_SCALE, MAX_CHANNELS};

static SIM_LIGHT_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_light_adc(raw: u16) {
    SIM_LIGHT_ADC.store(raw, Ordering::Relaxed);
}

pub struct LightSensor {
    _adc_gpio: i32,
}

impl LightSensor {
    pub fn new(adc_gpio: i32) -> Self {
        Self { _adc_gpio: adc_gpio }
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(hw_init::ADC1_CH_LIGHT)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_LIGHT_ADC.load(Ordering::Relaxed)
    }

    fn percent_from_raw(raw: u16) -> f32 {
        if raw == 0 || raw >= ADC_FULL_SCALE {
            return f32::NAN;
        }
        ((f32::from(raw) / f32::from(ADC_FULL_SCALE)) * 100.0).clamp(0.0, 100.0)
    }
}

impl SignalSource for LightSensor {
    fn family(&self) -> &'static str {
        "light"
    }

    fn channels(&self) -> &'static [SignalKind] {
        &[SignalKind::LightLevel]
    }

    fn sample(&mut self) -> heapless::Vec<ChannelSample, MAX_CHANNELS> {
        let raw = self.read_adc();
        let mut out = heapless::Vec::new();
        let _ = out.push(ChannelSample {
            kind: SignalKind::LightLevel,
            value: Self::percent_from_raw(raw),
        });
        out
    }
}
