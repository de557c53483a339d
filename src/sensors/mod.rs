//! Sensor subsystem — one driver per physical sensor family.
//!
//! Every driver implements the [`SignalSource`](crate::signals::SignalSource)
//! capability: one `sample()` is one physical measurement, with the family's
//! value derivation applied per channel and NaN standing in for rail values
//! and bus failures. The registry decides at boot which of these candidates
//! are actually populated on the board.

pub mod dht;
pub mod light;
pub mod soil_moisture;

use crate::config::SystemConfig;
use crate::pins;
use crate::signals::SignalSource;

use dht::DhtSensor;
use light::LightSensor;
use soil_moisture::{SoilCalibration, SoilMoistureSensor};

/// The candidate sources for this board, in discovery order.
pub fn candidate_sources(config: &SystemConfig) -> Vec<Box<dyn SignalSource>> {
    vec![
        Box::new(DhtSensor::new(pins::DHT_DATA_GPIO)),
        Box::new(SoilMoistureSensor::new(
            pins::SOIL_ADC_GPIO,
            SoilCalibration::from_config(config),
        )),
        Box::new(LightSensor::new(pins::LIGHT_ADC_GPIO)),
    ]
}
