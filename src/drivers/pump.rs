//! Watering pump driver (low-side MOSFET switch).
//!
//! On/off control only — flow dosing is done by run time, not PWM, since
//! the pump's delivery rate is effectively constant at its rated voltage.
//!
//! ## Safety contract
//!
//! The pump must never run unbounded. Run duration is owned by the
//! [`WateringController`](crate::control::watering::WateringController);
//! this driver is a dumb actuator.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the gate GPIO via the sys API.
//! On host/test: tracks state in-memory only.

use log::info;

use crate::app::ports::PumpPort;
use crate::pins;

pub struct PumpDriver {
    running: bool,
}

impl PumpDriver {
    pub fn new() -> Self {
        Self { running: false }
    }

    #[cfg(target_os = "espidf")]
    fn set_gate(&self, high: bool) {
        use esp_idf_svc::sys::{gpio_set_direction, gpio_set_level, gpio_mode_t_GPIO_MODE_OUTPUT};
        // SAFETY: plain register writes on a pin this driver owns.
        unsafe {
            gpio_set_direction(pins::PUMP_GATE_GPIO, gpio_mode_t_GPIO_MODE_OUTPUT);
            gpio_set_level(pins::PUMP_GATE_GPIO, u32::from(high));
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_gate(&self, high: bool) {
        let _ = pins::PUMP_GATE_GPIO;
        info!("pump(sim): gate {}", if high { "HIGH" } else { "LOW" });
    }
}

impl Default for PumpDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PumpPort for PumpDriver {
    fn set_running(&mut self, on: bool) {
        if self.running == on {
            return;
        }
        self.running = on;
        self.set_gate(on);
        info!("pump: {}", if on { "on" } else { "off" });
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
