//! Timed watering runs on the shared tick.
//!
//! The backend requests a volume in millilitres; the controller converts it
//! to a pump run time from the pump's delivery rate, caps it at the
//! configured maximum, and counts the run down one tick at a time. The pump
//! is never driven by a blocking sleep — a run in progress cannot starve
//! the sampling or connectivity ticks, and it can be cancelled cleanly at
//! any tick boundary.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, PumpPort};
use crate::config::SystemConfig;

/// Tick-driven countdown controlling the watering pump.
pub struct WateringController {
    remaining_ticks: u32,
}

impl WateringController {
    pub fn new() -> Self {
        Self { remaining_ticks: 0 }
    }

    /// A run is currently in progress.
    pub fn is_active(&self) -> bool {
        self.remaining_ticks > 0
    }

    /// Ticks left in the current run.
    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    /// Convert a requested volume to a capped tick count.
    ///
    /// Returns `None` for a non-finite or non-positive volume.
    pub fn ticks_for_volume(milliliters: f32, config: &SystemConfig) -> Option<u32> {
        if !milliliters.is_finite() || milliliters <= 0.0 {
            return None;
        }

        let flow_ml_per_ms = f64::from(config.pump_flow_ml_per_min) / 60_000.0;
        let run_ms = f64::from(milliliters) / flow_ml_per_ms;
        let capped_ms = run_ms.min(f64::from(config.max_watering_secs) * 1000.0);

        let tick_ms = f64::from(config.sample_interval_ms.max(1));
        Some((capped_ms / tick_ms).ceil().max(1.0) as u32)
    }

    /// Start a run. A request arriving while a run is active replaces the
    /// remaining countdown rather than queueing.
    pub fn start(
        &mut self,
        milliliters: f32,
        config: &SystemConfig,
        pump: &mut impl PumpPort,
        sink: &mut impl EventSink,
    ) {
        let Some(ticks) = Self::ticks_for_volume(milliliters, config) else {
            warn!("watering: rejected request for {milliliters} mL");
            return;
        };

        info!("watering: dispensing {milliliters:.0} mL over {ticks} tick(s)");
        self.remaining_ticks = ticks;
        pump.set_running(true);
        sink.emit(&AppEvent::WateringStarted { milliliters, ticks });
    }

    /// Advance the countdown by one tick; stops the pump when it reaches
    /// zero.
    pub fn tick(&mut self, pump: &mut impl PumpPort, sink: &mut impl EventSink) {
        if self.remaining_ticks == 0 {
            return;
        }
        self.remaining_ticks -= 1;
        if self.remaining_ticks == 0 {
            pump.set_running(false);
            info!("watering: run complete");
            sink.emit(&AppEvent::WateringFinished);
        }
    }

    /// Abort the current run immediately.
    pub fn cancel(&mut self, pump: &mut impl PumpPort, sink: &mut impl EventSink) {
        if self.remaining_ticks == 0 {
            return;
        }
        self.remaining_ticks = 0;
        pump.set_running(false);
        warn!("watering: run cancelled");
        sink.emit(&AppEvent::WateringCancelled);
    }
}

impl Default for WateringController {
    fn default() -> Self {
        Self::new()
    }
}
