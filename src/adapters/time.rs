//! ESP32 time adapter.
//!
//! Provides the per-tick timestamp pair for the FloraNode system: a
//! monotonic millisecond count driving window retention, and Unix wall
//! time for report timestamps.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` (monotonic,
//!   microsecond precision) and `gettimeofday()` (SNTP-synced wall clock).
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant`; the wall
//!   clock reads as unsynced so report timestamps render empty.

use crate::signals::SampleStamp;

/// Time adapter for the ESP32 platform.
pub struct Esp32Clock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32Clock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1000
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Unix wall time in seconds, or `0` while the clock has never been
    /// synced (pre-SNTP) — readings taken then report "never recorded".
    #[cfg(target_os = "espidf")]
    pub fn epoch_secs(&self) -> u64 {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return 0;
        }
        // Reject obviously unsynced time (e.g. before 2020-01-01)
        const EPOCH_2020: i64 = 1_577_836_800;
        if i64::from(tv.tv_sec) < EPOCH_2020 {
            return 0;
        }
        tv.tv_sec as u64
    }

    /// Unix wall time. On non-ESP targets (simulation) always unsynced.
    #[cfg(not(target_os = "espidf"))]
    pub fn epoch_secs(&self) -> u64 {
        0
    }

    /// The timestamp pair applied to every reading pulled this tick.
    pub fn stamp(&self) -> SampleStamp {
        SampleStamp {
            mono_ms: self.uptime_ms(),
            epoch_secs: self.epoch_secs(),
        }
    }
}
