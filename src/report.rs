//! Status snapshot structs consumed by the reporting layer.
//!
//! The reporting/uplink layer is external to this crate; it takes the
//! [`SignalStatus`] rows built here and serialises them onto whatever
//! transport it uses. Field names follow the backend's DTO contract.

use serde::Serialize;

use crate::signals::SensorRegistry;
use crate::timefmt::iso8601_utc;

/// Point-in-time statistics of one active signal.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignalStatus {
    #[serde(rename = "type")]
    pub signal_type: &'static str,
    pub unit: &'static str,
    pub current_value: f32,
    pub short_average: f32,
    pub long_average: f32,
    pub long_min: f32,
    /// ISO-8601 UTC, empty when the extreme was recorded before wall-clock
    /// sync.
    pub long_min_timestamp: String,
    pub long_max: f32,
    pub long_max_timestamp: String,
}

/// Build one status row per active signal, in discovery order.
pub fn status_report(registry: &SensorRegistry) -> Vec<SignalStatus> {
    registry
        .snapshots()
        .into_iter()
        .map(|(kind, snap)| SignalStatus {
            signal_type: kind.as_str(),
            unit: kind.unit(),
            current_value: snap.current,
            short_average: snap.short_avg,
            long_average: snap.long_avg,
            long_min: snap.long_min,
            long_min_timestamp: iso8601_utc(snap.long_min_epoch),
            long_max: snap.long_max,
            long_max_timestamp: iso8601_utc(snap.long_max_epoch),
        })
        .collect()
}
