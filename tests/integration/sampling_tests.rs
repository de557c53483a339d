//! Integration tests for discovery, sampling, and the status report.

use floranode::config::SystemConfig;
use floranode::report::status_report;
use floranode::signals::{
    SampleStamp, SamplingScheduler, SensorRegistry, SignalKind, SignalSource,
};

use crate::mock_hw::QueueSource;

fn stamp(mono_ms: u64, epoch_secs: u64) -> SampleStamp {
    SampleStamp { mono_ms, epoch_secs }
}

#[test]
fn smoothing_window_tracks_the_last_second() {
    let config = SystemConfig::default();
    // Discovery consumes the first value; the next three are the scenario.
    let source = QueueSource::new(
        SignalKind::EnvTemperature,
        &[19.0, 20.0, 22.0, 21.0],
    );
    let mut registry = SensorRegistry::discover(vec![Box::new(source)], &config);
    let mut sampler = SamplingScheduler::new();

    sampler.tick(&mut registry, stamp(0, 0));
    sampler.tick(&mut registry, stamp(500, 0));
    sampler.tick(&mut registry, stamp(1200, 0));

    let (kind, snap) = registry.snapshots()[0];
    assert_eq!(kind, SignalKind::EnvTemperature);
    assert_eq!(snap.current, 21.0);
    // The t=0 reading aged out of the 1 s window: mean of 22.0 and 21.0.
    assert!((snap.short_avg - 21.5).abs() < 1e-6);
}

#[test]
fn daily_extremes_survive_invalid_ticks() {
    let config = SystemConfig::default();
    let source = QueueSource::new(
        SignalKind::EnvHumidity,
        &[50.0, 43.0, f32::NAN, 61.0, f32::NAN, 48.0],
    );
    let mut registry = SensorRegistry::discover(vec![Box::new(source)], &config);
    let mut sampler = SamplingScheduler::new();

    for i in 1..=5u64 {
        sampler.tick(&mut registry, stamp(i * 1000, 1_700_000_000 + i));
    }

    let (_, snap) = registry.snapshots()[0];
    assert_eq!(snap.current, 48.0);
    assert_eq!(snap.long_min, 43.0);
    assert_eq!(snap.long_min_epoch, 1_700_000_001);
    assert_eq!(snap.long_max, 61.0);
    assert_eq!(snap.long_max_epoch, 1_700_000_003);
    // Only the three valid readings count toward the mean.
    assert!((snap.long_avg - (43.0 + 61.0 + 48.0) / 3.0).abs() < 1e-4);
}

#[test]
fn report_covers_every_active_signal() {
    let config = SystemConfig::default();
    let sources: Vec<Box<dyn SignalSource>> = vec![
        Box::new(QueueSource::new(SignalKind::EnvTemperature, &[21.0; 4])),
        Box::new(QueueSource::new(SignalKind::EnvHumidity, &[55.0; 4])),
    ];
    let mut registry = SensorRegistry::discover(sources, &config);
    let mut sampler = SamplingScheduler::new();
    sampler.tick(&mut registry, stamp(1000, 1_700_000_000));

    let rows = status_report(&registry);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].signal_type, "ENV_TEMPERATURE");
    assert_eq!(rows[0].unit, "°C");
    assert_eq!(rows[1].signal_type, "ENV_HUMIDITY");
    assert_eq!(rows[1].current_value, 55.0);
    assert_eq!(rows[0].long_min_timestamp, "2023-11-14T22:13:20Z");
}

#[test]
fn absent_sensor_never_appears_in_the_report() {
    let config = SystemConfig::default();
    let sources: Vec<Box<dyn SignalSource>> = vec![
        Box::new(QueueSource::new(SignalKind::EnvTemperature, &[f32::NAN; 8])),
        Box::new(QueueSource::new(SignalKind::EnvHumidity, &[40.0; 8])),
    ];
    let mut registry = SensorRegistry::discover(sources, &config);
    let mut sampler = SamplingScheduler::new();

    for i in 1..=3u64 {
        sampler.tick(&mut registry, stamp(i * 1000, 0));
    }

    let rows = status_report(&registry);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].signal_type, "ENV_HUMIDITY");
}

#[test]
fn snapshots_are_stable_between_ticks() {
    let config = SystemConfig::default();
    let source = QueueSource::new(SignalKind::EnvTemperature, &[20.0, 21.0]);
    let mut registry = SensorRegistry::discover(vec![Box::new(source)], &config);
    let mut sampler = SamplingScheduler::new();
    sampler.tick(&mut registry, stamp(1000, 0));

    let first = registry.snapshots();
    let second = registry.snapshots();
    assert_eq!(first[0].1, second[0].1);
}
