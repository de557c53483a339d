//! Integration tests for the watering command path.
//!
//! The backend's dispense command must translate into a bounded,
//! tick-driven pump run that coexists with sampling and connectivity.

use floranode::adapters::ble::BleGateway;
use floranode::app::commands::AppCommand;
use floranode::app::events::AppEvent;
use floranode::app::ports::PumpPort;
use floranode::app::service::AppService;
use floranode::config::SystemConfig;
use floranode::signals::{SampleStamp, SensorRegistry};

use crate::mock_hw::{bundle, MockCredentialStore, MockLink, MockPump, RecordingSink};

struct Harness {
    service: AppService,
    link: MockLink,
    gateway: BleGateway,
    store: MockCredentialStore,
    pump: MockPump,
    sink: RecordingSink,
    ticks: u64,
}

impl Harness {
    fn new() -> Self {
        let config = SystemConfig::default();
        let registry = SensorRegistry::discover(vec![], &config);
        let store = MockCredentialStore::with(bundle("HomeNet", "hunter22", "tok"));
        let stored = store.stored.clone();
        let mut service = AppService::new(config, registry, stored.as_ref());
        let mut gateway = BleGateway::new();
        let mut sink = RecordingSink::new();
        service.start(&mut gateway, &mut sink);
        Self {
            service,
            link: MockLink::new(),
            gateway,
            store,
            pump: MockPump::new(),
            sink,
            ticks: 0,
        }
    }

    fn tick(&mut self) {
        self.ticks += 1;
        self.service.tick(
            SampleStamp {
                mono_ms: self.ticks * 1000,
                epoch_secs: 0,
            },
            &mut self.link,
            &mut self.gateway,
            &mut self.store,
            &mut self.pump,
            &mut self.sink,
        );
    }

    fn dispense(&mut self, milliliters: f32) {
        self.service.handle_command(
            AppCommand::DispenseWater { milliliters },
            &mut self.gateway,
            &mut self.pump,
            &mut self.sink,
        );
    }
}

#[test]
fn dispense_runs_the_pump_for_the_computed_ticks() {
    let mut h = Harness::new();

    // 100 mL at 2000 mL/min is a 3 s run.
    h.dispense(100.0);
    assert!(h.pump.is_running());
    assert!(h.service.watering_active());

    h.tick();
    h.tick();
    assert!(h.pump.is_running());
    h.tick();
    assert!(!h.pump.is_running());
    assert!(!h.service.watering_active());

    assert_eq!(
        h.sink.count_of(|e| matches!(e, AppEvent::WateringStarted { .. })),
        1
    );
    assert_eq!(
        h.sink.count_of(|e| matches!(e, AppEvent::WateringFinished)),
        1
    );
}

#[test]
fn oversized_dispense_is_capped_not_unbounded() {
    let mut h = Harness::new();

    h.dispense(1_000_000.0);
    let started = h
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::WateringStarted { ticks, .. } => Some(*ticks),
            _ => None,
        })
        .unwrap();
    assert_eq!(started, 30, "capped at max_watering_secs");

    for _ in 0..30 {
        assert!(h.pump.is_running());
        h.tick();
    }
    assert!(!h.pump.is_running());
}

#[test]
fn invalid_dispense_never_touches_the_pump() {
    let mut h = Harness::new();
    h.dispense(f32::NAN);
    h.dispense(-10.0);
    assert!(h.pump.switches.is_empty());
    assert!(!h.service.watering_active());
}

#[test]
fn watering_does_not_stall_connectivity() {
    let mut h = Harness::new();

    h.dispense(100.0);
    h.tick(); // Idle -> Connecting while the pump runs
    h.link.up = true;
    h.tick();
    assert!(h.service.may_transmit());
    h.tick();
    assert!(!h.pump.is_running(), "run finished on schedule");
    assert!(h.service.may_transmit());
}
