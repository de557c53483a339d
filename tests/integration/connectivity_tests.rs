//! Integration tests for the connectivity lifecycle.
//!
//! Drives the full [`AppService`] tick with mock adapters: boot paths,
//! bounded-retry timeout, link-loss recovery, and deferred credential
//! persistence.

use floranode::adapters::ble::{BleGateway, ProvisioningPort};
use floranode::app::events::AppEvent;
use floranode::app::service::AppService;
use floranode::config::SystemConfig;
use floranode::conn::LinkState;
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
    fn new(config: SystemConfig, store: MockCredentialStore) -> Self {
        let registry = SensorRegistry::discover(vec![], &config);
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
}

fn config_with_timeout(ticks: u32) -> SystemConfig {
    SystemConfig {
        connect_timeout_ticks: ticks,
        ..Default::default()
    }
}

#[test]
fn boot_with_stored_credentials_reaches_connected() {
    let store = MockCredentialStore::with(bundle("HomeNet", "hunter22", "tok"));
    let mut h = Harness::new(SystemConfig::default(), store);
    assert_eq!(h.service.link_state(), LinkState::Idle);
    assert!(!h.service.may_transmit());

    h.tick(); // Idle -> Connecting, association begun from the store
    assert_eq!(h.service.link_state(), LinkState::Connecting);
    assert_eq!(h.link.began.len(), 1);
    assert_eq!(h.link.began[0].0, "HomeNet");

    h.link.up = true;
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Connected);
    assert!(h.service.may_transmit());
    assert!(!h.gateway.is_open());
}

#[test]
fn boot_without_credentials_opens_provisioning() {
    let mut h = Harness::new(SystemConfig::default(), MockCredentialStore::empty());
    assert_eq!(h.service.link_state(), LinkState::Fallback);
    assert!(h.gateway.is_open(), "fallback advertises the gateway at boot");

    for _ in 0..20 {
        h.tick();
    }
    assert_eq!(h.service.link_state(), LinkState::Fallback);
    assert!(h.link.began.is_empty(), "nothing to associate with");
}

#[test]
fn connect_timeout_falls_back_on_the_final_tick() {
    let store = MockCredentialStore::with(bundle("HomeNet", "hunter22", "tok"));
    let mut h = Harness::new(config_with_timeout(5), store);

    h.tick(); // Idle -> Connecting
    for i in 1..5 {
        h.tick();
        assert_eq!(
            h.service.link_state(),
            LinkState::Connecting,
            "failed tick {i} must not fall back yet"
        );
    }
    h.tick(); // 5th failed connection tick
    assert_eq!(h.service.link_state(), LinkState::Fallback);
    assert!(h.gateway.is_open());
}

#[test]
fn link_loss_retries_stored_credentials_then_falls_back() {
    let store = MockCredentialStore::with(bundle("HomeNet", "hunter22", "tok"));
    let mut h = Harness::new(config_with_timeout(3), store);

    h.tick();
    h.link.up = true;
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Connected);

    // The AP vanishes: one explicit disconnect event.
    h.link.drop_link();
    h.tick();
    assert_eq!(
        h.service.link_state(),
        LinkState::Connecting,
        "stored credentials are retried before any fallback"
    );
    assert_eq!(h.link.began.len(), 2);

    // That retry round exhausts its limit.
    h.tick();
    h.tick();
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Fallback);
}

#[test]
fn reconnect_after_brief_outage_stays_out_of_fallback() {
    let store = MockCredentialStore::with(bundle("HomeNet", "hunter22", "tok"));
    let mut h = Harness::new(config_with_timeout(10), store);

    h.tick();
    h.link.up = true;
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Connected);

    h.link.drop_link();
    h.tick(); // Connected -> Connecting
    h.tick(); // one failed tick
    h.link.up = true;
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Connected);
    assert!(!h.gateway.is_open());
}

#[test]
fn stored_timeout_override_shortens_the_round() {
    let mut stored = bundle("HomeNet", "hunter22", "tok");
    stored.timeout_override = Some(2);
    let store = MockCredentialStore::with(stored);
    // Config says 30 ticks; the stored override must win.
    let mut h = Harness::new(config_with_timeout(30), store);

    h.tick(); // Idle -> Connecting
    h.tick();
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Fallback);
}

#[test]
fn state_changes_are_emitted_exactly_once() {
    let store = MockCredentialStore::with(bundle("HomeNet", "hunter22", "tok"));
    let mut h = Harness::new(SystemConfig::default(), store);

    h.tick();
    h.link.up = true;
    h.tick();
    h.tick();
    h.tick();

    let changes: Vec<_> = h
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::LinkStateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (LinkState::Idle, LinkState::Connecting),
            (LinkState::Connecting, LinkState::Connected),
        ]
    );
}
