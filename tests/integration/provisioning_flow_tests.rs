//! Integration tests for the provisioning flow.
//!
//! Exercises the gateway → credential-bundle → state-machine path end to
//! end: rejection of malformed submissions, the single-shot transition on
//! acceptance, deferred persistence, and the timed exposure window.

use floranode::adapters::ble::{BleGateway, ProvisioningPort};
use floranode::app::commands::AppCommand;
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
    fn provisioning_boot() -> Self {
        Self::build(SystemConfig::default(), MockCredentialStore::empty())
    }

    fn connected(store: MockCredentialStore) -> Self {
        let mut h = Self::build(SystemConfig::default(), store);
        h.tick();
        h.link.up = true;
        h.tick();
        assert_eq!(h.service.link_state(), LinkState::Connected);
        h
    }

    fn build(config: SystemConfig, store: MockCredentialStore) -> Self {
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

    fn submit(&mut self, payload: &str) {
        self.gateway.on_characteristic_write(payload.as_bytes()).unwrap();
    }
}

const VALID: &str = r#"{"wifi_ssid":"HomeNet","wifi_password":"hunter22","api_key":"tok"}"#;

#[test]
fn malformed_submission_leaves_fallback_untouched() {
    let mut h = Harness::provisioning_boot();
    assert_eq!(h.service.link_state(), LinkState::Fallback);

    h.submit(r#"{"wifi_password":"hunter22","api_key":"tok"}"#); // no ssid
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Fallback);
    assert_eq!(
        h.sink.count_of(|e| matches!(e, AppEvent::CredentialsRejected(_))),
        1
    );
    assert!(h.link.began.is_empty());
    assert_eq!(h.store.store_calls, 0, "no partial persistence");
}

#[test]
fn valid_submission_starts_association_exactly_once() {
    let mut h = Harness::provisioning_boot();

    h.submit(VALID);
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Connecting);
    assert_eq!(h.link.began.len(), 1);
    assert_eq!(h.link.began[0], ("HomeNet".to_string(), "hunter22".to_string()));

    // The same bundle never retriggers a transition.
    h.tick();
    h.tick();
    assert_eq!(h.link.began.len(), 1);
    assert_eq!(
        h.sink.count_of(|e| matches!(e, AppEvent::CredentialsAccepted)),
        1
    );
}

#[test]
fn credentials_persist_only_after_association_succeeds() {
    let mut h = Harness::provisioning_boot();

    h.submit(VALID);
    h.tick();
    assert_eq!(h.store.store_calls, 0, "not persisted while unproven");

    h.link.up = true;
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Connected);
    assert_eq!(h.store.store_calls, 1);
    assert_eq!(
        h.store.stored.as_ref().unwrap().network_id.as_str(),
        "HomeNet"
    );
    assert!(!h.gateway.is_open(), "gateway closes once connected");
}

#[test]
fn unreachable_bundle_is_not_persisted() {
    let config = SystemConfig {
        connect_timeout_ticks: 2,
        ..Default::default()
    };
    let mut h = Harness::build(config, MockCredentialStore::empty());

    h.submit(VALID);
    h.tick(); // Fallback -> Connecting
    h.tick();
    h.tick(); // round exhausted
    assert_eq!(h.service.link_state(), LinkState::Fallback);
    assert_eq!(h.store.store_calls, 0);
    assert!(h.gateway.is_open(), "back to waiting for the operator");
}

#[test]
fn persist_failure_is_surfaced_but_not_fatal() {
    let mut h = Harness::provisioning_boot();
    h.store.fail_writes = true;

    h.submit(VALID);
    h.tick();
    h.link.up = true;
    h.tick();

    // Still connected on the in-memory bundle, but the failure is visible.
    assert_eq!(h.service.link_state(), LinkState::Connected);
    assert_eq!(
        h.sink.count_of(|e| matches!(e, AppEvent::CredentialPersistFailed(_))),
        1
    );
    assert!(h.store.stored.is_none(), "nothing claims to be persisted");
}

#[test]
fn credential_update_while_connected_switches_networks() {
    let mut h = Harness::connected(MockCredentialStore::with(bundle(
        "OldNet", "oldpass99", "tok",
    )));

    h.service.handle_command(
        AppCommand::OpenProvisioning { duration_secs: 60 },
        &mut h.gateway,
        &mut h.pump,
        &mut h.sink,
    );
    assert!(h.gateway.is_open());

    h.submit(r#"{"wifi_ssid":"NewNet","wifi_password":"newpass99","api_key":"tok2"}"#);
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Connecting);
    assert_eq!(h.link.began.last().unwrap().0, "NewNet");

    h.link.up = true;
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Connected);
    assert_eq!(
        h.store.stored.as_ref().unwrap().network_id.as_str(),
        "NewNet",
        "the proven bundle replaced the stored set"
    );
}

#[test]
fn provisioning_window_expires_and_discards_partial_input() {
    let mut h = Harness::connected(MockCredentialStore::with(bundle(
        "HomeNet", "hunter22", "tok",
    )));

    h.service.handle_command(
        AppCommand::OpenProvisioning { duration_secs: 2 },
        &mut h.gateway,
        &mut h.pump,
        &mut h.sink,
    );
    assert!(h.gateway.is_open());

    h.tick();
    assert!(h.gateway.is_open(), "window still live after one tick");

    h.tick();
    assert!(!h.gateway.is_open(), "window expired");
    assert_eq!(h.service.link_state(), LinkState::Connected);

    // Writes after close are ignored outright.
    h.submit(VALID);
    h.tick();
    assert_eq!(h.service.link_state(), LinkState::Connected);
    assert_eq!(
        h.sink.count_of(|e| matches!(e, AppEvent::CredentialsAccepted)),
        0
    );
}

#[test]
fn last_submission_before_expiry_wins() {
    let mut h = Harness::connected(MockCredentialStore::with(bundle(
        "HomeNet", "hunter22", "tok",
    )));

    h.service.handle_command(
        AppCommand::OpenProvisioning { duration_secs: 1 },
        &mut h.gateway,
        &mut h.pump,
        &mut h.sink,
    );

    // Two writes inside the window: the newer one is the submission.
    h.submit(r#"{"wifi_ssid":"FirstNet","wifi_password":"password1","api_key":"t"}"#);
    h.submit(r#"{"wifi_ssid":"SecondNet","wifi_password":"password2","api_key":"t"}"#);
    h.tick(); // drained before the window closes this same tick

    assert_eq!(h.service.link_state(), LinkState::Connecting);
    assert_eq!(h.link.began.last().unwrap().0, "SecondNet");
}

#[test]
fn window_request_outside_connected_is_ignored() {
    let mut h = Harness::provisioning_boot();
    assert_eq!(h.service.link_state(), LinkState::Fallback);

    h.service.handle_command(
        AppCommand::OpenProvisioning { duration_secs: 1 },
        &mut h.gateway,
        &mut h.pump,
        &mut h.sink,
    );
    // Fallback keeps its gateway; the window must not arm a timer that
    // would close it.
    h.tick();
    h.tick();
    assert!(h.gateway.is_open());
}
