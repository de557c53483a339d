//! Mock adapters for integration tests.
//!
//! Every port the [`AppService`](floranode::app::service::AppService)
//! consumes gets a scriptable in-memory implementation that records its
//! call history, so tests can assert on the full interaction without real
//! peripherals.

use floranode::adapters::wifi::{LinkError, LinkPort};
use floranode::app::events::AppEvent;
use floranode::app::ports::{CredentialStore, EventSink, PumpPort, StorageError};
use floranode::conn::credentials::CredentialBundle;
use floranode::signals::{ChannelSample, SignalKind, SignalSource, MAX_CHANNELS};

// ── MockLink ──────────────────────────────────────────────────

/// Link layer under full test control: `up` is set by the test between
/// ticks, `began` records every association request.
pub struct MockLink {
    pub up: bool,
    pub disconnect_event: bool,
    pub began: Vec<(String, String)>,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self {
            up: false,
            disconnect_event: false,
            began: Vec::new(),
        }
    }

    /// Simulate the access point dropping an established link.
    pub fn drop_link(&mut self) {
        self.up = false;
        self.disconnect_event = true;
    }
}

impl LinkPort for MockLink {
    fn begin(&mut self, network_id: &str, secret: &str) -> Result<(), LinkError> {
        self.began
            .push((network_id.to_string(), secret.to_string()));
        Ok(())
    }

    fn poll(&mut self) {}

    fn is_up(&self) -> bool {
        self.up
    }

    fn take_disconnect(&mut self) -> bool {
        std::mem::take(&mut self.disconnect_event)
    }

    fn shutdown(&mut self) {
        self.up = false;
    }
}

// ── MockCredentialStore ───────────────────────────────────────

pub struct MockCredentialStore {
    pub stored: Option<CredentialBundle>,
    pub fail_writes: bool,
    pub store_calls: u32,
}

#[allow(dead_code)]
impl MockCredentialStore {
    pub fn empty() -> Self {
        Self {
            stored: None,
            fail_writes: false,
            store_calls: 0,
        }
    }

    pub fn with(bundle: CredentialBundle) -> Self {
        Self {
            stored: Some(bundle),
            fail_writes: false,
            store_calls: 0,
        }
    }
}

impl CredentialStore for MockCredentialStore {
    fn load(&self) -> Option<CredentialBundle> {
        self.stored.clone()
    }

    fn store(&mut self, bundle: &CredentialBundle) -> Result<(), StorageError> {
        self.store_calls += 1;
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.stored = Some(bundle.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.stored = None;
        Ok(())
    }
}

// ── MockPump ──────────────────────────────────────────────────

pub struct MockPump {
    pub on: bool,
    pub switches: Vec<bool>,
}

#[allow(dead_code)]
impl MockPump {
    pub fn new() -> Self {
        Self {
            on: false,
            switches: Vec::new(),
        }
    }
}

impl PumpPort for MockPump {
    fn set_running(&mut self, on: bool) {
        self.on = on;
        self.switches.push(on);
    }

    fn is_running(&self) -> bool {
        self.on
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count_of(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── QueueSource ───────────────────────────────────────────────

/// Single-channel source fed from a scripted value queue; yields NaN once
/// the script runs out.
pub struct QueueSource {
    pub kind: SignalKind,
    pub values: std::collections::VecDeque<f32>,
}

#[allow(dead_code)]
impl QueueSource {
    pub fn new(kind: SignalKind, values: &[f32]) -> Self {
        Self {
            kind,
            values: values.iter().copied().collect(),
        }
    }
}

impl SignalSource for QueueSource {
    fn family(&self) -> &'static str {
        "queue"
    }

    fn channels(&self) -> &'static [SignalKind] {
        // Test-only: the kind is dynamic, so report the widest set.
        &[
            SignalKind::EnvTemperature,
            SignalKind::EnvHumidity,
        ]
    }

    fn sample(&mut self) -> heapless::Vec<ChannelSample, MAX_CHANNELS> {
        let value = self.values.pop_front().unwrap_or(f32::NAN);
        let mut out = heapless::Vec::new();
        out.push(ChannelSample {
            kind: self.kind,
            value,
        })
        .unwrap();
        out
    }
}

// ── Helpers ───────────────────────────────────────────────────

#[allow(dead_code)]
pub fn bundle(ssid: &str, secret: &str, token: &str) -> CredentialBundle {
    CredentialBundle::build(ssid, secret, token, None).unwrap()
}
