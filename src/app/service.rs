//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the active signal set, the sampling scheduler, the
//! connectivity state machine, and the watering controller — the explicit
//! home of everything that would otherwise be module-level mutable state.
//! It exposes a clean, hardware-agnostic API; all I/O flows through port
//! traits injected at call sites, making the entire service testable with
//! mock adapters.
//!
//! ```text
//!  SignalSource ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                   │          AppService          │
//!     LinkPort ◀────│  Sampler · LinkMachine ·     │────▶ CredentialStore
//!  Provisioning ◀───│  Watering                    │────▶ PumpPort
//!                   └──────────────────────────────┘
//! ```
//!
//! Everything mutates synchronously inside `tick()` on a single execution
//! context; externally triggered work (credential submissions, backend
//! commands) is drained at the top of the tick rather than invoked
//! re-entrantly.

use log::{info, warn};

use crate::adapters::ble::ProvisioningPort;
use crate::adapters::wifi::LinkPort;
use crate::config::SystemConfig;
use crate::conn::context::LinkContext;
use crate::conn::credentials::CredentialBundle;
use crate::conn::states::build_state_table;
use crate::conn::{LinkMachine, LinkState};
use crate::control::watering::WateringController;
use crate::report::SignalStatus;
use crate::signals::{SampleStamp, SamplingScheduler, SensorRegistry};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{CredentialStore, EventSink, PumpPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    registry: SensorRegistry,
    sampler: SamplingScheduler,
    machine: LinkMachine,
    ctx: LinkContext,
    watering: WateringController,
    /// Countdown of an operator-requested provisioning window, in ticks.
    window_ticks_left: Option<u32>,
}

impl AppService {
    /// Construct the service from configuration, the discovered signal set,
    /// and whatever credentials the store held at boot.
    ///
    /// Does **not** start the machine — call [`start`](Self::start) next.
    pub fn new(
        config: SystemConfig,
        registry: SensorRegistry,
        stored: Option<&CredentialBundle>,
    ) -> Self {
        let timeout_limit = stored
            .and_then(|b| b.timeout_override)
            .unwrap_or(config.connect_timeout_ticks);

        let has_stored = stored.is_some();
        let ctx = LinkContext::new(timeout_limit, has_stored);

        // Without any credentials there is nothing to associate with, so
        // boot straight into the provisioning fallback.
        let initial = if has_stored {
            LinkState::Idle
        } else {
            LinkState::Fallback
        };
        let machine = LinkMachine::new(build_state_table(), initial);

        Self {
            config,
            registry,
            sampler: SamplingScheduler::new(),
            machine,
            ctx,
            watering: WateringController::new(),
            window_ticks_left: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the initial `on_enter` and announce the starting state.
    pub fn start(
        &mut self,
        gateway: &mut impl ProvisioningPort,
        sink: &mut impl EventSink,
    ) {
        self.machine.start(&mut self.ctx);
        self.apply_link_commands_enterless(gateway, sink);
        sink.emit(&AppEvent::Started(self.machine.current_state()));
        info!("AppService started in {:?}", self.machine.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full 1 Hz cycle: sample signals → drain the gateway → poll
    /// the link → advance the machine → apply side effects.
    pub fn tick(
        &mut self,
        stamp: SampleStamp,
        link: &mut impl LinkPort,
        gateway: &mut impl ProvisioningPort,
        store: &mut impl CredentialStore,
        pump: &mut impl PumpPort,
        sink: &mut impl EventSink,
    ) {
        // 1. Pull one reading per active signal.
        self.sampler.tick(&mut self.registry, stamp);

        // 2. Advance a watering run, if any.
        self.watering.tick(pump, sink);

        // 3. Drain at most one gateway submission into the context.
        self.drain_gateway(gateway, sink);

        // 4. Observe the link layer.
        link.poll();
        self.ctx.link_up = link.is_up();
        if link.take_disconnect() {
            self.ctx.link_lost = true;
        }

        // 5. Advance the connectivity machine.
        let prev = self.machine.current_state();
        self.machine.tick(&mut self.ctx);
        let state = self.machine.current_state();

        // 6. Apply the side effects the handlers requested.
        self.apply_link_commands(link, gateway, store, sink);

        // 7. Persist a pending bundle once its association proved out.
        if state == LinkState::Connected && prev != LinkState::Connected {
            self.persist_pending(store, sink);
        }

        if state != prev {
            sink.emit(&AppEvent::LinkStateChanged { from: prev, to: state });
        }

        // 8. Count down an operator-requested provisioning window.
        self.tick_provisioning_window(gateway, sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a backend command (arrives via the reporting channel).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        gateway: &mut impl ProvisioningPort,
        pump: &mut impl PumpPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::DispenseWater { milliliters } => {
                self.watering.start(milliliters, &self.config, pump, sink);
            }
            AppCommand::OpenProvisioning { duration_secs } => {
                if self.machine.current_state() != LinkState::Connected {
                    // The fallback state already keeps the gateway open.
                    warn!("provisioning window ignored outside Connected");
                    return;
                }
                let duration_secs = duration_secs.min(self.config.provisioning_window_secs);
                let tick_ms = self.config.sample_interval_ms.max(1);
                let ticks = (duration_secs * 1000).div_ceil(tick_ms).max(1);
                info!("provisioning window open for {duration_secs}s ({ticks} ticks)");
                self.window_ticks_left = Some(ticks);
                if !gateway.is_open() {
                    gateway.open();
                    sink.emit(&AppEvent::ProvisioningOpened);
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current connectivity state.
    pub fn link_state(&self) -> LinkState {
        self.machine.current_state()
    }

    /// Whether the reporting layer may transmit.
    pub fn may_transmit(&self) -> bool {
        self.machine.current_state() == LinkState::Connected
    }

    /// Status snapshot of every active signal, for the reporting layer.
    pub fn status_report(&self) -> Vec<SignalStatus> {
        crate::report::status_report(&self.registry)
    }

    /// The discovered signal set.
    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// A watering run is in progress.
    pub fn watering_active(&self) -> bool {
        self.watering.is_active()
    }

    // ── Internal ──────────────────────────────────────────────

    fn drain_gateway(&mut self, gateway: &mut impl ProvisioningPort, sink: &mut impl EventSink) {
        if !gateway.is_open() {
            return;
        }
        let Some(payload) = gateway.take_submission() else {
            return;
        };
        match CredentialBundle::from_json(&payload) {
            Ok(bundle) => {
                info!("gateway: credential bundle accepted for '{}'", bundle.network_id);
                self.ctx.pending = Some(bundle);
                sink.emit(&AppEvent::CredentialsAccepted);
            }
            Err(e) => {
                warn!("gateway: submission rejected — {e}");
                sink.emit(&AppEvent::CredentialsRejected(e));
            }
        }
    }

    fn apply_link_commands(
        &mut self,
        link: &mut impl LinkPort,
        gateway: &mut impl ProvisioningPort,
        store: &mut impl CredentialStore,
        sink: &mut impl EventSink,
    ) {
        let commands = self.ctx.commands.take();

        if commands.begin_connect {
            let creds = self.ctx.pending.clone().or_else(|| store.load());
            match creds {
                Some(bundle) => {
                    if let Err(e) = link.begin(&bundle.network_id, &bundle.secret) {
                        warn!("link: association request failed — {e}");
                    }
                }
                None => warn!("link: no credentials available for association"),
            }
        }

        if commands.open_gateway && !gateway.is_open() {
            gateway.open();
            sink.emit(&AppEvent::ProvisioningOpened);
        }
        if commands.close_gateway && gateway.is_open() {
            gateway.close();
            self.window_ticks_left = None;
            sink.emit(&AppEvent::ProvisioningClosed);
        }
    }

    /// `start()` variant of the above: no link/store yet, only the gateway
    /// command raised by the initial `on_enter` is relevant.
    fn apply_link_commands_enterless(
        &mut self,
        gateway: &mut impl ProvisioningPort,
        sink: &mut impl EventSink,
    ) {
        let commands = self.ctx.commands.take();
        if commands.open_gateway && !gateway.is_open() {
            gateway.open();
            sink.emit(&AppEvent::ProvisioningOpened);
        }
    }

    fn persist_pending(&mut self, store: &mut impl CredentialStore, sink: &mut impl EventSink) {
        let Some(bundle) = self.ctx.take_pending() else {
            return;
        };
        match store.store(&bundle) {
            Ok(()) => {
                info!("credentials persisted for '{}'", bundle.network_id);
                self.ctx.stored_credentials = true;
            }
            Err(e) => {
                // Keep running on the in-memory copy; never claim a
                // persisted credential that was not actually stored.
                warn!("credential persist failed — {e}");
                sink.emit(&AppEvent::CredentialPersistFailed(e));
            }
        }
        if let Some(ticks) = bundle.timeout_override {
            self.ctx.timeout_limit = ticks;
        }
    }

    fn tick_provisioning_window(
        &mut self,
        gateway: &mut impl ProvisioningPort,
        sink: &mut impl EventSink,
    ) {
        let Some(left) = self.window_ticks_left else {
            return;
        };
        if left > 1 {
            self.window_ticks_left = Some(left - 1);
            return;
        }
        // Window expired: close and discard any partial submission. A valid
        // submission drained earlier this tick has already been accepted.
        self.window_ticks_left = None;
        if gateway.is_open() {
            gateway.close();
            sink.emit(&AppEvent::ProvisioningClosed);
        }
    }
}
