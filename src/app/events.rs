//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them — log to serial, surface on a status
//! characteristic, forward to the reporting uplink, etc.

use crate::conn::LinkState;
use crate::error::{ProvisioningError, StorageError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The application service has started (carries initial link state).
    Started(LinkState),

    /// The connectivity machine transitioned between states.
    LinkStateChanged { from: LinkState, to: LinkState },

    /// The provisioning channel started advertising.
    ProvisioningOpened,

    /// The provisioning channel stopped advertising.
    ProvisioningClosed,

    /// A well-formed credential bundle was accepted from the gateway.
    CredentialsAccepted,

    /// A submission was rejected at the gateway boundary.
    CredentialsRejected(ProvisioningError),

    /// A validated bundle could not be persisted; the node continues on
    /// the in-memory copy for this boot.
    CredentialPersistFailed(StorageError),

    /// A watering run started.
    WateringStarted { milliliters: f32, ticks: u32 },

    /// A watering run completed its full duration.
    WateringFinished,

    /// A watering run was cancelled before completion.
    WateringCancelled,
}
