//! Shared mutable context threaded through every state handler.
//!
//! `LinkContext` is the blackboard the connectivity handlers read from and
//! write to: the attempt counter, the link status observed this tick, the
//! pending credential bundle, and the one-shot side-effect requests that
//! the service applies to the radio and gateway adapters after each tick.

use super::credentials::CredentialBundle;

// ---------------------------------------------------------------------------
// Side-effect requests (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// One-shot requests raised by state handlers. The service performs the
/// matching adapter call and clears the flag on the same tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkCommands {
    /// Start an association attempt with the pending or stored credentials.
    pub begin_connect: bool,
    /// Advertise the provisioning channel.
    pub open_gateway: bool,
    /// Stop advertising the provisioning channel.
    pub close_gateway: bool,
}

impl LinkCommands {
    /// Consume all pending requests, leaving the flags cleared.
    pub fn take(&mut self) -> LinkCommands {
        core::mem::take(self)
    }
}

// ---------------------------------------------------------------------------
// LinkContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct LinkContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Association bookkeeping --
    /// Failed connection ticks in the current attempt round.
    pub attempts: u32,
    /// Failed ticks tolerated before abandoning the round.
    pub timeout_limit: u32,

    // -- Link status (polled from the radio adapter before each tick) --
    /// Link layer reports an established association.
    pub link_up: bool,
    /// An explicit disconnect event was observed since the last tick
    /// (not merely a single failed check).
    pub link_lost: bool,

    // -- Credentials --
    /// Durable credentials exist in the config store.
    pub stored_credentials: bool,
    /// Validated bundle accepted from the gateway, not yet persisted.
    /// Persistence is deferred until the attempt it triggers succeeds.
    pub pending: Option<CredentialBundle>,

    // -- Side effects --
    pub commands: LinkCommands,
}

impl LinkContext {
    pub fn new(timeout_limit: u32, stored_credentials: bool) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            attempts: 0,
            timeout_limit,
            link_up: false,
            link_lost: false,
            stored_credentials,
            pending: None,
            commands: LinkCommands::default(),
        }
    }

    /// Take the pending bundle, if any.
    pub fn take_pending(&mut self) -> Option<CredentialBundle> {
        self.pending.take()
    }
}
