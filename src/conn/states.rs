//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  IDLE ──[stored creds / accepted bundle]──▶ CONNECTING
//!                                               │      ▲
//!                             [attempts ≥ limit]│      │[bundle accepted,
//!                                               ▼      │ or link lost]
//!                                           FALLBACK   │
//!                                               ▲      │
//!                  [link up]                    │      │
//!  CONNECTED ◀──────────────────────────────────┼──────┘
//!      │                                        │
//!      └──[round after link loss times out]─────┘
//! ```
//!
//! Fallback has no timeout of its own: with no network to fall back
//! further to, it waits for operator input indefinitely.

use log::{info, warn};

use super::context::LinkContext;
use super::{LinkState, StateDescriptor};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table. Called once at startup.
pub fn build_state_table() -> [StateDescriptor; LinkState::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: LinkState::Idle,
            name: "Idle",
            on_enter: None,
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1 — Connecting
        StateDescriptor {
            id: LinkState::Connecting,
            name: "Connecting",
            on_enter: Some(connecting_enter),
            on_exit: None,
            on_update: connecting_update,
        },
        // Index 2 — Connected
        StateDescriptor {
            id: LinkState::Connected,
            name: "Connected",
            on_enter: Some(connected_enter),
            on_exit: None,
            on_update: connected_update,
        },
        // Index 3 — Fallback
        StateDescriptor {
            id: LinkState::Fallback,
            name: "Fallback",
            on_enter: Some(fallback_enter),
            on_exit: None,
            on_update: fallback_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE — waiting for something to connect with
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(ctx: &mut LinkContext) -> Option<LinkState> {
    if ctx.pending.is_some() || ctx.stored_credentials {
        return Some(LinkState::Connecting);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTING — bounded-retry association round
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_enter(ctx: &mut LinkContext) {
    ctx.attempts = 0;
    ctx.commands.begin_connect = true;
    info!(
        "CONNECTING: association round started (limit {} ticks)",
        ctx.timeout_limit
    );
}

fn connecting_update(ctx: &mut LinkContext) -> Option<LinkState> {
    if ctx.link_up {
        ctx.attempts = 0;
        return Some(LinkState::Connected);
    }

    ctx.attempts += 1;
    if ctx.attempts >= ctx.timeout_limit {
        warn!(
            "CONNECTING: no association after {} ticks, abandoning round",
            ctx.attempts
        );
        ctx.attempts = 0;
        return Some(LinkState::Fallback);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTED — stable while the link holds
// ═══════════════════════════════════════════════════════════════════════════

fn connected_enter(ctx: &mut LinkContext) {
    ctx.attempts = 0;
    // The provisioning channel must not stay advertised once the node is
    // online; operator-requested windows re-open it explicitly.
    ctx.commands.close_gateway = true;
    info!("CONNECTED: link established, time reference available");
}

fn connected_update(ctx: &mut LinkContext) -> Option<LinkState> {
    // A freshly accepted bundle supersedes the live association.
    if ctx.pending.is_some() {
        info!("CONNECTED: new credentials accepted, re-associating");
        return Some(LinkState::Connecting);
    }

    // Reconnect directly with the credentials that worked; fall back to
    // provisioning only if that round exhausts its limit.
    if ctx.link_lost {
        ctx.link_lost = false;
        warn!("CONNECTED: link dropped, retrying association");
        return Some(LinkState::Connecting);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  FALLBACK — provisioning channel open, waiting for the operator
// ═══════════════════════════════════════════════════════════════════════════

fn fallback_enter(ctx: &mut LinkContext) {
    ctx.attempts = 0;
    // A bundle that just failed its round is unreachable; only a fresh
    // submission may restart association.
    ctx.pending = None;
    ctx.commands.open_gateway = true;
    info!("FALLBACK: provisioning channel advertised, waiting for credentials");
}

fn fallback_update(ctx: &mut LinkContext) -> Option<LinkState> {
    if ctx.pending.is_some() {
        return Some(LinkState::Connecting);
    }
    None
}
