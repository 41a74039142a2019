//! Side-channel hooks for load cycle events.
//!
//! Failures never reach the consumer's view; observers are where they go.

use super::result::FetchFailure;
use super::session::SessionId;

/// Hooks run on whichever task caused the event, after the machine has
/// released its internal lock, so they may call back into the machine
/// (`current_session`, `start`, `teardown`). They should not block.
pub trait LoadObserver: Send + Sync {
    /// Called after every state change of a live session.
    fn on_transition(&self, _session: SessionId, _from: &'static str, _to: &'static str) {}

    /// Called once when a live session settles with a failure.
    fn on_failure(&self, _session: SessionId, _failure: &FetchFailure) {}
}

/// Default observer: writes everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn on_transition(&self, session: SessionId, from: &'static str, to: &'static str) {
        tracing::debug!(%session, from, to, "Load state transition");
    }

    fn on_failure(&self, session: SessionId, failure: &FetchFailure) {
        tracing::warn!(%session, error = %failure, "Load failed");
    }
}
