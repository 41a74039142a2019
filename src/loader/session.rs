//! Ownership unit of one load cycle.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Identifies a load cycle within one state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out increasing session ids.
#[derive(Debug, Default)]
pub(crate) struct SessionCounter(AtomicU64);

impl SessionCounter {
    pub(crate) fn next(&self) -> SessionId {
        SessionId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// "Is this session's result still relevant." Cleared exactly once.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `true` if this call cleared the flag.
    fn clear(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// One load cycle: its id, liveness flag and the token threaded into the
/// data source.
///
/// The machine keeps the session; the cycle's driver task keeps the rest.
/// That task owns the grace timer and the fetch task. Once the timer wins,
/// it also owns the [`PendingData`](super::PendingData) handle, the
/// write-once cell for the late result. The cell is awaited only after
/// `TimeoutElapsed` was applied to a live session, and its result is
/// applied only if the session is still live. Invalidating the session
/// cancels the token, which stops the driver; dropping the driver drops the
/// timer and the handle and aborts the fetch task.
#[derive(Debug)]
pub struct LoadSession {
    id: SessionId,
    liveness: Liveness,
    cancel: CancellationToken,
}

impl LoadSession {
    pub(crate) fn new(id: SessionId) -> Self {
        Self {
            id,
            liveness: Liveness::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_live(&self) -> bool {
        self.liveness.is_live()
    }

    /// Discard the session: later settlements become no-ops and the data
    /// source is asked to stop.
    pub(crate) fn invalidate(self) {
        if self.liveness.clear() {
            tracing::debug!(session = %self.id, "Session invalidated");
        }
        self.cancel.cancel();
    }
}
