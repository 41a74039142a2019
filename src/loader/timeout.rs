//! One-shot grace timer.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::time::Sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalState {
    Armed,
    Fired,
    Cancelled,
}

/// Settles exactly once after a fixed delay, unless cancelled first.
///
/// Awaiting a cancelled or already-fired signal never completes, so a
/// signal can't produce a second marker and a cancelled one produces none.
#[derive(Debug)]
pub struct TimeoutSignal {
    sleep: Pin<Box<Sleep>>,
    duration: Duration,
    state: SignalState,
}

impl TimeoutSignal {
    pub fn new(duration: Duration) -> Self {
        Self {
            sleep: Box::pin(tokio::time::sleep(duration)),
            duration,
            state: SignalState::Armed,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Disarm the timer. Returns `true` if this call prevented the firing.
    pub fn cancel(&mut self) -> bool {
        if self.state == SignalState::Armed {
            self.state = SignalState::Cancelled;
            true
        } else {
            false
        }
    }

    pub fn is_fired(&self) -> bool {
        self.state == SignalState::Fired
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == SignalState::Cancelled
    }
}

impl Future for TimeoutSignal {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.state != SignalState::Armed {
            return Poll::Pending;
        }
        match this.sleep.as_mut().poll(cx) {
            Poll::Ready(()) => {
                this.state = SignalState::Fired;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
