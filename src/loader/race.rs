//! Races a data fetch against the grace timer.
//!
//! The fetch runs as its own task so it keeps making progress after the
//! timer wins; the caller gets a [`PendingData`] handle to collect it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use super::result::{FetchFailure, LoadResult};
use super::source::DataSource;
use super::timeout::TimeoutSignal;

/// Which of the two racing operations settled first.
#[derive(Debug)]
pub enum RaceOutcome<T> {
    /// Data settled before (or together with) the timer.
    DataFirst(LoadResult<T>),
    /// The timer fired while the fetch was still running.
    TimeoutFirst(PendingData<T>),
}

impl<T> RaceOutcome<T> {
    pub fn is_data_first(&self) -> bool {
        matches!(self, RaceOutcome::DataFirst(_))
    }
}

/// Owned fetch task. Aborted when dropped, a no-op if already finished.
#[derive(Debug)]
struct FetchTask<T> {
    handle: JoinHandle<LoadResult<T>>,
}

impl<T> FetchTask<T> {
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for FetchTask<T> {
    type Output = LoadResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(err) => LoadResult::Failure(join_failure(err)),
        })
    }
}

impl<T> Drop for FetchTask<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn join_failure(err: JoinError) -> FetchFailure {
    let reason = if err.is_panic() {
        "data source panicked".to_string()
    } else {
        err.to_string()
    };
    FetchFailure::Aborted { reason }
}

/// Handle to a fetch that lost the race but is still running.
///
/// Resolves to the fetch's result exactly once. Dropping the handle aborts
/// the fetch.
#[derive(Debug)]
pub struct PendingData<T> {
    task: FetchTask<T>,
}

impl<T> Future for PendingData<T> {
    type Output = LoadResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task).poll(cx)
    }
}

/// Starts a fetch and a grace timer together and reports which settled first.
#[derive(Debug, Clone, Copy)]
pub struct RaceController {
    timeout: Duration,
}

impl RaceController {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Race `source.fetch()` against the grace timer.
    ///
    /// Data wins ties: the fetch is polled first, and when the timer fires
    /// the fetch gets one more scheduling turn before the timer is declared
    /// the winner. `cancel` is handed to the source unchanged; the race
    /// itself never cancels the fetch.
    pub async fn start_race<S>(&self, source: Arc<S>, cancel: CancellationToken) -> RaceOutcome<S::Output>
    where
        S: DataSource,
    {
        let mut task = FetchTask {
            handle: tokio::spawn(async move { source.fetch(cancel).await }),
        };
        let mut timer = TimeoutSignal::new(self.timeout);

        tokio::select! {
            biased;
            result = &mut task => {
                timer.cancel();
                tracing::trace!("Data settled before the grace timer");
                RaceOutcome::DataFirst(result)
            }
            _ = &mut timer => {
                tokio::task::yield_now().await;
                if task.is_finished() {
                    tracing::trace!("Data and grace timer settled together");
                    RaceOutcome::DataFirst(task.await)
                } else {
                    tracing::trace!(timeout_ms = self.timeout.as_millis() as u64, "Grace timer fired first");
                    RaceOutcome::TimeoutFirst(PendingData { task })
                }
            }
        }
    }
}
