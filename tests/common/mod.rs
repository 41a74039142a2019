//! Shared test utilities: recording observer and instrumented sources.

#![allow(dead_code, unused_imports)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use skeleton_loader::cards::{sample_cards, Card};
use skeleton_loader::loader::{
    DataSource, DelayedSource, FetchFailure, FnSource, LoadObserver, LoadResult,
    LoadStateMachine, LoaderOptions, SessionId, Subscription, LoadView,
};
use tokio_util::sync::CancellationToken;

pub const GRACE: Duration = Duration::from_millis(200);

/// Observer that keeps every hook call for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    pub transitions: Mutex<Vec<(SessionId, &'static str, &'static str)>>,
    pub failures: Mutex<Vec<(SessionId, FetchFailure)>>,
}

impl LoadObserver for RecordingObserver {
    fn on_transition(&self, session: SessionId, from: &'static str, to: &'static str) {
        self.transitions.lock().push((session, from, to));
    }

    fn on_failure(&self, session: SessionId, failure: &FetchFailure) {
        self.failures.lock().push((session, failure.clone()));
    }
}

/// Counts fetches that started and fetches that ran to completion.
#[derive(Default)]
pub struct FetchCounter {
    pub started: AtomicUsize,
    pub completed: AtomicUsize,
}

impl FetchCounter {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

/// A source that ignores its cancellation token, so only the loader's own
/// teardown can stop it.
pub fn counted_source(
    latency: Duration,
    counter: Arc<FetchCounter>,
) -> impl DataSource<Output = Vec<Card>> {
    FnSource::new(move |_cancel: CancellationToken| {
        let counter = Arc::clone(&counter);
        async move {
            counter.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(latency).await;
            counter.completed.fetch_add(1, Ordering::SeqCst);
            LoadResult::Success(sample_cards())
        }
    })
}

pub fn cards_after(latency_ms: u64) -> DelayedSource<Vec<Card>> {
    DelayedSource::succeeding(Duration::from_millis(latency_ms), sample_cards())
}

pub fn observed<S: DataSource>(source: S) -> (LoadStateMachine<S>, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let machine = LoadStateMachine::with_observer(
        LoaderOptions::new(GRACE, source),
        Arc::clone(&observer) as Arc<dyn LoadObserver>,
    );
    (machine, observer)
}

/// Everything published so far, without waiting.
pub fn drain<T>(views: &mut Subscription<T>) -> Vec<LoadView<T>> {
    let mut out = Vec::new();
    while let Some(view) = views.try_next() {
        out.push(view);
    }
    out
}
