//! Load state machine: owns the session, applies race settlements and
//! publishes consumer views.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_core::Stream;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::LoaderSettings;
use crate::mvi::Reducer;

use super::intent::LoadIntent;
use super::observer::{LoadObserver, TracingObserver};
use super::race::{RaceController, RaceOutcome};
use super::reducer::LoadReducer;
use super::result::{FetchFailure, LoadResult};
use super::session::{Liveness, LoadSession, SessionCounter, SessionId};
use super::source::DataSource;
use super::state::{LoadState, LoadView};

/// Everything a state machine needs at construction.
pub struct LoaderOptions<S> {
    /// Grace period before the placeholder is shown.
    pub timeout: Duration,
    pub source: S,
}

impl<S> LoaderOptions<S> {
    pub fn new(timeout: Duration, source: S) -> Self {
        Self { timeout, source }
    }

    pub fn from_settings(settings: &LoaderSettings, source: S) -> Self {
        Self::new(settings.timeout(), source)
    }
}

/// Stream of consumer views.
///
/// Yields the view current at subscription time, then one item per change
/// of the view. Teardown publishes nothing.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<LoadView<T>>,
}

impl<T> Subscription<T> {
    pub async fn next(&mut self) -> Option<LoadView<T>> {
        self.rx.recv().await
    }

    /// Next already-published view, without waiting.
    pub fn try_next(&mut self) -> Option<LoadView<T>> {
        self.rx.try_recv().ok()
    }
}

impl<T> Stream for Subscription<T> {
    type Item = LoadView<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

struct Subscriber<T> {
    tx: mpsc::UnboundedSender<LoadView<T>>,
    last: LoadView<T>,
}

struct Inner<T> {
    session: Option<LoadSession>,
    subscribers: Vec<Subscriber<T>>,
}

struct Shared<T> {
    inner: Mutex<Inner<T>>,
    // Written only while `inner` is held.
    state: watch::Sender<LoadState<T>>,
    sessions: SessionCounter,
    observer: Arc<dyn LoadObserver>,
}

/// Observer call recorded under the lock and made after it is released.
enum Hook {
    Transition {
        session: SessionId,
        from: &'static str,
        to: &'static str,
    },
    Failure {
        session: SessionId,
        failure: FetchFailure,
    },
}

/// The parts of a session the driver task carries.
struct SessionLink {
    id: SessionId,
    liveness: Liveness,
    cancel: CancellationToken,
}

impl<T> Shared<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn dispatch(&self, session: SessionId, intent: LoadIntent<T>, hooks: &mut Vec<Hook>) {
        let current = self.state.borrow().clone();
        let next = LoadReducer::<T>::reduce(current.clone(), intent);
        if next != current {
            hooks.push(Hook::Transition {
                session,
                from: current.name(),
                to: next.name(),
            });
            self.state.send_replace(next);
        }
    }

    /// Run recorded observer calls. `inner` must not be held.
    fn notify(&self, hooks: Vec<Hook>) {
        for hook in hooks {
            match hook {
                Hook::Transition { session, from, to } => {
                    self.observer.on_transition(session, from, to)
                }
                Hook::Failure { session, failure } => self.observer.on_failure(session, &failure),
            }
        }
    }

    fn publish(&self, inner: &mut Inner<T>) {
        let view = self.state.borrow().view();
        inner.subscribers.retain_mut(|sub| {
            if sub.last == view {
                return true;
            }
            sub.last = view.clone();
            sub.tx.send(view.clone()).is_ok()
        });
    }

    /// Apply a settlement if its session is still the live one.
    ///
    /// Returns `false` when the settlement was discarded.
    fn settle(&self, link: &SessionLink, intent: LoadIntent<T>) -> bool {
        let mut hooks = Vec::new();
        {
            let mut inner = self.inner.lock();
            if !link.liveness.is_live() {
                tracing::debug!(session = %link.id, "Discarding settlement of stale session");
                return false;
            }
            if let LoadIntent::DataArrived(LoadResult::Failure(failure)) = &intent {
                hooks.push(Hook::Failure {
                    session: link.id,
                    failure: failure.clone(),
                });
            }
            self.dispatch(link.id, intent, &mut hooks);
            self.publish(&mut inner);
        }
        self.notify(hooks);
        true
    }
}

/// Progressive-loading controller.
///
/// Shows a placeholder only when the source is slower than the grace
/// period. At most one session is live at a time; starting a new cycle or
/// tearing down invalidates the previous one and cancels its fetch.
pub struct LoadStateMachine<S: DataSource> {
    race: RaceController,
    source: Arc<S>,
    shared: Arc<Shared<S::Output>>,
}

impl<S: DataSource> LoadStateMachine<S> {
    pub fn new(options: LoaderOptions<S>) -> Self {
        Self::with_observer(options, Arc::new(TracingObserver))
    }

    pub fn with_observer(options: LoaderOptions<S>, observer: Arc<dyn LoadObserver>) -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self {
            race: RaceController::new(options.timeout),
            source: Arc::new(options.source),
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    session: None,
                    subscribers: Vec::new(),
                }),
                state,
                sessions: SessionCounter::default(),
                observer,
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.race.timeout()
    }

    /// Begin a new load cycle, superseding any previous one.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&self) -> SessionId {
        let session = LoadSession::new(self.shared.sessions.next());
        let link = SessionLink {
            id: session.id(),
            liveness: session.liveness(),
            cancel: session.cancel_token(),
        };
        let id = link.id;

        let mut hooks = Vec::new();
        {
            let mut inner = self.shared.inner.lock();
            if let Some(previous) = inner.session.replace(session) {
                previous.invalidate();
            }
            self.shared.dispatch(id, LoadIntent::Start, &mut hooks);
            self.shared.publish(&mut inner);
        }
        self.shared.notify(hooks);

        tracing::debug!(session = %id, timeout_ms = self.race.timeout().as_millis() as u64, "Load started");
        tokio::spawn(drive(
            Arc::clone(&self.shared),
            Arc::clone(&self.source),
            self.race,
            link,
        ));
        id
    }

    /// Stop caring about the current cycle.
    ///
    /// State returns to `Idle` silently; nothing the abandoned session does
    /// afterwards reaches subscribers, and its fetch is cancelled.
    pub fn teardown(&self) {
        let mut hooks = Vec::new();
        {
            let mut inner = self.shared.inner.lock();
            let Some(session) = inner.session.take() else {
                return;
            };
            let id = session.id();
            session.invalidate();
            self.shared.dispatch(id, LoadIntent::Teardown, &mut hooks);
            tracing::debug!(session = %id, "Load torn down");
        }
        self.shared.notify(hooks);
    }

    pub fn state(&self) -> LoadState<S::Output> {
        self.shared.state.borrow().clone()
    }

    pub fn view(&self) -> LoadView<S::Output> {
        self.shared.state.borrow().view()
    }

    /// Id of the live session, if a cycle was started and not torn down.
    pub fn current_session(&self) -> Option<SessionId> {
        self.shared.inner.lock().session.as_ref().map(LoadSession::id)
    }

    pub fn subscribe(&self) -> Subscription<S::Output> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.shared.inner.lock();
        let view = self.shared.state.borrow().view();
        // The receiver is alive, so this send cannot fail.
        let _ = tx.send(view.clone());
        inner.subscribers.push(Subscriber { tx, last: view });
        Subscription { rx }
    }

    /// Wait for the current cycle to end.
    ///
    /// Returns the terminal result, or `None` if the machine is idle (never
    /// started or torn down).
    pub async fn settled(&self) -> Option<LoadResult<S::Output>> {
        let mut rx = self.shared.state.subscribe();
        let state = rx.wait_for(|state| !state.is_loading()).await.ok()?;
        match &*state {
            LoadState::Settled(result) => Some(result.clone()),
            _ => None,
        }
    }
}

impl<S: DataSource> Drop for LoadStateMachine<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn drive<S: DataSource>(
    shared: Arc<Shared<S::Output>>,
    source: Arc<S>,
    race: RaceController,
    link: SessionLink,
) {
    let cancel = link.cancel.clone();
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            // Dropping the cycle drops the race, which aborts the fetch task.
            tracing::trace!(session = %link.id, "Driver cancelled");
        }
        _ = run_cycle(&shared, source, race, &link) => {}
    }
}

async fn run_cycle<S: DataSource>(
    shared: &Shared<S::Output>,
    source: Arc<S>,
    race: RaceController,
    link: &SessionLink,
) {
    match race.start_race(source, link.cancel.clone()).await {
        RaceOutcome::DataFirst(result) => {
            shared.settle(link, LoadIntent::DataArrived(result));
        }
        RaceOutcome::TimeoutFirst(pending) => {
            if shared.settle(link, LoadIntent::TimeoutElapsed) {
                let result = pending.await;
                shared.settle(link, LoadIntent::DataArrived(result));
            }
        }
    }
}
