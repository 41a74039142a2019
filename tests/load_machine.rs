mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use skeleton_loader::cards::sample_cards;
use skeleton_loader::loader::{
    DataSource, DelayedSource, FetchFailure, FnSource, LoadObserver, LoadResult, LoadState,
    LoadStateMachine, LoadView, LoaderOptions, SessionId,
};
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;

use common::{cards_after, counted_source, drain, observed, FetchCounter, GRACE};

fn placeholder<T>() -> LoadView<T> {
    LoadView {
        data: None,
        placeholder_visible: true,
    }
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_shows_placeholder_then_data() {
    let (machine, _) = observed(cards_after(2000));
    let mut views = machine.subscribe();
    let started = Instant::now();
    machine.start();

    assert_eq!(views.next().await, Some(LoadView::empty()));

    assert_eq!(views.next().await, Some(placeholder()));
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(started.elapsed() < Duration::from_millis(2000));

    let settled = views.next().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(2000));
    assert_eq!(settled.data, Some(sample_cards()));
    assert!(!settled.placeholder_visible);

    assert_eq!(machine.state(), LoadState::Settled(LoadResult::Success(sample_cards())));
}

#[tokio::test(start_paused = true)]
async fn fast_fetch_never_shows_placeholder() {
    let (machine, _) = observed(cards_after(50));
    let mut views = machine.subscribe();
    let started = Instant::now();
    machine.start();

    assert_eq!(views.next().await, Some(LoadView::empty()));
    let settled = views.next().await.unwrap();
    assert_eq!(settled.data, Some(sample_cards()));
    assert!(started.elapsed() < GRACE);

    sleep(Duration::from_secs(5)).await;
    assert!(drain(&mut views).is_empty());
}

#[tokio::test(start_paused = true)]
async fn placeholder_only_when_latency_exceeds_grace() {
    for latency_ms in [1, 50, 150, 199] {
        let (machine, _) = observed(cards_after(latency_ms));
        let mut views = machine.subscribe();
        machine.start();

        let result = machine.settled().await;
        assert_eq!(result, Some(LoadResult::Success(sample_cards())));
        assert!(
            drain(&mut views).iter().all(|v| !v.placeholder_visible),
            "placeholder shown for latency {latency_ms}ms"
        );
    }

    for latency_ms in [201, 500, 5000] {
        let (machine, _) = observed(cards_after(latency_ms));
        let mut views = machine.subscribe();
        machine.start();

        machine.settled().await;
        let seen = drain(&mut views);
        let placeholder_at = seen.iter().position(|v| v.placeholder_visible);
        assert_eq!(placeholder_at, Some(1), "latency {latency_ms}ms");
        assert_eq!(seen.last().unwrap().data, Some(sample_cards()));
    }
}

#[tokio::test(start_paused = true)]
async fn restart_supersedes_previous_session() {
    let (machine, observer) = observed(cards_after(500));
    let mut views = machine.subscribe();

    let first = machine.start();
    let second = machine.start();
    assert!(second > first);
    assert_eq!(machine.current_session(), Some(second));

    assert_eq!(machine.settled().await, Some(LoadResult::Success(sample_cards())));
    sleep(Duration::from_secs(5)).await;

    let seen = drain(&mut views);
    let settled: Vec<_> = seen.iter().filter(|v| v.data.is_some()).collect();
    assert_eq!(settled.len(), 1);

    let terminal: Vec<_> = observer
        .transitions
        .lock()
        .iter()
        .filter(|(_, _, to)| to.starts_with("settled"))
        .map(|(session, _, _)| *session)
        .collect();
    assert_eq!(terminal, vec![second]);
}

#[tokio::test(start_paused = true)]
async fn superseded_fetch_is_stopped() {
    let counter = Arc::new(FetchCounter::default());
    let (machine, _) = observed(counted_source(Duration::from_millis(1000), Arc::clone(&counter)));

    machine.start();
    sleep(Duration::from_millis(300)).await;
    assert_eq!(counter.started(), 1);

    machine.start();
    machine.settled().await;
    sleep(Duration::from_secs(5)).await;

    assert_eq!(counter.started(), 2);
    assert_eq!(counter.completed(), 1);
}

#[tokio::test(start_paused = true)]
async fn teardown_silences_in_flight_session() {
    let counter = Arc::new(FetchCounter::default());
    let (machine, observer) =
        observed(counted_source(Duration::from_millis(2000), Arc::clone(&counter)));
    let mut views = machine.subscribe();
    machine.start();

    assert_eq!(views.next().await, Some(LoadView::empty()));
    assert_eq!(views.next().await, Some(placeholder()));

    machine.teardown();
    let transitions_at_teardown = observer.transitions.lock().len();

    sleep(Duration::from_secs(10)).await;

    assert!(drain(&mut views).is_empty());
    assert_eq!(machine.state(), LoadState::Idle);
    assert_eq!(counter.completed(), 0);
    assert!(observer.failures.lock().is_empty());
    assert_eq!(observer.transitions.lock().len(), transitions_at_teardown);
}

#[tokio::test(start_paused = true)]
async fn teardown_discards_failure_too() {
    let (machine, observer) = observed(DelayedSource::<Vec<u8>>::failing(
        Duration::from_millis(1000),
        FetchFailure::transport("late failure"),
    ));
    let mut views = machine.subscribe();
    machine.start();
    sleep(Duration::from_millis(300)).await;
    drain(&mut views);

    machine.teardown();
    sleep(Duration::from_secs(5)).await;

    assert!(drain(&mut views).is_empty());
    assert!(observer.failures.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failure_settles_without_data_and_is_logged_once() {
    let (machine, observer) = observed(DelayedSource::<Vec<u8>>::failing(
        Duration::from_millis(2000),
        FetchFailure::transport("connection refused"),
    ));
    let mut views = machine.subscribe();
    let id = machine.start();

    let result = machine.settled().await.unwrap();
    assert_eq!(result, LoadResult::Failure(FetchFailure::transport("connection refused")));
    assert_eq!(machine.view(), LoadView::empty());

    let seen = drain(&mut views);
    assert_eq!(seen, vec![LoadView::empty(), placeholder(), LoadView::empty()]);

    let failures = observer.failures.lock();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, id);
    assert!(failures[0].1.to_string().contains("connection refused"));
}

#[tokio::test(start_paused = true)]
async fn fast_failure_never_shows_anything() {
    let (machine, observer) = observed(DelayedSource::<Vec<u8>>::failing(
        Duration::from_millis(20),
        FetchFailure::Status { status: 500 },
    ));
    let mut views = machine.subscribe();
    machine.start();

    machine.settled().await;
    assert_eq!(drain(&mut views), vec![LoadView::empty()]);
    assert_eq!(observer.failures.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_cycle_stays_failed_until_restarted() {
    let (machine, _) = observed(DelayedSource::<Vec<u8>>::failing(
        Duration::from_millis(20),
        FetchFailure::transport("down"),
    ));
    machine.start();
    machine.settled().await;

    sleep(Duration::from_secs(60)).await;
    assert!(matches!(machine.state(), LoadState::Settled(LoadResult::Failure(_))));

    machine.start();
    assert_eq!(machine.state(), LoadState::AwaitingFast);
}

#[tokio::test(start_paused = true)]
async fn settled_machine_can_load_again() {
    let (machine, _) = observed(cards_after(50));
    let mut views = machine.subscribe();

    machine.start();
    machine.settled().await;
    machine.start();
    machine.settled().await;

    let seen = drain(&mut views);
    let loaded = LoadView {
        data: Some(sample_cards()),
        placeholder_visible: false,
    };
    assert_eq!(
        seen,
        vec![LoadView::empty(), loaded.clone(), LoadView::empty(), loaded]
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_machine_stops_fetch() {
    let counter = Arc::new(FetchCounter::default());
    let machine = LoadStateMachine::new(LoaderOptions::new(
        GRACE,
        counted_source(Duration::from_millis(1000), Arc::clone(&counter)),
    ));
    machine.start();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.started(), 1);

    drop(machine);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(counter.completed(), 0);
}

#[tokio::test(start_paused = true)]
async fn late_subscriber_sees_current_view_first() {
    let (machine, _) = observed(cards_after(2000));
    machine.start();
    sleep(Duration::from_millis(500)).await;

    let mut views = machine.subscribe();
    assert_eq!(views.next().await, Some(placeholder()));
    assert_eq!(views.next().await.unwrap().data, Some(sample_cards()));
}

/// Observer that calls back into its own machine when a load fails.
struct Reentrant<S: DataSource> {
    machine: Mutex<Weak<LoadStateMachine<S>>>,
    retry_once: bool,
    seen: Mutex<Vec<Option<SessionId>>>,
}

impl<S: DataSource> LoadObserver for Reentrant<S> {
    fn on_failure(&self, _session: SessionId, _failure: &FetchFailure) {
        let Some(machine) = self.machine.lock().upgrade() else {
            return;
        };
        let first = {
            let mut seen = self.seen.lock();
            seen.push(machine.current_session());
            seen.len() == 1
        };
        if self.retry_once && first {
            machine.start();
        }
    }
}

fn reentrant<S: DataSource>(
    source: S,
    retry_once: bool,
) -> (Arc<LoadStateMachine<S>>, Arc<Reentrant<S>>) {
    let observer = Arc::new(Reentrant {
        machine: Mutex::new(Weak::new()),
        retry_once,
        seen: Mutex::new(Vec::new()),
    });
    let machine = Arc::new(LoadStateMachine::with_observer(
        LoaderOptions::new(GRACE, source),
        Arc::clone(&observer) as Arc<dyn LoadObserver>,
    ));
    *observer.machine.lock() = Arc::downgrade(&machine);
    (machine, observer)
}

#[tokio::test(start_paused = true)]
async fn observer_may_call_back_into_machine() {
    let (machine, observer) = reentrant(
        DelayedSource::<Vec<u8>>::failing(
            Duration::from_millis(10),
            FetchFailure::transport("refused"),
        ),
        false,
    );
    let id = machine.start();

    let result = timeout(Duration::from_secs(2), machine.settled())
        .await
        .expect("settle while the observer inspects the machine");
    assert_eq!(result, Some(LoadResult::Failure(FetchFailure::transport("refused"))));
    assert_eq!(*observer.seen.lock(), vec![Some(id)]);
}

#[tokio::test(start_paused = true)]
async fn observer_may_restart_after_failure() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&attempts);
    let source = FnSource::new(move |_cancel: CancellationToken| {
        let attempt = counted.fetch_add(1, Ordering::SeqCst);
        async move {
            sleep(Duration::from_millis(10)).await;
            if attempt == 0 {
                LoadResult::Failure(FetchFailure::transport("flaky"))
            } else {
                LoadResult::Success(sample_cards())
            }
        }
    });
    let (machine, observer) = reentrant(source, true);
    let first = machine.start();

    let result = timeout(Duration::from_secs(2), machine.settled())
        .await
        .expect("retry from the failure hook");
    assert_eq!(result, Some(LoadResult::Success(sample_cards())));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(*observer.seen.lock(), vec![Some(first)]);
    assert!(machine.current_session() > Some(first));
}
