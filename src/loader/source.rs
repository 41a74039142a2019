//! Data sources: "produce a value after unknown latency".

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::result::{FetchFailure, LoadResult};

/// A value producer with unbounded, caller-independent latency.
///
/// Failures are returned as `LoadResult::Failure`, never panicked. Sources
/// do not retry. Once `cancel` fires an implementation must stop its work
/// and return `FetchFailure::Cancelled` promptly.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// The value a successful fetch yields. Opaque to the loader.
    type Output: Clone + PartialEq + Send + Sync + 'static;

    async fn fetch(&self, cancel: CancellationToken) -> LoadResult<Self::Output>;
}

/// Resolves a fixed result after a fixed latency.
///
/// Stands in for a real backend in the demo and in tests.
#[derive(Debug, Clone)]
pub struct DelayedSource<T> {
    latency: Duration,
    result: LoadResult<T>,
}

impl<T> DelayedSource<T> {
    pub fn new(latency: Duration, result: LoadResult<T>) -> Self {
        Self { latency, result }
    }

    pub fn succeeding(latency: Duration, value: T) -> Self {
        Self::new(latency, LoadResult::Success(value))
    }

    pub fn failing(latency: Duration, failure: FetchFailure) -> Self {
        Self::new(latency, LoadResult::Failure(failure))
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

#[async_trait]
impl<T> DataSource for DelayedSource<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    type Output = T;

    async fn fetch(&self, cancel: CancellationToken) -> LoadResult<T> {
        tokio::select! {
            _ = cancel.cancelled() => LoadResult::Failure(FetchFailure::Cancelled),
            _ = tokio::time::sleep(self.latency) => self.result.clone(),
        }
    }
}

/// Adapts a closure returning a future into a [`DataSource`].
pub struct FnSource<F, T> {
    fetch: F,
    _output: PhantomData<fn() -> T>,
}

impl<F, Fut, T> FnSource<F, T>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = LoadResult<T>> + Send + 'static,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            _output: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, T> DataSource for FnSource<F, T>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = LoadResult<T>> + Send + 'static,
    T: Clone + PartialEq + Send + Sync + 'static,
{
    type Output = T;

    async fn fetch(&self, cancel: CancellationToken) -> LoadResult<T> {
        (self.fetch)(cancel).await
    }
}
