//! HTTP-backed data source.
//!
//! Fetches a URL and decodes the JSON body. Record contents are opaque to
//! the loader; callers pick the target type.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::result::{FetchFailure, LoadResult};
use super::source::DataSource;

pub struct HttpSource<T> {
    client: Client,
    url: String,
    _output: PhantomData<fn() -> T>,
}

impl<T> HttpSource<T> {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Reuse an existing client (and its connection pool).
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            _output: PhantomData,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self) -> Result<T, FetchFailure>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchFailure::decode(e.to_string()))
    }
}

#[async_trait]
impl<T> DataSource for HttpSource<T>
where
    T: DeserializeOwned + Clone + PartialEq + Send + Sync + 'static,
{
    type Output = T;

    async fn fetch(&self, cancel: CancellationToken) -> LoadResult<T> {
        tracing::debug!(url = %self.url, "Fetching");

        // Dropping the request future closes the connection.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(url = %self.url, "Fetch cancelled");
                LoadResult::Failure(FetchFailure::Cancelled)
            }
            result = self.request() => result.into(),
        }
    }
}
