//! Load results and the failure taxonomy of a fetch.

use thiserror::Error;

/// Reasons a data source can fail to produce a value.
///
/// Failures are values, not panics: every variant ends up as
/// `LoadResult::Failure` and is never re-raised past the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// Network or transport error.
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// The remote end answered with a non-success status.
    #[error("unexpected status {status}")]
    Status { status: u16 },

    /// The payload arrived but could not be decoded.
    #[error("decode error: {reason}")]
    Decode { reason: String },

    /// The owning session was cancelled before the fetch finished.
    #[error("fetch cancelled")]
    Cancelled,

    /// The fetch task panicked or was aborted.
    #[error("fetch aborted: {reason}")]
    Aborted { reason: String },
}

impl FetchFailure {
    pub fn transport(reason: impl Into<String>) -> Self {
        FetchFailure::Transport {
            reason: reason.into(),
        }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        FetchFailure::Decode {
            reason: reason.into(),
        }
    }

    /// Whether this failure is only the echo of a cancellation request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchFailure::Cancelled)
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            FetchFailure::Status {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            FetchFailure::decode(err.to_string())
        } else {
            FetchFailure::transport(err.to_string())
        }
    }
}

/// Outcome of one fetch. Produced exactly once per load operation.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadResult<T> {
    Success(T),
    Failure(FetchFailure),
}

impl<T> LoadResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, LoadResult::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            LoadResult::Success(value) => Some(value),
            LoadResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            LoadResult::Success(_) => None,
            LoadResult::Failure(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<T, FetchFailure> {
        self.into()
    }
}

impl<T> From<Result<T, FetchFailure>> for LoadResult<T> {
    fn from(result: Result<T, FetchFailure>) -> Self {
        match result {
            Ok(value) => LoadResult::Success(value),
            Err(failure) => LoadResult::Failure(failure),
        }
    }
}

impl<T> From<LoadResult<T>> for Result<T, FetchFailure> {
    fn from(result: LoadResult<T>) -> Self {
        match result {
            LoadResult::Success(value) => Ok(value),
            LoadResult::Failure(failure) => Err(failure),
        }
    }
}
