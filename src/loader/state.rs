//! Load cycle state and its consumer projection.

use serde::Serialize;

use crate::mvi::UiState;

use super::result::LoadResult;

/// Externally observable state of the loader.
///
/// Within one cycle the state only moves forward:
/// `AwaitingFast → (ShowingPlaceholder →) Settled`. A new cycle or a
/// teardown is the only way back.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    /// No load in progress.
    Idle,

    /// Race pending, nothing shown yet.
    AwaitingFast,

    /// Grace period elapsed, data still pending.
    ShowingPlaceholder,

    /// Terminal for this cycle.
    Settled(LoadResult<T>),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Idle
    }
}

impl<T> UiState for LoadState<T> where T: Clone + PartialEq + Send + 'static {}

impl<T: Clone> LoadState<T> {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled(_))
    }

    /// Whether a race is still running for this cycle.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::AwaitingFast | Self::ShowingPlaceholder)
    }

    /// Project onto what a consumer renders.
    ///
    /// Failures project to "nothing", the same as idle.
    pub fn view(&self) -> LoadView<T> {
        match self {
            Self::Idle | Self::AwaitingFast => LoadView::empty(),
            Self::ShowingPlaceholder => LoadView {
                data: None,
                placeholder_visible: true,
            },
            Self::Settled(LoadResult::Success(value)) => LoadView {
                data: Some(value.clone()),
                placeholder_visible: false,
            },
            Self::Settled(LoadResult::Failure(_)) => LoadView::empty(),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingFast => "awaiting_fast",
            Self::ShowingPlaceholder => "showing_placeholder",
            Self::Settled(LoadResult::Success(_)) => "settled_success",
            Self::Settled(LoadResult::Failure(_)) => "settled_failure",
        }
    }
}

/// What the consumer sees: data (if any) and whether to show the skeleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadView<T> {
    pub data: Option<T>,
    pub placeholder_visible: bool,
}

impl<T> LoadView<T> {
    pub fn empty() -> Self {
        Self {
            data: None,
            placeholder_visible: false,
        }
    }
}

impl<T> Default for LoadView<T> {
    fn default() -> Self {
        Self::empty()
    }
}
