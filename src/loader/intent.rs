//! Intents for the load cycle.

use crate::mvi::Intent;

use super::result::LoadResult;

/// Events that drive [`LoadReducer`](super::LoadReducer).
#[derive(Debug)]
pub enum LoadIntent<T> {
    /// Consumer began a new cycle.
    Start,

    /// Grace timer won the race.
    TimeoutElapsed,

    /// The fetch settled, either as the race winner or afterwards.
    DataArrived(LoadResult<T>),

    /// Consumer stopped caring.
    Teardown,
}

impl<T: Send + 'static> Intent for LoadIntent<T> {}
