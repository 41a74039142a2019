//! Reducer for the load cycle.

use std::marker::PhantomData;

use crate::mvi::Reducer;

use super::intent::LoadIntent;
use super::state::LoadState;

/// Load cycle transitions.
///
/// Pure: session bookkeeping, publishing and failure logging happen in the
/// state machine around the dispatch call.
pub struct LoadReducer<T> {
    _state: PhantomData<fn() -> T>,
}

impl<T> Reducer for LoadReducer<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    type State = LoadState<T>;
    type Intent = LoadIntent<T>;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            LoadIntent::Start => LoadState::AwaitingFast,

            LoadIntent::TimeoutElapsed => match state {
                LoadState::AwaitingFast => LoadState::ShowingPlaceholder,
                other => other,
            },

            LoadIntent::DataArrived(result) => match state {
                LoadState::AwaitingFast | LoadState::ShowingPlaceholder => {
                    LoadState::Settled(result)
                }
                // Settled results are never overwritten; idle has no cycle.
                other => other,
            },

            LoadIntent::Teardown => LoadState::Idle,
        }
    }
}
