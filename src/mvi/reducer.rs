use super::intent::Intent;
use super::state::UiState;

/// Transition table from one state to the next.
///
/// Takes no `self`: implementations hold no data and must not touch
/// sessions, channels or logging.
pub trait Reducer {
    type State: UiState;
    type Intent: Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}
