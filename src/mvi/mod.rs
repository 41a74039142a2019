//! State/intent/reducer traits the load machine is built on.
//!
//! ```text
//! start / teardown ──┐
//!                    ├──→ LoadIntent ──→ LoadReducer ──→ LoadState ──→ LoadView
//! race settlements ──┘
//! ```
//!
//! Everything that can change a load cycle arrives as an intent; the
//! reducer decides the next state and the machine projects it for
//! subscribers.

mod intent;
mod reducer;
mod state;

pub use intent::Intent;
pub use reducer::Reducer;
pub use state::UiState;
