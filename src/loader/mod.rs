//! Progressive loading: show a placeholder only when data is slow.
//!
//! A load cycle races a [`DataSource`] against a grace timer:
//!
//! ```text
//! Idle ──start──→ AwaitingFast ──data first──→ Settled
//!                      │
//!                  timer first
//!                      ↓
//!              ShowingPlaceholder ──data──→ Settled
//! ```
//!
//! - `source.rs` / `http.rs` - data sources
//! - `timeout.rs` - one-shot grace timer
//! - `race.rs` - fetch vs. timer race
//! - `state.rs`, `intent.rs`, `reducer.rs` - MVI state and transitions
//! - `machine.rs` - session ownership, teardown and consumer views

mod http;
mod intent;
mod machine;
mod observer;
mod race;
mod reducer;
mod result;
mod session;
mod source;
mod state;
mod timeout;

pub use http::HttpSource;
pub use intent::LoadIntent;
pub use machine::{LoadStateMachine, LoaderOptions, Subscription};
pub use observer::{LoadObserver, TracingObserver};
pub use race::{PendingData, RaceController, RaceOutcome};
pub use reducer::LoadReducer;
pub use result::{FetchFailure, LoadResult};
pub use session::{Liveness, LoadSession, SessionId};
pub use source::{DataSource, DelayedSource, FnSource};
pub use state::{LoadState, LoadView};
pub use timeout::TimeoutSignal;
