//! State management
//!
//! A single immutable snapshot (`AppState`) is replaced on every dispatched
//! `Action`. The reducer is pure; persistence and notifications come back
//! as `Effect`s for the session to run.

pub mod app_state;
pub mod dispatcher;
pub mod events;
pub mod reducer;

pub use app_state::AppState;
pub use dispatcher::{StateDispatcher, StateSubscriber};
pub use events::{Action, Effect, Notice, NoticeLevel};
pub use reducer::{reduce, Transition};
