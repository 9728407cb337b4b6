//! Core state machine primitives.
//!
//! - State definitions via the `State` trait
//! - Guard predicates for transition control
//! - Immutable history tracking
//!
//! Everything here is pure; time and scheduling live in the session shell.

mod guard;
mod history;
mod state;

pub use guard::Guard;
pub use history::{StateHistory, StateTransition, Trigger};
pub use state::State;
