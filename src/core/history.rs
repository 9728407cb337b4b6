//! State transition history tracking.
//!
//! Every status change of a session is appended to an immutable history,
//! which travels with session snapshots.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What caused a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// An explicit command from a view or collaborator.
    Command,
    /// The general countdown reached zero.
    TimerExpired,
    /// The PIX countdown reached zero.
    PixTimerExpired,
    /// The session was reset to its initial state.
    Reset,
}

/// Record of a single state transition.
///
/// # Example
///
/// ```rust
/// use checkout_state::core::{StateTransition, Trigger};
/// use checkout_state::CheckoutStatus;
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: CheckoutStatus::Processing,
///     to: CheckoutStatus::Approved,
///     timestamp: Utc::now(),
///     trigger: Trigger::Command,
///     message: Some("paid".to_string()),
/// };
/// assert_eq!(transition.to, CheckoutStatus::Approved);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
    /// What caused it
    pub trigger: Trigger,
    /// Human-readable message attached to the new state, if any
    pub message: Option<String>,
}

/// Ordered history of state transitions.
///
/// History is immutable: `record` returns a new history with the
/// transition appended and leaves the receiver untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Get the path of states traversed.
    ///
    /// Returns the `from` state of the first transition followed by the
    /// `to` state of each transition.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the first and last recorded transition.
    ///
    /// Returns `None` when nothing was recorded.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Most recent transition.
    pub fn last(&self) -> Option<&StateTransition<S>> {
        self.transitions.last()
    }

    /// Transitions caused by the given trigger, in order.
    pub fn triggered_by(&self, trigger: Trigger) -> impl Iterator<Item = &StateTransition<S>> {
        self.transitions
            .iter()
            .filter(move |transition| transition.trigger == trigger)
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Get all transitions.
    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }
}
