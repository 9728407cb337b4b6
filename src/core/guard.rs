//! Guard predicates for controlling state transitions.
//!
//! A guard decides whether a transition may leave the current state. The
//! checkout machine keeps one guard per transition family so every command
//! is checked against the live status instead of assuming exclusivity.

use super::state::State;
use std::marker::PhantomData;

/// Pure predicate that determines if a transition can execute.
///
/// # Example
///
/// ```rust
/// use checkout_state::core::{Guard, State};
/// use checkout_state::CheckoutStatus;
///
/// let not_finished = Guard::new(|s: &CheckoutStatus| !s.is_final());
///
/// assert!(not_finished.check(&CheckoutStatus::Pending));
/// assert!(!not_finished.check(&CheckoutStatus::Approved));
/// ```
pub struct Guard<S: State> {
    predicate: Box<dyn Fn(&S) -> bool + Send + Sync>,
    _phantom: PhantomData<S>,
}

impl<S: State> Guard<S> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
            _phantom: PhantomData,
        }
    }

    /// Guard that only passes for one of the listed states.
    pub fn from_any(states: Vec<S>) -> Self
    where
        S: 'static,
    {
        Self::new(move |s| states.contains(s))
    }

    /// Check if the guard allows transition from this state.
    pub fn check(&self, state: &S) -> bool {
        (self.predicate)(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutStatus;

    #[test]
    fn guard_allows_matching_states() {
        let guard = Guard::new(|s: &CheckoutStatus| matches!(s, CheckoutStatus::Idle));

        assert!(guard.check(&CheckoutStatus::Idle));
        assert!(!guard.check(&CheckoutStatus::Processing));
    }

    #[test]
    fn guard_checks_non_final_states() {
        let guard = Guard::new(|s: &CheckoutStatus| !s.is_final());

        assert!(guard.check(&CheckoutStatus::Idle));
        assert!(guard.check(&CheckoutStatus::Pending));
        assert!(guard.check(&CheckoutStatus::Processing));
        assert!(!guard.check(&CheckoutStatus::Approved));
        assert!(!guard.check(&CheckoutStatus::Failed));
        assert!(!guard.check(&CheckoutStatus::Expired));
    }

    #[test]
    fn from_any_matches_listed_states_only() {
        let guard = Guard::from_any(vec![CheckoutStatus::Idle, CheckoutStatus::Processing]);

        assert!(guard.check(&CheckoutStatus::Idle));
        assert!(guard.check(&CheckoutStatus::Processing));
        assert!(!guard.check(&CheckoutStatus::Pending));
        assert!(!guard.check(&CheckoutStatus::Expired));
    }

    #[test]
    fn guard_is_deterministic() {
        let guard = Guard::new(|s: &CheckoutStatus| s.is_error());

        let first = guard.check(&CheckoutStatus::Failed);
        let second = guard.check(&CheckoutStatus::Failed);

        assert_eq!(first, second);
    }
}
