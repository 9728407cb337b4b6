//! Core State trait for state machine states.
//!
//! Every status a checkout can be in implements this trait, which exposes
//! pure methods for inspecting state properties without side effects.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine states.
///
/// All methods are pure. States are small immutable values describing
/// where a session currently is.
///
/// # Required Traits
///
/// - `Clone`: states are copied into the transition history
/// - `PartialEq`: guards and transitions compare states
/// - `Debug`: states show up in diagnostics and log fields
/// - `Serialize` + `Deserialize`: states are part of session snapshots
///
/// # Example
///
/// ```rust
/// use checkout_state::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum CartState {
///     Open,
///     Paid,
///     Abandoned,
/// }
///
/// impl State for CartState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "open",
///             Self::Paid => "paid",
///             Self::Abandoned => "abandoned",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Paid | Self::Abandoned)
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Abandoned)
///     }
/// }
///
/// assert!(CartState::Paid.is_final());
/// assert!(!CartState::Open.is_error());
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Name used for display and logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Terminal states only leave through an explicit reset.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}
