//! Checkout status values.

use crate::core::State;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a checkout session currently is.
///
/// `Idle` is the initial status. `Approved`, `Failed` and `Expired` are
/// terminal and only leave through a reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStatus {
    #[default]
    Idle,
    /// Awaiting customer action or payment confirmation.
    Pending,
    /// Payment submission in flight. The session is locked.
    Processing,
    Approved,
    Failed,
    Expired,
}

impl CheckoutStatus {
    pub const ALL: [CheckoutStatus; 6] = [
        CheckoutStatus::Idle,
        CheckoutStatus::Pending,
        CheckoutStatus::Processing,
        CheckoutStatus::Approved,
        CheckoutStatus::Failed,
        CheckoutStatus::Expired,
    ];

    /// True while a payment submission holds the lock.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

impl State for CheckoutStatus {
    fn name(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Approved => "approved",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }

    fn is_final(&self) -> bool {
        matches!(self, Self::Approved | Self::Failed | Self::Expired)
    }

    fn is_error(&self) -> bool {
        matches!(self, Self::Failed | Self::Expired)
    }
}

impl fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        assert_eq!(CheckoutStatus::default(), CheckoutStatus::Idle);
    }

    #[test]
    fn only_processing_is_locked() {
        for status in CheckoutStatus::ALL {
            assert_eq!(status.is_locked(), status == CheckoutStatus::Processing);
        }
    }

    #[test]
    fn terminal_statuses() {
        let terminal: Vec<_> = CheckoutStatus::ALL
            .into_iter()
            .filter(|s| s.is_final())
            .collect();
        assert_eq!(
            terminal,
            vec![
                CheckoutStatus::Approved,
                CheckoutStatus::Failed,
                CheckoutStatus::Expired
            ]
        );
        assert!(!CheckoutStatus::Approved.is_error());
        assert!(CheckoutStatus::Expired.is_error());
    }

    #[test]
    fn serializes_as_lowercase_name() {
        for status in CheckoutStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.name()));
        }
        let parsed: CheckoutStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(parsed, CheckoutStatus::Processing);
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(CheckoutStatus::Pending.to_string(), "pending");
    }
}
