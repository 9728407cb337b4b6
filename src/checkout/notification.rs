//! One-shot notification gating per status epoch.

use super::status::CheckoutStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of user-facing notification.
///
/// Ordered by priority: a shown `Success` blocks `Error` and `Warning`, a
/// shown `Error` blocks `Warning`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Warning,
    Error,
    Success,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 3] = [
        NotificationKind::Warning,
        NotificationKind::Error,
        NotificationKind::Success,
    ];

    fn index(self) -> usize {
        match self {
            Self::Warning => 0,
            Self::Error => 1,
            Self::Success => 2,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
            Self::Success => f.write_str("success"),
        }
    }
}

/// A notification the gate let through.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    /// Status active when it was shown.
    pub status: CheckoutStatus,
    pub shown_at: DateTime<Utc>,
}

/// Counts of notifications shown during the current status epoch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationGate {
    shown: [u32; 3],
    suppressed: u32,
}

impl NotificationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// False once this kind, or a higher-priority one, was shown.
    pub fn allows(&self, kind: NotificationKind) -> bool {
        NotificationKind::ALL
            .iter()
            .filter(|other| **other >= kind)
            .all(|other| self.shown[other.index()] == 0)
    }

    /// Record a request. Returns whether it may be displayed.
    pub fn admit(&mut self, kind: NotificationKind) -> bool {
        if self.allows(kind) {
            self.shown[kind.index()] += 1;
            true
        } else {
            self.suppressed += 1;
            false
        }
    }

    pub fn shown(&self, kind: NotificationKind) -> u32 {
        self.shown[kind.index()]
    }

    /// Requests dropped since the last clear.
    pub fn suppressed(&self) -> u32 {
        self.suppressed
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
