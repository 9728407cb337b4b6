//! Save and restore checkout sessions.
//!
//! A snapshot captures everything a session needs to continue after a
//! reload: status, message, both countdowns, the notification gate and the
//! transition history. Configuration is not part of it; the caller supplies
//! the configuration when restoring.

use crate::checkout::{CheckoutMachine, CheckoutStatus, Countdown, NotificationGate};
use crate::config::CheckoutConfig;
use crate::core::{State, StateHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable state of one checkout session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub status: CheckoutStatus,
    pub message: Option<String>,
    pub timer: Countdown,
    pub pix_timer: Countdown,
    pub gate: NotificationGate,
    pub history: StateHistory<CheckoutStatus>,
}

impl SessionSnapshot {
    /// Capture the current state of a machine.
    pub fn capture(machine: &CheckoutMachine) -> Self {
        let (status, message, timer, pix_timer, gate, history) = machine.parts();
        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4(),
            taken_at: Utc::now(),
            status,
            message: message.cloned(),
            timer,
            pix_timer,
            gate: gate.clone(),
            history: history.clone(),
        }
    }

    /// Rebuild a machine from this snapshot after validating it.
    pub fn restore(self, config: CheckoutConfig) -> Result<CheckoutMachine, SnapshotError> {
        self.validate()?;
        Ok(CheckoutMachine::from_parts(
            config,
            self.status,
            self.message,
            self.timer,
            self.pix_timer,
            self.gate,
            self.history,
        ))
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        for (label, countdown) in [("timer", &self.timer), ("pix_timer", &self.pix_timer)] {
            if !countdown.is_consistent() {
                return Err(SnapshotError::ValidationFailed(format!(
                    "{label} is inconsistent: {countdown:?}"
                )));
            }
        }
        if self.status.is_final() && (self.timer.is_running() || self.pix_timer.is_running()) {
            return Err(SnapshotError::ValidationFailed(format!(
                "status '{}' is terminal but a timer is still running",
                self.status.name()
            )));
        }
        if let Some(last) = self.history.last() {
            if last.to != self.status {
                return Err(SnapshotError::ValidationFailed(format!(
                    "history ends in '{}' but status is '{}'",
                    last.to.name(),
                    self.status.name()
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{NotificationKind, TimerKind};

    fn busy_machine() -> CheckoutMachine {
        let mut machine = CheckoutMachine::default();
        machine.set_pending();
        machine.start_timer(5);
        machine.start_pix_timer(2);
        for _ in 0..30 {
            machine.tick(TimerKind::General);
        }
        machine.pause_timer();
        machine.show_notification(NotificationKind::Warning, "hurry up");
        machine
    }

    #[test]
    fn capture_and_restore_preserves_state() {
        let machine = busy_machine();
        let snapshot = SessionSnapshot::capture(&machine);

        let restored = snapshot.restore(CheckoutConfig::default()).unwrap();

        assert_eq!(restored.view(), machine.view());
        assert_eq!(restored.timer_seconds(), 270);
        assert!(!restored.timer_running());
        assert!(restored.pix_timer_running());
        assert!(!restored.can_show_notification(NotificationKind::Warning));
        assert_eq!(restored.history(), machine.history());
    }

    #[test]
    fn restored_machine_keeps_counting() {
        let machine = busy_machine();
        let mut restored = SessionSnapshot::capture(&machine)
            .restore(CheckoutConfig::default())
            .unwrap();

        assert!(restored.resume_timer());
        restored.tick(TimerKind::General);
        assert_eq!(restored.timer_seconds(), 269);
    }

    #[test]
    fn json_roundtrip() {
        let snapshot = SessionSnapshot::capture(&busy_machine());

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"pending\""));
        let decoded = SessionSnapshot::from_json(&json).unwrap();

        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn binary_roundtrip() {
        let snapshot = SessionSnapshot::capture(&busy_machine());

        let bytes = snapshot.to_bytes().unwrap();
        let decoded = SessionSnapshot::from_bytes(&bytes).unwrap();

        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut snapshot = SessionSnapshot::capture(&CheckoutMachine::default());
        snapshot.version = 99;

        assert!(matches!(
            snapshot.restore(CheckoutConfig::default()),
            Err(SnapshotError::UnsupportedVersion {
                found: 99,
                supported: SNAPSHOT_VERSION
            })
        ));
    }

    #[test]
    fn rejects_running_timer_on_terminal_status() {
        let mut machine = CheckoutMachine::default();
        machine.start_timer(1);
        let mut snapshot = SessionSnapshot::capture(&machine);
        snapshot.status = CheckoutStatus::Approved;

        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::ValidationFailed(_))
        ));
    }

    #[test]
    fn rejects_status_that_disagrees_with_history() {
        let mut machine = CheckoutMachine::default();
        machine.set_pending();
        let mut snapshot = SessionSnapshot::capture(&machine);
        snapshot.status = CheckoutStatus::Processing;

        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::ValidationFailed(_))
        ));
    }

    #[test]
    fn garbage_input_is_a_deserialization_error() {
        assert!(matches!(
            SessionSnapshot::from_json("{}"),
            Err(SnapshotError::DeserializationFailed(_))
        ));
        assert!(matches!(
            SessionSnapshot::from_bytes(&[1, 2, 3]),
            Err(SnapshotError::DeserializationFailed(_))
        ));
    }
}
