//! The checkout state machine.
//!
//! `CheckoutMachine` is synchronous and owns no clock. Commands are checked
//! against the live status through guards, so two sources racing to settle a
//! session (a timer expiring while a payment confirmation arrives) resolve to
//! whichever lands first; the loser is ignored.

use super::notification::{Notification, NotificationGate, NotificationKind};
use super::status::CheckoutStatus;
use super::timer::{Countdown, Tick, TimerKind};
use crate::config::CheckoutConfig;
use crate::core::{Guard, State, StateHistory, StateTransition, Trigger};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Observable state, read by views after every change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutView {
    pub status: CheckoutStatus,
    pub is_locked: bool,
    pub timer_seconds: u32,
    pub timer_running: bool,
    pub timer_expired: bool,
    pub pix_timer_seconds: u32,
    pub pix_timer_running: bool,
    pub pix_timer_expired: bool,
}

struct TransitionGuards {
    await_payment: Guard<CheckoutStatus>,
    acquire_lock: Guard<CheckoutStatus>,
    settle: Guard<CheckoutStatus>,
}

impl TransitionGuards {
    fn new() -> Self {
        Self {
            await_payment: Guard::from_any(vec![CheckoutStatus::Idle, CheckoutStatus::Processing]),
            acquire_lock: Guard::new(|s: &CheckoutStatus| !s.is_locked() && !s.is_final()),
            settle: Guard::new(|s: &CheckoutStatus| !s.is_final()),
        }
    }
}

/// Single source of truth for one checkout session.
///
/// # Example
///
/// ```rust
/// use checkout_state::{CheckoutMachine, CheckoutStatus};
///
/// let mut machine = CheckoutMachine::default();
/// assert!(machine.set_processing());
/// assert!(!machine.set_processing());
///
/// machine.set_approved(Some("ok".to_string()));
/// assert_eq!(machine.status(), CheckoutStatus::Approved);
/// assert!(!machine.is_locked());
/// ```
pub struct CheckoutMachine {
    status: CheckoutStatus,
    message: Option<String>,
    timer: Countdown,
    pix_timer: Countdown,
    gate: NotificationGate,
    history: StateHistory<CheckoutStatus>,
    config: CheckoutConfig,
    guards: TransitionGuards,
    /// Bumped every time the processing lock is granted.
    lock_epoch: u64,
}

impl Default for CheckoutMachine {
    fn default() -> Self {
        Self::new(CheckoutConfig::default())
    }
}

impl fmt::Debug for CheckoutMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutMachine")
            .field("status", &self.status)
            .field("message", &self.message)
            .field("timer", &self.timer)
            .field("pix_timer", &self.pix_timer)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl CheckoutMachine {
    pub fn new(config: CheckoutConfig) -> Self {
        Self {
            status: CheckoutStatus::Idle,
            message: None,
            timer: Countdown::new(),
            pix_timer: Countdown::new(),
            gate: NotificationGate::new(),
            history: StateHistory::new(),
            config,
            guards: TransitionGuards::new(),
            lock_epoch: 0,
        }
    }

    pub(crate) fn from_parts(
        config: CheckoutConfig,
        status: CheckoutStatus,
        message: Option<String>,
        timer: Countdown,
        pix_timer: Countdown,
        gate: NotificationGate,
        history: StateHistory<CheckoutStatus>,
    ) -> Self {
        Self {
            status,
            message,
            timer,
            pix_timer,
            gate,
            history,
            config,
            guards: TransitionGuards::new(),
            lock_epoch: 0,
        }
    }

    pub fn status(&self) -> CheckoutStatus {
        self.status
    }

    /// Message attached by the last transition, for display.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_locked(&self) -> bool {
        self.status.is_locked()
    }

    /// Identifies the current processing lock. Changes on every grant.
    pub fn lock_epoch(&self) -> u64 {
        self.lock_epoch
    }

    /// Whether the lock granted at `epoch` is still the one being held.
    pub fn holds_lock(&self, epoch: u64) -> bool {
        self.is_locked() && self.lock_epoch == epoch
    }

    pub fn timer_seconds(&self) -> u32 {
        self.timer.remaining()
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn timer_expired(&self) -> bool {
        self.timer.is_expired()
    }

    pub fn pix_timer_seconds(&self) -> u32 {
        self.pix_timer.remaining()
    }

    pub fn pix_timer_running(&self) -> bool {
        self.pix_timer.is_running()
    }

    pub fn pix_timer_expired(&self) -> bool {
        self.pix_timer.is_expired()
    }

    pub fn countdown(&self, kind: TimerKind) -> &Countdown {
        match kind {
            TimerKind::General => &self.timer,
            TimerKind::Pix => &self.pix_timer,
        }
    }

    fn countdown_mut(&mut self, kind: TimerKind) -> &mut Countdown {
        match kind {
            TimerKind::General => &mut self.timer,
            TimerKind::Pix => &mut self.pix_timer,
        }
    }

    pub fn gate(&self) -> &NotificationGate {
        &self.gate
    }

    pub fn history(&self) -> &StateHistory<CheckoutStatus> {
        &self.history
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn view(&self) -> CheckoutView {
        CheckoutView {
            status: self.status,
            is_locked: self.is_locked(),
            timer_seconds: self.timer.remaining(),
            timer_running: self.timer.is_running(),
            timer_expired: self.timer.is_expired(),
            pix_timer_seconds: self.pix_timer.remaining(),
            pix_timer_running: self.pix_timer.is_running(),
            pix_timer_expired: self.pix_timer.is_expired(),
        }
    }

    /// Move to `to`, opening a new notification epoch.
    fn transition(&mut self, to: CheckoutStatus, trigger: Trigger, message: Option<String>) {
        let from = self.status;
        self.history = self.history.record(StateTransition {
            from,
            to,
            timestamp: Utc::now(),
            trigger,
            message: message.clone(),
        });
        self.status = to;
        self.message = message;
        self.gate.clear();
        debug!(from = from.name(), to = to.name(), ?trigger, "checkout transition");
    }

    /// Enter `pending` from `idle` or `processing`.
    pub fn set_pending(&mut self) -> bool {
        if !self.guards.await_payment.check(&self.status) {
            debug!(status = self.status.name(), "pending transition ignored");
            return false;
        }
        self.transition(CheckoutStatus::Pending, Trigger::Command, None);
        true
    }

    /// Enter `pending` and start the general timer with the configured length.
    pub fn begin(&mut self) -> bool {
        if !self.set_pending() {
            return false;
        }
        self.start_timer(self.config.timer_minutes)
    }

    /// Start the PIX countdown with the configured window length.
    pub fn begin_pix(&mut self) -> bool {
        self.start_pix_timer(self.config.pix_timer_minutes)
    }

    /// Try to take the processing lock.
    ///
    /// Returns `false` without touching state while already `processing`
    /// or once the session has finished.
    pub fn set_processing(&mut self) -> bool {
        if !self.guards.acquire_lock.check(&self.status) {
            warn!(status = self.status.name(), "processing lock refused");
            return false;
        }
        self.lock_epoch += 1;
        self.transition(CheckoutStatus::Processing, Trigger::Command, None);
        true
    }

    pub fn set_approved(&mut self, message: Option<String>) -> bool {
        self.settle(CheckoutStatus::Approved, Trigger::Command, message)
    }

    pub fn set_failed(&mut self, message: Option<String>) -> bool {
        self.settle(CheckoutStatus::Failed, Trigger::Command, message)
    }

    pub fn set_expired(&mut self, message: Option<String>) -> bool {
        self.settle(CheckoutStatus::Expired, Trigger::Command, message)
    }

    fn settle(&mut self, to: CheckoutStatus, trigger: Trigger, message: Option<String>) -> bool {
        if !self.guards.settle.check(&self.status) {
            debug!(
                status = self.status.name(),
                to = to.name(),
                "terminal transition ignored"
            );
            return false;
        }
        self.timer.stop();
        self.pix_timer.stop();
        self.transition(to, trigger, message);
        info!(status = to.name(), message = ?self.message, "checkout settled");
        true
    }

    /// Back to `idle` with both timers zeroed and the gate open.
    pub fn reset(&mut self) {
        self.timer.clear();
        self.pix_timer.clear();
        if self.status != CheckoutStatus::Idle {
            self.transition(CheckoutStatus::Idle, Trigger::Reset, None);
        }
        self.message = None;
        self.gate.clear();
    }

    /// Restart the general countdown at `minutes * 60` seconds.
    ///
    /// Zero minutes is rejected, as is a length whose seconds overflow `u32`
    /// or any start once the session settled.
    pub fn start_timer(&mut self, minutes: u32) -> bool {
        self.start(TimerKind::General, minutes)
    }

    /// Restart the PIX countdown. PIX windows cannot be paused.
    pub fn start_pix_timer(&mut self, minutes: u32) -> bool {
        self.start(TimerKind::Pix, minutes)
    }

    fn start(&mut self, kind: TimerKind, minutes: u32) -> bool {
        let Some(seconds) = minutes.checked_mul(60).filter(|s| *s > 0) else {
            warn!(timer = %kind, minutes, "timer start with invalid length rejected");
            return false;
        };
        if !self.guards.settle.check(&self.status) {
            debug!(timer = %kind, status = self.status.name(), "timer start ignored");
            return false;
        }
        self.countdown_mut(kind).start(seconds);
        debug!(timer = %kind, seconds, "timer started");
        true
    }

    pub fn pause_timer(&mut self) -> bool {
        let paused = self.timer.pause();
        if paused {
            debug!(remaining = self.timer.remaining(), "timer paused");
        }
        paused
    }

    /// Continue the general countdown from its frozen value.
    ///
    /// Refused once the session has settled.
    pub fn resume_timer(&mut self) -> bool {
        if !self.guards.settle.check(&self.status) {
            return false;
        }
        let resumed = self.timer.resume();
        if resumed {
            debug!(remaining = self.timer.remaining(), "timer resumed");
        }
        resumed
    }

    /// Advance one countdown by one second.
    pub fn tick(&mut self, kind: TimerKind) -> Tick {
        let tick = self.countdown_mut(kind).tick();
        if !matches!(tick, Tick::Expired { .. }) {
            return tick;
        }

        let (enabled, trigger, message) = match kind {
            TimerKind::General => (
                self.config.expire_on_timeout,
                Trigger::TimerExpired,
                self.config.expired_message.clone(),
            ),
            TimerKind::Pix => (
                self.config.expire_on_pix_timeout,
                Trigger::PixTimerExpired,
                self.config.pix_expired_message.clone(),
            ),
        };
        info!(timer = %kind, status = self.status.name(), "timer expired");

        let session_expired = enabled
            && self.status == CheckoutStatus::Pending
            && self.settle(CheckoutStatus::Expired, trigger, Some(message));
        Tick::Expired { session_expired }
    }

    pub fn can_show_notification(&self, kind: NotificationKind) -> bool {
        self.gate.allows(kind)
    }

    /// Whether views should render the expiration banner.
    pub fn can_show_expiration(&self) -> bool {
        self.status == CheckoutStatus::Pending && self.gate.allows(NotificationKind::Warning)
    }

    /// Let a notification through the gate, if allowed.
    pub fn show_notification(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> Option<Notification> {
        if !self.gate.admit(kind) {
            debug!(%kind, status = self.status.name(), "notification suppressed");
            return None;
        }
        Some(Notification {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            status: self.status,
            shown_at: Utc::now(),
        })
    }

    pub(crate) fn parts(
        &self,
    ) -> (
        CheckoutStatus,
        Option<&String>,
        Countdown,
        Countdown,
        &NotificationGate,
        &StateHistory<CheckoutStatus>,
    ) {
        (
            self.status,
            self.message.as_ref(),
            self.timer,
            self.pix_timer,
            &self.gate,
            &self.history,
        )
    }
}
