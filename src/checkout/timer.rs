//! Countdown timers.
//!
//! A `Countdown` only knows how to count. It never looks at a clock: the
//! session shell calls [`Countdown::tick`] once per elapsed tick period, and
//! tests call it directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two session timers an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    /// General session expiry.
    General,
    /// PIX payment window, tied to the provider-side deadline.
    Pix,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => f.write_str("general"),
            Self::Pix => f.write_str("pix"),
        }
    }
}

/// Result of a single countdown step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// The timer was not running; nothing changed.
    Idle,
    /// Decremented; this many seconds remain.
    Running(u32),
    /// This step reached zero. `session_expired` reports whether the
    /// machine moved to `expired` as a consequence.
    Expired { session_expired: bool },
}

impl Tick {
    /// Whether the driver should schedule another tick.
    pub fn keeps_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

/// Remaining-seconds counter with running and expired flags.
///
/// `expired` is only set by ticking down to zero and stays set until the
/// countdown is restarted or cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    remaining: u32,
    running: bool,
    expired: bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart from `seconds`, clearing a previous expiry.
    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.running = seconds > 0;
        self.expired = false;
    }

    /// Freeze the remaining seconds. Returns false if nothing was running.
    pub fn pause(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        was_running
    }

    /// Continue from the frozen value. Returns false if the countdown is
    /// already running, expired or was never started.
    pub fn resume(&mut self) -> bool {
        if self.running || self.expired || self.remaining == 0 {
            return false;
        }
        self.running = true;
        true
    }

    /// Stop counting, keeping the remaining seconds for display.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stop and zero the countdown, clearing the expired flag.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            self.expired = true;
            Tick::Expired {
                session_expired: false,
            }
        } else {
            Tick::Running(self.remaining)
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Internal consistency of a countdown restored from outside.
    pub(crate) fn is_consistent(&self) -> bool {
        let running_ok = !self.running || self.remaining > 0;
        let expired_ok = !self.expired || (self.remaining == 0 && !self.running);
        running_ok && expired_ok
    }
}
