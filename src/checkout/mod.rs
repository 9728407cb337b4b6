//! Checkout session state: status, countdowns and notification gating.

mod machine;
mod notification;
mod status;
mod timer;

pub use machine::{CheckoutMachine, CheckoutView};
pub use notification::{Notification, NotificationGate, NotificationKind};
pub use status::CheckoutStatus;
pub use timer::{Countdown, Tick, TimerKind};
