//! checkout-state: the state machine behind a payment checkout.
//!
//! A checkout session moves through `idle → pending → processing →
//! {approved, failed, expired}` and back to `idle` on reset. Alongside the
//! status it keeps two independent countdowns (the general session timeout
//! and the PIX payment window) and a notification gate that keeps views from
//! showing duplicate or contradictory toasts.
//!
//! The crate follows a "pure core, imperative shell" split:
//!
//! - [`checkout::CheckoutMachine`] is synchronous and clock-free. Time enters
//!   as explicit `tick` calls, which makes every transition testable.
//! - [`session::CheckoutSession`] drives the machine on a tokio runtime: one
//!   cancellable ticker task per running countdown, a `watch` channel of
//!   views, a `broadcast` channel of notifications, and a task-local
//!   provider ([`session::context`]) so views can reach the session without
//!   parameter threading.
//!
//! # Example
//!
//! ```rust
//! use checkout_state::{CheckoutMachine, CheckoutStatus, NotificationKind, TimerKind};
//!
//! let mut machine = CheckoutMachine::default();
//! machine.set_pending();
//! machine.start_timer(1);
//! assert_eq!(machine.timer_seconds(), 60);
//!
//! assert!(machine.can_show_expiration());
//! machine.show_notification(NotificationKind::Warning, "One minute left");
//! assert!(!machine.can_show_expiration());
//!
//! for _ in 0..60 {
//!     machine.tick(TimerKind::General);
//! }
//! assert!(machine.timer_expired());
//! assert_eq!(machine.status(), CheckoutStatus::Expired);
//! ```

pub mod checkout;
pub mod config;
pub mod core;
pub mod session;
pub mod snapshot;

// Re-export commonly used types
pub use checkout::{
    CheckoutMachine, CheckoutStatus, CheckoutView, Notification, NotificationKind, Tick, TimerKind,
};
pub use config::{CheckoutConfig, CheckoutConfigBuilder, ConfigError};
pub use session::context::{provide, try_use_checkout, use_can_show_expiration, use_checkout};
pub use session::payment::{PaymentAction, PaymentError, PaymentOutcome, Submission};
pub use session::{CheckoutHandle, CheckoutSession, SessionError};
pub use snapshot::{SessionSnapshot, SnapshotError};
