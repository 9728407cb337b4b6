//! Payment submission under the processing lock.
//!
//! The payment itself is an opaque collaborator: a factory producing a
//! fresh stillwater effect per attempt. [`CheckoutHandle::submit`] takes the
//! processing lock, runs the effect without holding the session lock, and
//! applies whatever outcome comes back through the guarded transitions.

use super::CheckoutHandle;
use crate::checkout::CheckoutStatus;
use std::sync::Arc;
use stillwater::effect::{BoxedEffect, Effect};
use thiserror::Error;
use tracing::{debug, warn};

/// What the payment collaborator reported.
#[derive(Clone, Debug, PartialEq)]
pub enum PaymentOutcome {
    Approved { message: Option<String> },
    Declined { message: Option<String> },
    /// Submitted; confirmation arrives later (for example a PIX charge
    /// waiting for the customer to pay).
    AwaitingConfirmation,
}

/// Errors a payment action can fail with
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PaymentError {
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Payment gateway timed out")]
    Timeout,

    #[error("Payment request rejected: {0}")]
    InvalidRequest(String),
}

impl PaymentError {
    /// Message safe to show to the customer.
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::Gateway(_) => "Payment processing failed. Please try again.",
            PaymentError::Timeout => "The payment provider did not respond in time.",
            PaymentError::InvalidRequest(_) => "Please review your payment details.",
        }
    }
}

pub type PaymentEffect<Env> = BoxedEffect<PaymentOutcome, PaymentError, Env>;

/// Factory for payment effects. A fresh effect is built for every attempt.
pub type PaymentAction<Env> = Arc<dyn Fn() -> PaymentEffect<Env> + Send + Sync>;

/// Result of [`CheckoutHandle::submit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    /// Another submission holds the lock, or the session is finished. The
    /// action was not run.
    AlreadyLocked,
    /// The action ran; this is the status afterwards.
    Submitted(CheckoutStatus),
}

impl CheckoutHandle {
    /// Run `action` under the processing lock and apply its outcome.
    ///
    /// The outcome only applies to the lock this call took. If the lock was
    /// released while the action was in flight (the session was settled or
    /// reset through another handle, or a newer attempt took the lock), the
    /// outcome is stale and ignored.
    pub async fn submit<Env>(&self, action: &PaymentAction<Env>, env: &Env) -> Submission
    where
        Env: Clone + Send + Sync + 'static,
    {
        let Some(epoch) = self.command(None, |m| m.set_processing().then(|| m.lock_epoch()))
        else {
            return Submission::AlreadyLocked;
        };

        let result = action().run(env).await;
        if let Err(error) = &result {
            warn!(%error, "payment action failed");
        }

        let applied = self.command(false, |m| {
            if !m.holds_lock(epoch) {
                return false;
            }
            match result {
                Ok(PaymentOutcome::Approved { message }) => m.set_approved(message),
                Ok(PaymentOutcome::Declined { message }) => m.set_failed(message),
                Ok(PaymentOutcome::AwaitingConfirmation) => m.set_pending(),
                Err(error) => m.set_failed(Some(error.user_message().to_string())),
            }
        });
        if !applied {
            debug!(epoch, "stale payment outcome ignored");
        }
        Submission::Submitted(self.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckoutConfig;
    use crate::core::Trigger;
    use crate::session::CheckoutSession;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stillwater::prelude::*;

    fn session() -> CheckoutSession {
        CheckoutSession::new(CheckoutConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn approved_outcome_settles_session() {
        let session = session();
        session.set_pending();
        let action: PaymentAction<()> = Arc::new(|| -> PaymentEffect<()> {
            pure(PaymentOutcome::Approved {
                message: Some("Payment approved".to_string()),
            })
            .boxed()
        });

        let submission = session.submit(&action, &()).await;

        assert_eq!(submission, Submission::Submitted(CheckoutStatus::Approved));
        assert_eq!(session.message().as_deref(), Some("Payment approved"));
        assert!(!session.is_locked());
    }

    #[tokio::test]
    async fn declined_outcome_fails_session() {
        let session = session();
        let action: PaymentAction<()> = Arc::new(|| -> PaymentEffect<()> {
            pure(PaymentOutcome::Declined { message: None }).boxed()
        });

        let submission = session.submit(&action, &()).await;

        assert_eq!(submission, Submission::Submitted(CheckoutStatus::Failed));
    }

    #[tokio::test]
    async fn awaiting_confirmation_returns_to_pending() {
        let session = session();
        session.set_pending();
        session.start_pix_timer(30);
        let action: PaymentAction<()> = Arc::new(|| -> PaymentEffect<()> {
            pure(PaymentOutcome::AwaitingConfirmation).boxed()
        });

        let submission = session.submit(&action, &()).await;

        assert_eq!(submission, Submission::Submitted(CheckoutStatus::Pending));
        assert!(session.pix_timer_running());

        // The confirmation relay settles it later.
        assert!(session.set_approved(Some("PIX received".to_string())));
        assert!(!session.pix_timer_running());
    }

    #[tokio::test]
    async fn action_error_fails_with_user_message() {
        let session = session();
        let action: PaymentAction<()> = Arc::new(|| -> PaymentEffect<()> {
            fail(PaymentError::Gateway("HTTP 502".to_string())).boxed()
        });

        let submission = session.submit(&action, &()).await;

        assert_eq!(submission, Submission::Submitted(CheckoutStatus::Failed));
        assert_eq!(
            session.message().as_deref(),
            Some("Payment processing failed. Please try again.")
        );
    }

    #[tokio::test]
    async fn double_submit_does_not_run_action() {
        let session = session();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let action: PaymentAction<()> = Arc::new(move || -> PaymentEffect<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            pure(PaymentOutcome::AwaitingConfirmation).boxed()
        });

        assert!(session.set_processing());
        let submission = session.submit(&action, &()).await;

        assert_eq!(submission, Submission::AlreadyLocked);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.status(), CheckoutStatus::Processing);
    }

    #[derive(Clone)]
    struct RacingGateway {
        checkout: CheckoutHandle,
    }

    #[tokio::test]
    async fn late_outcome_after_expiry_is_ignored() {
        let session = session();
        session.set_pending();
        let action: PaymentAction<RacingGateway> = Arc::new(|| -> PaymentEffect<RacingGateway> {
            from_fn(|env: &RacingGateway| {
                env.checkout.set_expired(Some("too late".to_string()));
                Ok(PaymentOutcome::Approved { message: None })
            })
            .boxed()
        });
        let env = RacingGateway {
            checkout: session.handle(),
        };

        let submission = session.submit(&action, &env).await;

        assert_eq!(submission, Submission::Submitted(CheckoutStatus::Expired));
        assert_eq!(session.message().as_deref(), Some("too late"));
        assert_eq!(
            session.history().last().map(|t| t.trigger),
            Some(Trigger::Command)
        );
    }

    #[tokio::test]
    async fn outcome_does_not_settle_a_newer_attempt() {
        let session = session();
        session.set_pending();
        let action: PaymentAction<RacingGateway> = Arc::new(|| -> PaymentEffect<RacingGateway> {
            from_fn(|env: &RacingGateway| {
                env.checkout.reset();
                env.checkout.begin();
                Ok(PaymentOutcome::Approved {
                    message: Some("first attempt".to_string()),
                })
            })
            .boxed()
        });
        let env = RacingGateway {
            checkout: session.handle(),
        };

        let submission = session.submit(&action, &env).await;

        assert_eq!(submission, Submission::Submitted(CheckoutStatus::Pending));
        assert_eq!(session.message(), None);
        assert!(session.timer_running());
    }

    #[tokio::test]
    async fn outcome_does_not_release_another_lock() {
        let session = session();
        session.set_pending();
        let action: PaymentAction<RacingGateway> = Arc::new(|| -> PaymentEffect<RacingGateway> {
            from_fn(|env: &RacingGateway| {
                env.checkout.set_pending();
                env.checkout.set_processing();
                Err(PaymentError::Timeout)
            })
            .boxed()
        });
        let env = RacingGateway {
            checkout: session.handle(),
        };

        let submission = session.submit(&action, &env).await;

        assert_eq!(submission, Submission::Submitted(CheckoutStatus::Processing));
        assert!(session.is_locked());
        assert_eq!(session.message(), None);
    }

    #[tokio::test]
    async fn finished_session_refuses_submission() {
        let session = session();
        session.set_failed(None);
        let action: PaymentAction<()> = Arc::new(|| -> PaymentEffect<()> {
            pure(PaymentOutcome::Approved { message: None }).boxed()
        });

        assert_eq!(session.submit(&action, &()).await, Submission::AlreadyLocked);
        assert_eq!(session.status(), CheckoutStatus::Failed);
    }
}
