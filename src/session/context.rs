//! Scoped access to the current checkout session.
//!
//! Code running inside [`provide`] (or [`CheckoutSession::provide`]) reaches
//! the session through [`use_checkout`] instead of having a handle threaded
//! through every call. The scope is task-local, so two sessions served by
//! the same runtime never see each other.

use super::{CheckoutHandle, CheckoutSession};
use std::future::Future;
use thiserror::Error;

tokio::task_local! {
    static CHECKOUT: CheckoutHandle;
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("checkout context used outside of a checkout provider")]
    OutsideProvider,
}

/// Run `future` with `handle` as the current checkout session.
pub async fn provide<F: Future>(handle: CheckoutHandle, future: F) -> F::Output {
    CHECKOUT.scope(handle, future).await
}

/// Run `f` with `handle` as the current checkout session.
pub fn provide_sync<R>(handle: CheckoutHandle, f: impl FnOnce() -> R) -> R {
    CHECKOUT.sync_scope(handle, f)
}

pub fn try_use_checkout() -> Result<CheckoutHandle, ContextError> {
    CHECKOUT
        .try_with(CheckoutHandle::clone)
        .map_err(|_| ContextError::OutsideProvider)
}

/// The current checkout session.
///
/// # Panics
///
/// Panics when called outside a provider scope. That is a wiring bug, not
/// a runtime condition.
pub fn use_checkout() -> CheckoutHandle {
    match try_use_checkout() {
        Ok(handle) => handle,
        Err(error) => panic!("{error}"),
    }
}

/// Whether the current session should render its expiration banner.
pub fn use_can_show_expiration() -> bool {
    use_checkout().can_show_expiration()
}

impl CheckoutSession {
    /// Run `future` with this session as the current checkout session.
    pub async fn provide<F: Future>(&self, future: F) -> F::Output {
        provide(self.handle(), future).await
    }
}
