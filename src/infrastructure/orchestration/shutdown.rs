//! Cooperative cancellation on a `watch` shutdown flag.

use std::future::Future;

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Resolve once the shutdown flag is set.
///
/// Never resolves if the sender is dropped without signalling.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Whether shutdown has already been requested.
#[must_use]
pub fn is_shutdown(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}

/// Drive `work` to completion unless shutdown is requested first.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if the shutdown flag wins; `work` is dropped,
/// aborting whatever it had in flight.
pub async fn cancellable<F, T>(shutdown: &mut watch::Receiver<bool>, work: F) -> Result<T>
where
    F: Future<Output = T>,
{
    if is_shutdown(shutdown) {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        value = work => Ok(value),
        () = wait_for_shutdown(shutdown) => Err(Error::Cancelled),
    }
}
