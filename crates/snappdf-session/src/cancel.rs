//! Batch cancellation.
//!
//! A [`CancelHandle`] flips a watch flag; [`CancelToken`] clones observe it.
//! Dropping the handle without cancelling leaves the tokens quiet forever.

use tokio::sync::watch;

/// Error message stored on a record interrupted by cancellation.
pub const CANCELLED_MESSAGE: &str = "operation cancelled";

/// Create a connected handle/token pair for one batch.
pub fn cancellation() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the batch is cancelled. Never resolves if the handle
    /// was dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Token that can never fire, for runs without a caller-held handle.
pub(crate) fn never() -> CancelToken {
    let (handle, token) = cancellation();
    drop(handle);
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_flips_token() {
        let (handle, token) = cancellation();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());

        let mut waiting = token.clone();
        // Already cancelled: resolves immediately.
        waiting.cancelled().await;
    }

    #[test]
    fn test_never_token_stays_quiet() {
        let token = never();
        assert!(!token.is_cancelled());
    }
}
