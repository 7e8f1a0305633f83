//! Cooperative cancellation shared between the pipeline and its plugins.
//!
//! A [`Cancellation`] is cheap to clone. Cancelling it wakes every waiter
//! and every child derived from it; cancelling a child leaves the parent
//! untouched.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::watch;

/// Shared shutdown signal.
#[derive(Debug, Clone)]
pub struct Cancellation {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    tx: watch::Sender<bool>,
    parent: Option<Cancellation>,
}

impl Cancellation {
    /// Create a new, uncancelled signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner { tx, parent: None }),
        }
    }

    /// Derive a signal that is cancelled when either it or `self` is.
    pub fn child(&self) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                tx,
                parent: Some(self.clone()),
            }),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.tx.send_replace(true);
    }

    /// Whether this signal or any ancestor has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.inner.tx.borrow()
            || self
                .inner
                .parent
                .as_ref()
                .is_some_and(Cancellation::is_cancelled)
    }

    /// Resolves once this signal or any ancestor is cancelled.
    pub fn cancelled(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let mut rx = self.inner.tx.subscribe();
            let own = async move {
                let _ = rx.wait_for(|cancelled| *cancelled).await;
            };

            match &self.inner.parent {
                Some(parent) => {
                    tokio::select! {
                        _ = own => {}
                        _ = parent.cancelled() => {}
                    }
                }
                None => own.await,
            }
        })
    }

    /// Drive `fut` to completion unless cancellation comes first.
    ///
    /// Returns `None` if cancelled. Cancellation is checked before the
    /// future is polled, so an already-cancelled signal never runs `fut`.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}
