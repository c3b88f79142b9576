//! Disposable subtree subscriptions.

use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use futures::Stream;
use serde_json::Value;
use tokio::sync::mpsc;

type Disposer = Box<dyn FnOnce() + Send + 'static>;

/// Live listener on one store subtree.
///
/// Yields the full subtree value on every change (never a diff). The
/// store-side listener is removed on `unsubscribe()` or when the
/// subscription is dropped, whichever comes first.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Value>,
    disposer: Option<Disposer>,
}

impl Subscription {
    /// Wrap a value receiver and the store-side disposer.
    #[must_use]
    pub fn new(
        rx: mpsc::UnboundedReceiver<Value>,
        disposer: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            rx,
            disposer: Some(Box::new(disposer)),
        }
    }

    /// Wait for the next subtree value. `None` once the store goes away.
    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }

    /// Take a value if one is already queued.
    pub fn try_recv(&mut self) -> Option<Value> {
        self.rx.try_recv().ok()
    }

    /// Remove the store-side listener now.
    pub fn unsubscribe(mut self) {
        self.dispose();
    }

    fn dispose(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Stream for Subscription {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Value>> {
        self.rx.poll_recv(cx)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.disposer.is_some())
            .finish_non_exhaustive()
    }
}
