//! Per-context publish/subscribe over a [`RefreshHub`].
//!
//! A listener wakes on three things:
//!
//! 1. an envelope published by a *different* context on the shared hub,
//! 2. an in-process `Updated` event from its own context's [`publish`],
//! 3. its own context regaining foreground focus.
//!
//! A context never receives its own hub envelope; same-context listeners get
//! the in-process event instead, so one publish wakes each listener once.
//!
//! [`publish`]: RefreshContext::publish

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::hub::{ContextId, RefreshEnvelope, RefreshHub};

/// Capacity of each context's in-process channel.
const LOCAL_CAPACITY: usize = 64;

/// Why a listener was woken. Consumers always re-fetch from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSignal {
    /// Another context changed the catalog.
    CrossContext {
        origin: ContextId,
        at: DateTime<Utc>,
    },
    /// This context changed the catalog.
    Updated,
    /// This context came back to the foreground.
    FocusRegained,
    /// The listener fell behind and skipped `skipped` signals.
    Missed { skipped: u64 },
}

#[derive(Debug, Clone, Copy)]
enum LocalEvent {
    Updated,
    FocusRegained,
}

// ---------------------------------------------------------------------------
// RefreshContext
// ---------------------------------------------------------------------------

/// One browser context attached to a hub.
pub struct RefreshContext {
    id: ContextId,
    hub: Arc<RefreshHub>,
    local: broadcast::Sender<LocalEvent>,
}

impl RefreshContext {
    pub(crate) fn new(hub: Arc<RefreshHub>) -> Self {
        let (local, _) = broadcast::channel(LOCAL_CAPACITY);
        Self {
            id: uuid::Uuid::new_v4(),
            hub,
            local,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Announce that the catalog changed.
    pub fn publish(&self) {
        tracing::debug!(context_id = %self.id, "Publishing catalog refresh");
        let _ = self.local.send(LocalEvent::Updated);
        self.hub.broadcast(RefreshEnvelope::new(self.id));
    }

    /// Report that this context regained foreground focus.
    pub fn notify_focus(&self) {
        let _ = self.local.send(LocalEvent::FocusRegained);
    }

    /// Attach a pull-style listener.
    pub fn listen(&self) -> RefreshListener {
        RefreshListener {
            origin: self.id,
            shared: Some(self.hub.receiver()),
            local: Some(self.local.subscribe()),
        }
    }

    /// Run `callback` on every signal until the returned [`Subscription`]
    /// is dropped or cancelled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(RefreshSignal) + Send + 'static,
    {
        let mut listener = self.listen();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let context_id = self.id;

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    signal = listener.recv() => match signal {
                        Some(signal) => callback(signal),
                        None => break,
                    },
                }
            }
            tracing::debug!(context_id = %context_id, "Refresh subscription ended");
        });

        Subscription {
            cancel,
            handle: Some(handle),
        }
    }
}

// ---------------------------------------------------------------------------
// RefreshListener
// ---------------------------------------------------------------------------

/// Pull-style receiver of [`RefreshSignal`]s for one context.
pub struct RefreshListener {
    origin: ContextId,
    shared: Option<broadcast::Receiver<RefreshEnvelope>>,
    local: Option<broadcast::Receiver<LocalEvent>>,
}

impl RefreshListener {
    /// Wait for the next signal.
    ///
    /// Returns `None` once both the hub and the owning context are gone.
    pub async fn recv(&mut self) -> Option<RefreshSignal> {
        loop {
            let event = match (self.shared.as_mut(), self.local.as_mut()) {
                (None, None) => return None,
                (Some(shared), None) => Either::Shared(shared.recv().await),
                (None, Some(local)) => Either::Local(local.recv().await),
                (Some(shared), Some(local)) => tokio::select! {
                    r = shared.recv() => Either::Shared(r),
                    r = local.recv() => Either::Local(r),
                },
            };

            match event {
                Either::Shared(Ok(envelope)) if envelope.origin == self.origin => continue,
                Either::Shared(Ok(envelope)) => {
                    return Some(RefreshSignal::CrossContext {
                        origin: envelope.origin,
                        at: envelope.timestamp,
                    })
                }
                Either::Local(Ok(LocalEvent::Updated)) => return Some(RefreshSignal::Updated),
                Either::Local(Ok(LocalEvent::FocusRegained)) => {
                    return Some(RefreshSignal::FocusRegained)
                }
                Either::Shared(Err(RecvError::Lagged(skipped)))
                | Either::Local(Err(RecvError::Lagged(skipped))) => {
                    tracing::warn!(context_id = %self.origin, skipped, "Refresh listener lagged");
                    return Some(RefreshSignal::Missed { skipped });
                }
                Either::Shared(Err(RecvError::Closed)) => self.shared = None,
                Either::Local(Err(RecvError::Closed)) => self.local = None,
            }
        }
    }
}

enum Either<A, B> {
    Shared(A),
    Local(B),
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Handle to a running callback. Dropping it stops the callback; signals
/// that arrive afterwards are ignored.
pub struct Subscription {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the callback and wait for the listener task to exit.
    pub async fn cancel(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
