//! Shared refresh channel backed by a `tokio::sync::broadcast` channel.
//!
//! [`RefreshHub`] is the same-origin broadcast primitive every
//! [`RefreshContext`](crate::RefreshContext) publishes into. It is designed
//! to be shared via `Arc<RefreshHub>` across the application.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::context::RefreshContext;

/// Fixed name of the portfolio refresh channel.
pub const REFRESH_CHANNEL: &str = "portfolio-refresh";

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Identifies one browser context (tab, window, server-side publisher).
pub type ContextId = uuid::Uuid;

// ---------------------------------------------------------------------------
// RefreshEnvelope
// ---------------------------------------------------------------------------

/// What travels on the shared channel: who published, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshEnvelope {
    pub origin: ContextId,
    pub timestamp: DateTime<Utc>,
}

impl RefreshEnvelope {
    pub fn new(origin: ContextId) -> Self {
        Self {
            origin,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// RefreshHub
// ---------------------------------------------------------------------------

/// Fan-out hub for refresh envelopes.
///
/// # Usage
///
/// ```rust
/// use std::sync::Arc;
/// use creativestalk_events::RefreshHub;
///
/// let hub = Arc::new(RefreshHub::default());
/// let admin_tab = hub.context();
/// admin_tab.publish();
/// ```
pub struct RefreshHub {
    name: String,
    sender: broadcast::Sender<RefreshEnvelope>,
}

impl RefreshHub {
    /// Create a hub with a specific channel capacity.
    ///
    /// When the buffer is full the oldest envelopes are dropped and slow
    /// listeners observe a lag, which they report as a single missed signal.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            name: REFRESH_CHANNEL.to_string(),
            sender,
        }
    }

    pub fn channel_name(&self) -> &str {
        &self.name
    }

    /// Open a new browser context on this hub.
    pub fn context(self: &Arc<Self>) -> RefreshContext {
        RefreshContext::new(Arc::clone(self))
    }

    /// Number of listeners currently attached across all contexts.
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub(crate) fn broadcast(&self, envelope: RefreshEnvelope) {
        // A send error only means there are no listeners right now.
        let _ = self.sender.send(envelope);
    }

    pub(crate) fn receiver(&self) -> broadcast::Receiver<RefreshEnvelope> {
        self.sender.subscribe()
    }
}

impl Default for RefreshHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
