//! Cross-client refresh signalling.
//!
//! One mutation in one context (an admin tab, the upload form, the server
//! itself) tells every other context "the catalog changed, re-fetch":
//!
//! - [`RefreshHub`]: the shared same-origin channel, backed by
//!   `tokio::sync::broadcast`.
//! - [`RefreshContext`]: one per browser context; publishes, notifies focus
//!   regain, and hands out listeners and subscriptions.
//! - [`Subscription`]: a running callback that stops when dropped.
//!
//! Signals carry no payload beyond "something changed". Delivery is
//! at-least-once, eventually: a lagging listener sees one
//! [`RefreshSignal::Missed`] in place of everything it skipped.

pub mod context;
pub mod hub;

pub use context::{RefreshContext, RefreshListener, RefreshSignal, Subscription};
pub use hub::{ContextId, RefreshEnvelope, RefreshHub, REFRESH_CHANNEL};
