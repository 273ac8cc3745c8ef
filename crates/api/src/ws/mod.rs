//! Refresh channel exposed to browsers over WebSocket.
//!
//! Each connection is one browser context on the server's [`RefreshHub`].
//! Clients receive a `portfolio_updated` frame whenever they should
//! re-fetch the catalog, and may announce their own changes or a regained
//! focus.
//!
//! [`RefreshHub`]: creativestalk_events::RefreshHub

mod handler;
pub mod message;

pub use handler::ws_handler;
pub use message::{ClientFrame, ServerFrame};
