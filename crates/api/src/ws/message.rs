//! Wire frames of the refresh channel.

use chrono::{DateTime, Utc};
use creativestalk_events::RefreshSignal;
use serde::{Deserialize, Serialize};

/// Frames sent to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Something changed; re-fetch the catalog.
    PortfolioUpdated { timestamp: DateTime<Utc> },
}

impl ServerFrame {
    pub fn from_signal(signal: &RefreshSignal) -> Self {
        let timestamp = match signal {
            RefreshSignal::CrossContext { at, .. } => *at,
            _ => Utc::now(),
        };
        Self::PortfolioUpdated { timestamp }
    }
}

/// Frames accepted from the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// This tab changed the catalog.
    Publish,
    /// This tab regained focus.
    Focus,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn cross_context_frame_keeps_origin_time() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let frame = ServerFrame::from_signal(&RefreshSignal::CrossContext {
            origin: uuid::Uuid::nil(),
            at,
        });
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "portfolio_updated");
        assert_eq!(json["timestamp"], "2025-01-02T03:04:05Z");
    }

    #[test]
    fn client_frames_parse() {
        let publish: ClientFrame = serde_json::from_str(r#"{"type":"publish"}"#).unwrap();
        assert_eq!(publish, ClientFrame::Publish);
        let focus: ClientFrame = serde_json::from_str(r#"{"type":"focus"}"#).unwrap();
        assert_eq!(focus, ClientFrame::Focus);
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"reload"}"#).is_err());
    }
}
