//! Core notification data model.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::warn;

/// A notification held by the daemon.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Daemon-assigned id, unique among active notifications and never
    /// reused within the process lifetime.
    pub id: u32,
    /// The sending application's label (may be empty).
    pub app_name: String,
    /// Icon path or themed icon name, passed through to the renderer.
    pub icon: String,
    /// Short summary line (required nonempty).
    pub summary: String,
    /// Longer body text.
    pub body: Option<String>,
    /// Ordered action buttons.
    pub actions: Vec<Action>,
    pub urgency: Urgency,
    /// Monotonic creation time.
    pub created: Instant,
    /// Monotonic expiry deadline; `None` never expires.
    pub expires_at: Option<Instant>,
    /// Wall-clock time the notification was received, for display.
    pub time: DateTime<Local>,
    /// Unique bus name of the peer that sent the Notify call. Target of
    /// the closed/action-invoked signals.
    pub requester: Option<String>,
}

/// Urgency level as defined by the freedesktop notification spec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Critical,
}

impl Urgency {
    /// Map the `urgency` hint byte. Unknown levels fall back to Normal.
    pub fn from_hint(level: Option<u8>) -> Self {
        match level {
            None | Some(1) => Urgency::Normal,
            Some(0) => Urgency::Low,
            Some(2) => Urgency::Critical,
            Some(level) => {
                warn!("unexpected urgency level {level}, treating as normal");
                Urgency::Normal
            }
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Normal => write!(f, "normal"),
            Urgency::Critical => write!(f, "critical"),
        }
    }
}

/// Why a notification left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The expiry timer fired.
    Expired,
    /// The user dismissed it through the renderer.
    DismissedByUser,
    /// A client called CloseNotification.
    ClosedByRequest,
    Undefined,
}

impl CloseReason {
    /// Wire code carried in the NotificationClosed signal.
    pub fn code(self) -> u32 {
        match self {
            CloseReason::Expired => 1,
            CloseReason::DismissedByUser => 2,
            CloseReason::ClosedByRequest => 3,
            CloseReason::Undefined => 4,
        }
    }
}

/// An actionable button attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Stable identifier sent back in the ActionInvoked signal.
    pub key: String,
    /// Human-readable label shown by the renderer.
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_from_hint() {
        assert_eq!(Urgency::from_hint(None), Urgency::Normal);
        assert_eq!(Urgency::from_hint(Some(0)), Urgency::Low);
        assert_eq!(Urgency::from_hint(Some(1)), Urgency::Normal);
        assert_eq!(Urgency::from_hint(Some(2)), Urgency::Critical);
        // unknown levels degrade to normal rather than failing the request
        assert_eq!(Urgency::from_hint(Some(7)), Urgency::Normal);
    }

    #[test]
    fn test_close_reason_codes() {
        assert_eq!(CloseReason::Expired.code(), 1);
        assert_eq!(CloseReason::DismissedByUser.code(), 2);
        assert_eq!(CloseReason::ClosedByRequest.code(), 3);
        assert_eq!(CloseReason::Undefined.code(), 4);
    }

    #[test]
    fn test_urgency_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Urgency::Critical).unwrap(), "\"critical\"");
        assert_eq!(serde_json::to_string(&Urgency::Low).unwrap(), "\"low\"");
    }
}
