//! D-Bus interfaces for the notification daemon.
//!
//! Bus name: `org.freedesktop.Notifications` (session bus)
//! - `org.freedesktop.Notifications` at `/org/freedesktop/Notifications`:
//!   the standard client-facing protocol.
//! - `org.notifyd.Renderer1` at `/org/notifyd/Renderer1`: the entry points
//!   the external renderer uses to report user interaction (dismiss clicks
//!   and action-button presses).
//!
//! Signals (`NotificationClosed`, `ActionInvoked`) are not broadcast from
//! here; the daemon emits them addressed to the recorded requester, see
//! `crate::daemon`.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zbus::interface;
use zbus::message::Header;
use zbus::zvariant::{DeserializeDict, SerializeDict, Type};

use crate::daemon::{Notifier, NotifyRequest};
use crate::icon;
use crate::notification::{Action, CloseReason, Urgency};

pub const BUS_NAME: &str = "org.freedesktop.Notifications";
pub const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";
pub const NOTIFICATIONS_IFACE: &str = "org.freedesktop.Notifications";
pub const RENDERER_PATH: &str = "/org/notifyd/Renderer1";
pub const RENDERER_IFACE: &str = "org.notifyd.Renderer1";

/// Optional features advertised to clients.
pub const CAPABILITIES: &[&str] = &["actions", "body", "body-markup", "icon-static"];

/// Standard client-facing interface.
pub struct NotificationsInterface {
    notifier: Notifier,
}

impl NotificationsInterface {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

#[interface(name = "org.freedesktop.Notifications")]
impl NotificationsInterface {
    async fn get_capabilities(&self) -> Vec<String> {
        info!("GetCapabilities called");
        CAPABILITIES.iter().map(|s| s.to_string()).collect()
    }

    async fn get_server_information(&self) -> (String, String, String, String) {
        info!("GetServerInformation called");
        (
            "notifyd".into(),
            "notifyd".into(),
            env!("CARGO_PKG_VERSION").into(),
            "1.2".into(),
        )
    }

    /// Create or replace a notification. Returns the assigned id.
    #[allow(clippy::too_many_arguments)]
    async fn notify(
        &self,
        #[zbus(header)] header: Header<'_>,
        app_name: String,
        replaces_id: u32,
        app_icon: String,
        summary: String,
        body: String,
        actions: Vec<String>,
        hints: Hints,
        expire_timeout: i32,
    ) -> zbus::fdo::Result<u32> {
        info!("Notify called by {app_name:?} (replaces_id={replaces_id})");
        debug!(
            "Notify parameters: app_icon={app_icon:?}, summary={summary:?}, body={body:?}, \
             actions={actions:?}, hints={hints:?}, expire_timeout={expire_timeout}"
        );

        if summary.is_empty() {
            return Err(zbus::fdo::Error::InvalidArgs(
                "summary must not be empty".into(),
            ));
        }

        let requester = header.sender().map(|name| name.to_string());
        let icon = icon::resolve(&app_icon, &hints);
        let body = if body.is_empty() { None } else { Some(body) };

        let request = NotifyRequest {
            app_name,
            replaces_id,
            icon,
            summary,
            body,
            actions: normalize_actions(actions),
            urgency: Urgency::from_hint(hints.urgency),
            expire_timeout,
            requester,
        };

        self.notifier
            .notify(request)
            .await
            .map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }

    /// Close a notification. Succeeds whether or not the id is still
    /// active; closing something that already went away is the normal case,
    /// not an error.
    async fn close_notification(&self, id: u32) {
        info!("CloseNotification called for {id}");
        self.notifier.close(id, CloseReason::ClosedByRequest).await;
    }
}

/// Renderer-facing interface: bridges user interaction back into the store.
pub struct RendererInterface {
    notifier: Notifier,
}

impl RendererInterface {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

#[interface(name = "org.notifyd.Renderer1")]
impl RendererInterface {
    /// Close a notification on behalf of the user.
    async fn dismiss(&self, id: u32) {
        info!("Dismiss called for {id}");
        if !self.notifier.close(id, CloseReason::DismissedByUser).await {
            debug!("dismiss for inactive id {id}, ignoring");
        }
    }

    /// Report that the user pressed an action button. If the notification
    /// already expired this is a silent no-op — the expected race between
    /// daemon-side expiry and the user's click.
    async fn invoke_action(&self, id: u32, action_key: String) {
        info!("InvokeAction called for {id} ({action_key})");
        self.notifier.invoke_action(id, &action_key).await;
    }
}

/// Pair up the protocol's flat `[key, label, key, label, ...]` action list.
///
/// An odd-length list is normalized rather than rejected: the trailing key
/// gets an empty label.
pub fn normalize_actions(raw: Vec<String>) -> Vec<Action> {
    if raw.len() % 2 != 0 {
        warn!(
            "odd-length action list ({} entries), padding trailing label",
            raw.len()
        );
    }
    let mut actions = Vec::with_capacity(raw.len().div_ceil(2));
    let mut raw = raw.into_iter();
    while let Some(key) = raw.next() {
        let label = raw.next().unwrap_or_default();
        actions.push(Action { key, label });
    }
    actions
}

/// The standard `hints` dictionary, decoded into the fields the daemon
/// understands. Unknown keys are ignored by the dict deserializer.
#[derive(Default, DeserializeDict, SerializeDict, Type)]
#[zvariant(signature = "dict", rename_all = "kebab-case")]
pub struct Hints {
    pub urgency: Option<u8>,
    pub category: Option<String>,
    pub desktop_entry: Option<String>,
    pub image_data: Option<ImageData>,
    #[zvariant(rename = "image_data")]
    pub image_data_deprecated: Option<ImageData>,
    pub image_path: Option<PathBuf>,
    #[zvariant(rename = "image_path")]
    pub image_path_deprecated: Option<String>,
    #[zvariant(rename = "icon_data")]
    pub icon_data: Option<ImageData>,
    pub transient: Option<bool>,
}

impl fmt::Debug for Hints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hints")
            .field("urgency", &self.urgency)
            .field("category", &self.category)
            .field("desktop_entry", &self.desktop_entry)
            .field("image_data", &self.image_data)
            .field("image_path", &self.image_path)
            .field("icon_data", &self.icon_data)
            .field("transient", &self.transient)
            .finish_non_exhaustive()
    }
}

/// Raw image pixels as carried in `image-data`/`icon_data` hints.
#[derive(Deserialize, Serialize, Type)]
#[zvariant(signature = "(iiibiiay)")]
pub struct ImageData {
    pub width: i32,
    pub height: i32,
    pub rowstride: i32,
    pub has_alpha: bool,
    pub bits_per_sample: i32,
    pub channels: i32,
    pub data: Vec<u8>,
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_alpha", &self.has_alpha)
            .field("data", &format_args!("[{} bytes]", self.data.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_even_action_list() {
        let actions = normalize_actions(strings(&["reply", "Reply", "dismiss", "Dismiss"]));
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].key, "reply");
        assert_eq!(actions[0].label, "Reply");
        assert_eq!(actions[1].key, "dismiss");
        assert_eq!(actions[1].label, "Dismiss");
    }

    #[test]
    fn test_normalize_odd_action_list_pads_label() {
        let actions = normalize_actions(strings(&["reply", "Reply", "orphan"]));
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1].key, "orphan");
        assert_eq!(actions[1].label, "");
    }

    #[test]
    fn test_normalize_empty_action_list() {
        assert!(normalize_actions(Vec::new()).is_empty());
    }
}
