//! notifyd — desktop notification daemon for file-driven renderers.
//!
//! Architecture:
//! - zbus server owns `org.freedesktop.Notifications` on the session bus
//!   and a renderer-facing interface for dismiss/action requests
//! - `Notifier` serializes every lifecycle mutation behind one store lock
//! - per-notification one-shot expiry timers, armed from urgency policy
//! - every committed change republishes an atomically-replaced JSON
//!   snapshot that an external renderer (Eww or similar) tails
//!
//! Timeout defaults live in `~/.config/notifyd/config.toml`.

pub mod config;
pub mod daemon;
pub mod dbus;
pub mod expiry;
pub mod icon;
pub mod notification;
pub mod publish;
pub mod store;

pub use daemon::{BusSignal, Notifier, NotifyRequest};
pub use notification::{Action, CloseReason, Notification, Urgency};
pub use publish::SnapshotEntry;
pub use store::NotificationStore;
