//! Snapshot publishing — serializes the active notification set to a JSON
//! file the renderer tails.
//!
//! The `Notifier` pushes every committed state change into a watch channel;
//! the publisher task writes whatever is latest when it wakes up, so bursts
//! of mutations coalesce into one write. Readers only ever observe a
//! complete document: the file is replaced atomically, never appended.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::notification::{Notification, Urgency};

/// One notification as it appears in the published JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub id: u32,
    pub urgency: Urgency,
    pub icon: String,
    /// Application display name.
    pub name: String,
    /// RFC 3339 local timestamp; relative formatting is the renderer's job.
    pub time: String,
    pub summary: String,
    /// Empty string when the notification has no body.
    pub body: String,
    /// Ordered `[key, label]` pairs.
    pub actions: Vec<(String, String)>,
}

impl SnapshotEntry {
    pub fn from_notification(n: &Notification) -> Self {
        Self {
            id: n.id,
            urgency: n.urgency,
            icon: n.icon.clone(),
            name: n.app_name.clone(),
            time: n.time.to_rfc3339(),
            summary: n.summary.clone(),
            body: n.body.clone().unwrap_or_default(),
            actions: n
                .actions
                .iter()
                .map(|a| (a.key.clone(), a.label.clone()))
                .collect(),
        }
    }
}

/// Convert a store snapshot into publishable entries, preserving order.
pub fn snapshot_entries(notifications: &[Notification]) -> Vec<SnapshotEntry> {
    notifications.iter().map(SnapshotEntry::from_notification).collect()
}

/// Write the snapshot to `path` atomically: serialize, write to a temp file
/// in the same directory, then rename over the target.
pub fn write_snapshot(path: &Path, entries: &[SnapshotEntry]) -> Result<(), String> {
    let json = serde_json::to_vec(entries).map_err(|e| format!("serialize snapshot: {e}"))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| format!("create {}: {e}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| format!("create temp file in {}: {e}", dir.display()))?;
    tmp.write_all(&json)
        .map_err(|e| format!("write snapshot: {e}"))?;
    tmp.persist(path)
        .map_err(|e| format!("replace {}: {e}", path.display()))?;

    Ok(())
}

/// Publisher task: write the current snapshot, then rewrite on every change.
///
/// The first iteration publishes the initial (empty) state so the renderer
/// has a well-formed file to tail from daemon startup. A failed write is
/// logged and implicitly retried on the next state change; it never blocks
/// the protocol side.
pub async fn run_publisher(path: PathBuf, mut rx: watch::Receiver<Vec<SnapshotEntry>>) {
    loop {
        let entries = rx.borrow_and_update().clone();
        if let Err(e) = write_snapshot(&path, &entries) {
            warn!("state publish failed: {e}");
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
    debug!("publisher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Action;
    use chrono::Local;
    use tokio::time::Instant;

    fn make_notif(id: u32, summary: &str) -> Notification {
        Notification {
            id,
            app_name: "mail".to_string(),
            icon: "mail-unread".to_string(),
            summary: summary.to_string(),
            body: Some("From: Bob".to_string()),
            actions: vec![
                Action {
                    key: "reply".to_string(),
                    label: "Reply".to_string(),
                },
                Action {
                    key: "dismiss".to_string(),
                    label: "Dismiss".to_string(),
                },
            ],
            urgency: Urgency::Normal,
            created: Instant::now(),
            expires_at: None,
            time: Local::now(),
            requester: Some(":1.7".to_string()),
        }
    }

    #[test]
    fn test_entry_fields() {
        let entry = SnapshotEntry::from_notification(&make_notif(3, "New message"));
        assert_eq!(entry.id, 3);
        assert_eq!(entry.name, "mail");
        assert_eq!(entry.summary, "New message");
        assert_eq!(entry.body, "From: Bob");
        assert_eq!(
            entry.actions,
            vec![
                ("reply".to_string(), "Reply".to_string()),
                ("dismiss".to_string(), "Dismiss".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_body_publishes_empty_string() {
        let mut n = make_notif(1, "quiet");
        n.body = None;
        assert_eq!(SnapshotEntry::from_notification(&n).body, "");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let entries = snapshot_entries(&[make_notif(1, "hello")]);
        let value: serde_json::Value = serde_json::to_value(&entries).unwrap();

        let entry = &value.as_array().unwrap()[0];
        assert_eq!(entry["id"], 1);
        assert_eq!(entry["urgency"], "normal");
        assert_eq!(entry["actions"][0][0], "reply");
        assert_eq!(entry["actions"][0][1], "Reply");
        assert!(entry["time"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_write_snapshot_round_trip_and_replace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notifications.json");

        let first = snapshot_entries(&[make_notif(1, "one"), make_notif(2, "two")]);
        write_snapshot(&path, &first).unwrap();
        let read: Vec<SnapshotEntry> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, first);

        // a second publish fully replaces the document
        let second = snapshot_entries(&[make_notif(3, "three")]);
        write_snapshot(&path, &second).unwrap();
        let read: Vec<SnapshotEntry> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, second);
    }

    #[test]
    fn test_write_snapshot_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        write_snapshot(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
