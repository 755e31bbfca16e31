//! Authoritative in-memory table of active notifications.

use std::collections::BTreeMap;

use crate::notification::Notification;

/// The u32 id space ran out. Ids are never reused, so this is fatal for the
/// daemon: further Notify calls must be refused rather than wrapping into a
/// collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("notification id space exhausted")]
pub struct IdSpaceExhausted;

/// Central notification store.
///
/// Ids are allocated monotonically starting at 1 and never reused. Snapshots
/// iterate the `BTreeMap` in ascending id order, which equals insertion
/// order; a replaced notification keeps its id and therefore its position.
///
/// The store is a plain data structure: the caller (the `Notifier` service)
/// serializes all mutations behind one lock and performs the timer,
/// signal, and publish side effects attached to each mutation.
pub struct NotificationStore {
    /// All active notifications by id.
    notifications: BTreeMap<u32, Notification>,
    /// Next id to allocate.
    next_id: u32,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            notifications: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new notification under a freshly allocated id. Returns the
    /// assigned id, stamped into the stored value.
    pub fn insert(&mut self, mut notification: Notification) -> Result<u32, IdSpaceExhausted> {
        // u32::MAX is reserved so next_id can never overflow.
        if self.next_id == u32::MAX {
            return Err(IdSpaceExhausted);
        }
        let id = self.next_id;
        self.next_id += 1;
        notification.id = id;
        self.notifications.insert(id, notification);
        Ok(id)
    }

    /// Overwrite the notification stored under `id`, preserving the id.
    /// Returns false (and drops the replacement) if `id` is not active.
    pub fn replace(&mut self, id: u32, mut notification: Notification) -> bool {
        match self.notifications.get_mut(&id) {
            Some(slot) => {
                notification.id = id;
                *slot = notification;
                true
            }
            None => false,
        }
    }

    /// Remove a notification by id.
    pub fn remove(&mut self, id: u32) -> Option<Notification> {
        self.notifications.remove(&id)
    }

    /// Read-only lookup.
    pub fn get(&self, id: u32) -> Option<&Notification> {
        self.notifications.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.notifications.contains_key(&id)
    }

    /// Cloned point-in-time view of all active notifications, ordered by
    /// ascending id (insertion order).
    pub fn snapshot(&self) -> Vec<Notification> {
        self.notifications.values().cloned().collect()
    }

    /// Number of active notifications.
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn set_next_id(&mut self, next_id: u32) {
        self.next_id = next_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{Action, Urgency};
    use chrono::Local;
    use tokio::time::Instant;

    fn make_notif(summary: &str) -> Notification {
        Notification {
            id: 0,
            app_name: "test".to_string(),
            icon: String::new(),
            summary: summary.to_string(),
            body: None,
            actions: Vec::new(),
            urgency: Urgency::Normal,
            created: Instant::now(),
            expires_at: None,
            time: Local::now(),
            requester: None,
        }
    }

    #[test]
    fn test_ids_are_sequential_and_never_reused() {
        let mut store = NotificationStore::new();
        let a = store.insert(make_notif("a")).unwrap();
        let b = store.insert(make_notif("b")).unwrap();
        assert_eq!((a, b), (1, 2));

        store.remove(a);
        let c = store.insert(make_notif("c")).unwrap();
        assert_eq!(c, 3);
        assert!(!store.contains(a));
    }

    #[test]
    fn test_replace_preserves_id_and_overwrites_content() {
        let mut store = NotificationStore::new();
        let id = store.insert(make_notif("before")).unwrap();

        let mut replacement = make_notif("after");
        replacement.actions = vec![Action {
            key: "reply".to_string(),
            label: "Reply".to_string(),
        }];
        assert!(store.replace(id, replacement));

        let stored = store.get(id).unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.summary, "after");
        assert_eq!(stored.actions.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_replace_missing_id_is_rejected() {
        let mut store = NotificationStore::new();
        assert!(!store.replace(42, make_notif("x")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_keeps_insertion_order_across_replacement() {
        let mut store = NotificationStore::new();
        let first = store.insert(make_notif("first")).unwrap();
        store.insert(make_notif("second")).unwrap();
        store.replace(first, make_notif("first-replaced"));

        let summaries: Vec<_> = store
            .snapshot()
            .iter()
            .map(|n| n.summary.clone())
            .collect();
        assert_eq!(summaries, ["first-replaced", "second"]);
    }

    #[test]
    fn test_id_space_exhaustion_is_an_error() {
        let mut store = NotificationStore::new();
        store.set_next_id(u32::MAX - 1);
        let id = store.insert(make_notif("last")).unwrap();
        assert_eq!(id, u32::MAX - 1);
        assert_eq!(store.insert(make_notif("one too many")), Err(IdSpaceExhausted));
        // the store itself is still readable after refusing
        assert_eq!(store.len(), 1);
    }
}
