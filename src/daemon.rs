//! Notification daemon — lifecycle service + D-Bus server + publisher.
//!
//! All lifecycle mutations (notify, close, expire) go through [`Notifier`],
//! which serializes them behind one store lock. Work that can block — bus
//! signal round-trips and the snapshot file write — happens on dedicated
//! tasks fed by channels, so the lock is never held across a blocking
//! operation and per-id event order equals commit order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dbus::{
    NotificationsInterface, RendererInterface, BUS_NAME, NOTIFICATIONS_IFACE, NOTIFICATIONS_PATH,
    RENDERER_PATH,
};
use crate::expiry::{Expiry, ExpiryScheduler, TimeoutPolicy};
use crate::notification::{Action, CloseReason, Notification, Urgency};
use crate::publish::{self, SnapshotEntry};
use crate::store::NotificationStore;

/// A validated create/replace request, as produced by the protocol layer.
#[derive(Debug, Clone)]
pub struct NotifyRequest {
    pub app_name: String,
    /// Nonzero to overwrite an existing notification in place.
    pub replaces_id: u32,
    pub icon: String,
    pub summary: String,
    pub body: Option<String>,
    pub actions: Vec<Action>,
    pub urgency: Urgency,
    /// Raw protocol timeout: ms, 0 = never, negative = urgency default.
    pub expire_timeout: i32,
    /// Unique bus name of the sender, if known.
    pub requester: Option<String>,
}

/// Outbound signal, addressed to the notification's original requester
/// (broadcast when the requester is unknown).
#[derive(Debug, Clone, PartialEq)]
pub enum BusSignal {
    Closed {
        id: u32,
        reason: CloseReason,
        requester: Option<String>,
    },
    ActionInvoked {
        id: u32,
        action_key: String,
        requester: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The id space ran out; the daemon refuses all further Notify calls.
    #[error("notification id space exhausted, daemon requires restart")]
    IdSpaceExhausted,
}

/// Receiving ends of the daemon plumbing, consumed by [`run`] (or by tests
/// driving the service directly).
pub struct DaemonChannels {
    pub expirations: mpsc::UnboundedReceiver<Expiry>,
    pub signals: mpsc::UnboundedReceiver<BusSignal>,
    pub snapshots: watch::Receiver<Vec<SnapshotEntry>>,
}

/// The notification lifecycle service shared by every interface and task.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    store: Mutex<NotificationStore>,
    scheduler: ExpiryScheduler,
    snapshots: watch::Sender<Vec<SnapshotEntry>>,
    signals: mpsc::UnboundedSender<BusSignal>,
    policy: TimeoutPolicy,
    /// Latched on id exhaustion; all further Notify calls are refused.
    exhausted: AtomicBool,
}

impl Notifier {
    pub fn new(policy: TimeoutPolicy) -> (Self, DaemonChannels) {
        let (scheduler, expirations) = ExpiryScheduler::new();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Vec::new());

        let notifier = Self {
            inner: Arc::new(NotifierInner {
                store: Mutex::new(NotificationStore::new()),
                scheduler,
                snapshots: snapshot_tx,
                signals: signal_tx,
                policy,
                exhausted: AtomicBool::new(false),
            }),
        };
        let channels = DaemonChannels {
            expirations,
            signals: signal_rx,
            snapshots: snapshot_rx,
        };
        (notifier, channels)
    }

    /// Create or replace a notification. Returns the assigned id and
    /// (re)arms its expiry timer.
    pub async fn notify(&self, request: NotifyRequest) -> Result<u32, NotifyError> {
        if self.inner.exhausted.load(Ordering::SeqCst) {
            return Err(NotifyError::IdSpaceExhausted);
        }

        let now = Instant::now();
        let ttl = self.inner.policy.resolve(request.urgency, request.expire_timeout);
        let expires_at = ttl.map(|ttl| now + ttl);

        let notification = Notification {
            id: 0,
            app_name: request.app_name,
            icon: request.icon,
            summary: request.summary,
            body: request.body,
            actions: request.actions,
            urgency: request.urgency,
            created: now,
            expires_at,
            time: chrono::Local::now(),
            requester: request.requester,
        };

        let mut store = self.inner.store.lock().await;
        let id = if request.replaces_id != 0 && store.contains(request.replaces_id) {
            store.replace(request.replaces_id, notification);
            debug!("replaced notification {}", request.replaces_id);
            request.replaces_id
        } else {
            match store.insert(notification) {
                Ok(id) => id,
                Err(e) => {
                    self.inner.exhausted.store(true, Ordering::SeqCst);
                    error!("{e}; refusing all further notifications");
                    return Err(NotifyError::IdSpaceExhausted);
                }
            }
        };

        match expires_at {
            Some(deadline) => self.inner.scheduler.arm(id, deadline).await,
            None => self.inner.scheduler.cancel(id).await,
        }
        self.publish_locked(&store);
        Ok(id)
    }

    /// Remove a notification, cancel its timer, and emit the closed signal.
    /// Returns false (emitting nothing) if the id was not active.
    pub async fn close(&self, id: u32, reason: CloseReason) -> bool {
        let mut store = self.inner.store.lock().await;
        let Some(notification) = store.remove(id) else {
            return false;
        };
        self.inner.scheduler.cancel(id).await;
        let _ = self.inner.signals.send(BusSignal::Closed {
            id,
            reason,
            requester: notification.requester,
        });
        self.publish_locked(&store);
        info!("notification {id} closed ({reason:?})");
        true
    }

    /// Apply a fired expiry timer. A timer is stale — and a no-op — if the
    /// id is gone (already closed) or the stored deadline no longer matches
    /// (the notification was replaced after the timer was armed).
    pub async fn expire(&self, id: u32, deadline: Instant) {
        let mut store = self.inner.store.lock().await;
        match store.get(id) {
            Some(n) if n.expires_at == Some(deadline) => {}
            Some(_) => {
                debug!("stale expiry for replaced notification {id}, ignoring");
                return;
            }
            None => {
                debug!("expiry for inactive id {id}, ignoring");
                return;
            }
        }
        let Some(notification) = store.remove(id) else {
            return;
        };
        self.inner.scheduler.cancel(id).await;
        let _ = self.inner.signals.send(BusSignal::Closed {
            id,
            reason: CloseReason::Expired,
            requester: notification.requester,
        });
        self.publish_locked(&store);
        info!("notification {id} expired");
    }

    /// Route a renderer action press back to the requesting client. Returns
    /// false (emitting nothing) if the id is no longer active.
    pub async fn invoke_action(&self, id: u32, action_key: &str) -> bool {
        let store = self.inner.store.lock().await;
        match store.get(id) {
            Some(notification) => {
                let _ = self.inner.signals.send(BusSignal::ActionInvoked {
                    id,
                    action_key: action_key.to_string(),
                    requester: notification.requester.clone(),
                });
                true
            }
            None => {
                debug!("action {action_key:?} for inactive id {id}, ignoring");
                false
            }
        }
    }

    /// Cloned point-in-time view of the active set.
    pub async fn snapshot(&self) -> Vec<Notification> {
        self.inner.store.lock().await.snapshot()
    }

    /// Read-only lookup of a single notification.
    pub async fn get(&self, id: u32) -> Option<Notification> {
        self.inner.store.lock().await.get(id).cloned()
    }

    /// Push the current snapshot to the publisher. Called with the store
    /// lock held so publishes observe mutations in commit order; the
    /// file write itself happens on the publisher task.
    fn publish_locked(&self, store: &NotificationStore) {
        self.inner
            .snapshots
            .send_replace(publish::snapshot_entries(&store.snapshot()));
    }
}

/// Expiry consumer: applies fired timers to the store.
pub async fn drive_expirations(notifier: Notifier, mut expirations: mpsc::UnboundedReceiver<Expiry>) {
    while let Some(expiry) = expirations.recv().await {
        notifier.expire(expiry.id, expiry.deadline).await;
    }
}

/// Signal emitter: drains the signal channel onto the bus, addressing each
/// signal to the notification's requester.
async fn emit_signals(conn: zbus::Connection, mut signals: mpsc::UnboundedReceiver<BusSignal>) {
    while let Some(signal) = signals.recv().await {
        if let Err(e) = emit_signal(&conn, &signal).await {
            warn!("failed to emit {signal:?}: {e}");
        }
    }
}

async fn emit_signal(conn: &zbus::Connection, signal: &BusSignal) -> zbus::Result<()> {
    match signal {
        BusSignal::Closed {
            id,
            reason,
            requester,
        } => {
            conn.emit_signal(
                requester.as_deref(),
                NOTIFICATIONS_PATH,
                NOTIFICATIONS_IFACE,
                "NotificationClosed",
                &(*id, reason.code()),
            )
            .await
        }
        BusSignal::ActionInvoked {
            id,
            action_key,
            requester,
        } => {
            conn.emit_signal(
                requester.as_deref(),
                NOTIFICATIONS_PATH,
                NOTIFICATIONS_IFACE,
                "ActionInvoked",
                &(*id, action_key.as_str()),
            )
            .await
        }
    }
}

/// Run the notification daemon (blocking until Ctrl-C).
///
/// - Claims `org.freedesktop.Notifications` on the session bus
/// - Serves the standard interface and the renderer interface
/// - Publishes the active set to the state file on every change
/// - Writes an empty snapshot on shutdown (no persistence across restarts)
pub async fn run(
    config: Config,
    state_file: Option<std::path::PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state_path = state_file.unwrap_or_else(|| config.state_path());
    let (notifier, channels) = Notifier::new(config.timeout_policy());
    let DaemonChannels {
        expirations,
        signals,
        snapshots,
    } = channels;

    let publisher = tokio::spawn(publish::run_publisher(state_path.clone(), snapshots));

    let conn = zbus::connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(
            NOTIFICATIONS_PATH,
            NotificationsInterface::new(notifier.clone()),
        )?
        .serve_at(RENDERER_PATH, RendererInterface::new(notifier.clone()))?
        .build()
        .await?;
    info!("serving {BUS_NAME} on the session bus");

    tokio::spawn(emit_signals(conn.clone(), signals));
    tokio::spawn(drive_expirations(notifier.clone(), expirations));

    println!("D-Bus: {BUS_NAME} on session bus");
    println!("State file: {}", state_path.display());
    println!("Ready. Ctrl+C to stop.");

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .ok();

    let mut interval = tokio::time::interval(Duration::from_millis(250));
    while running.load(Ordering::SeqCst) {
        interval.tick().await;
    }

    info!("shutting down");
    publisher.abort();
    let _ = publisher.await;
    if let Err(e) = publish::write_snapshot(&state_path, &[]) {
        warn!("failed to clear state file on shutdown: {e}");
    }
    drop(conn);
    println!("\nDone.");
    Ok(())
}
