//! Urgency-dependent expiration: deadline policy and per-notification
//! one-shot timers.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::notification::Urgency;

/// Default expiration per urgency level. `None` means never expire.
///
/// These come from the config file; the daemon never hardwires them.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPolicy {
    pub low: Option<Duration>,
    pub normal: Option<Duration>,
    pub critical: Option<Duration>,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            low: Some(Duration::from_secs(5)),
            normal: Some(Duration::from_secs(10)),
            critical: None,
        }
    }
}

impl TimeoutPolicy {
    /// Resolve a caller-requested `expire_timeout` (milliseconds) against the
    /// urgency defaults.
    ///
    /// `> 0` is an explicit duration and overrides the urgency default,
    /// including for Critical. `0` means never expire. Negative (the protocol
    /// sends -1) selects the urgency default.
    pub fn resolve(&self, urgency: Urgency, expire_timeout: i32) -> Option<Duration> {
        if expire_timeout > 0 {
            return Some(Duration::from_millis(expire_timeout as u64));
        }
        if expire_timeout == 0 {
            return None;
        }
        match urgency {
            Urgency::Low => self.low,
            Urgency::Normal => self.normal,
            Urgency::Critical => self.critical,
        }
    }
}

/// A fired expiry timer.
///
/// Carries the deadline the timer was armed with so the consumer can detect
/// staleness: a replacement re-derives `expires_at` from a fresh `now`, so a
/// timer armed for the pre-replacement entry no longer matches and must not
/// remove anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub id: u32,
    pub deadline: Instant,
}

/// Per-notification one-shot timer table.
///
/// Fired timers are delivered on a channel rather than acting on the store
/// directly; the daemon's expiry consumer applies them under the same
/// mutation lock as every other lifecycle event.
pub struct ExpiryScheduler {
    tx: mpsc::UnboundedSender<Expiry>,
    timers: Mutex<HashMap<u32, JoinHandle<()>>>,
}

impl ExpiryScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Expiry>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tx,
            timers: Mutex::new(HashMap::new()),
        };
        (scheduler, rx)
    }

    /// Arm a timer for `id`, cancelling any previous one.
    pub async fn arm(&self, id: u32, deadline: Instant) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // Receiver gone means the daemon is shutting down.
            let _ = tx.send(Expiry { id, deadline });
        });
        let mut timers = self.timers.lock().await;
        if let Some(old) = timers.insert(id, handle) {
            old.abort();
        }
    }

    /// Cancel the timer for `id`, if any. Idempotent.
    pub async fn cancel(&self, id: u32) {
        let mut timers = self.timers.lock().await;
        if let Some(handle) = timers.remove(&id) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_explicit_timeout_wins() {
        let policy = TimeoutPolicy::default();
        assert_eq!(
            policy.resolve(Urgency::Normal, 2500),
            Some(Duration::from_millis(2500))
        );
        // an explicit timeout overrides even the critical never-expire default
        assert_eq!(
            policy.resolve(Urgency::Critical, 2500),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn test_policy_zero_means_never() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.resolve(Urgency::Low, 0), None);
        assert_eq!(policy.resolve(Urgency::Critical, 0), None);
    }

    #[test]
    fn test_policy_negative_selects_urgency_default() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.resolve(Urgency::Low, -1), Some(Duration::from_secs(5)));
        assert_eq!(policy.resolve(Urgency::Normal, -1), Some(Duration::from_secs(10)));
        assert_eq!(policy.resolve(Urgency::Critical, -1), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_timer_fires_once_with_its_deadline() {
        let (scheduler, mut fired) = ExpiryScheduler::new();
        let deadline = Instant::now() + Duration::from_secs(1);
        scheduler.arm(7, deadline).await;

        let expiry = fired.recv().await.unwrap();
        assert_eq!(expiry, Expiry { id: 7, deadline });

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_timer() {
        let (scheduler, mut fired) = ExpiryScheduler::new();
        let first = Instant::now() + Duration::from_secs(1);
        scheduler.arm(3, first).await;
        let second = Instant::now() + Duration::from_secs(5);
        scheduler.arm(3, second).await;

        let expiry = fired.recv().await.unwrap();
        assert_eq!(expiry.deadline, second);
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire_and_is_idempotent() {
        let (scheduler, mut fired) = ExpiryScheduler::new();
        scheduler.arm(9, Instant::now() + Duration::from_secs(1)).await;
        scheduler.cancel(9).await;
        scheduler.cancel(9).await;

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(fired.try_recv().is_err());
    }
}
