//! Refresh throttling for received updates.
//!
//! Every update passes three gates before it may trigger a refresh:
//!
//! 1. **Dedup** - keys seen within the last 60 s are dropped.
//! 2. **Staleness** - updates 30 s or older are dropped.
//! 3. **Debounce** - a refresh is scheduled 1 s out; a newer update replaces
//!    the pending one, so bursts collapse into a single refresh.
//!
//! When the debounce timer fires, the refresh is still suppressed if the
//! previous one happened less than 10 s ago or a long-running operation has
//! marked the throttle busy. All state that must survive a reload lives in
//! the [`KeyValueStore`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use super::update::{ClientUpdate, UpdateHandler};
use crate::domain::foundation::{BookingId, SpecialistId};
use crate::ports::{Clock, KeyValueError, KeyValueStore};

pub const PROCESSED_EVENTS_KEY: &str = "processedBookingEvents";
pub const LAST_CHANGE_KEY: &str = "lastBookingUpdate";
pub const LAST_REFRESH_KEY: &str = "lastReloadTime";

pub const DEDUP_WINDOW_SECS: i64 = 60;
pub const STALE_AFTER_SECS: i64 = 30;
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);
pub const REFRESH_COOLDOWN: Duration = Duration::from_secs(10);

/// The action a settled burst of updates triggers (a page reload, a
/// calendar re-fetch).
pub trait Refresh: Send + Sync {
    fn refresh(&self);
}

impl<F> Refresh for F
where
    F: Fn() + Send + Sync,
{
    fn refresh(&self) {
        self()
    }
}

/// Descriptor of the most recent accepted change, kept for display after
/// the refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastChange {
    #[serde(rename = "type")]
    pub kind: String,
    pub client_name: String,
    pub booking_id: Option<BookingId>,
    pub specialist_id: Option<SpecialistId>,
    pub timestamp: i64,
}

impl LastChange {
    fn describe(update: &ClientUpdate, now_secs: i64) -> Self {
        match update {
            ClientUpdate::Change(envelope) => Self {
                kind: envelope.kind.as_str().to_string(),
                client_name: envelope
                    .data
                    .client_name
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                booking_id: Some(envelope.data.booking_id),
                specialist_id: envelope.data.specialist_id,
                timestamp: now_secs,
            },
            ClientUpdate::VersionChange(_) => Self {
                kind: update.kind().to_string(),
                client_name: "Unknown".to_string(),
                booking_id: None,
                specialist_id: None,
                timestamp: now_secs,
            },
        }
    }
}

/// Result of offering an update to the throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleOutcome {
    Duplicate,
    Stale,
    /// Accepted, but a long-running operation blocks refreshing.
    Busy,
    /// Accepted; a debounced refresh is pending.
    Scheduled,
}

struct Inner {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    refresh: Arc<dyn Refresh>,
    busy: AtomicBool,
    refreshes: AtomicU64,
    debounce: Duration,
    cooldown: Duration,
}

/// Dedups, debounces and rate-limits refreshes for one client session.
pub struct RefreshThrottle {
    inner: Arc<Inner>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshThrottle {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        refresh: Arc<dyn Refresh>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                clock,
                refresh,
                busy: AtomicBool::new(false),
                refreshes: AtomicU64::new(0),
                debounce: DEBOUNCE_WINDOW,
                cooldown: REFRESH_COOLDOWN,
            }),
            pending: Mutex::new(None),
        }
    }

    /// Mark a long-running operation (a bulk import, say) as in progress.
    /// While set, no refresh fires.
    pub fn set_busy(&self, busy: bool) {
        self.inner.busy.store(busy, Ordering::SeqCst);
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::SeqCst)
    }

    /// Refreshes triggered by this throttle so far.
    pub fn refresh_count(&self) -> u64 {
        self.inner.refreshes.load(Ordering::SeqCst)
    }

    /// Whether a debounced refresh is waiting to fire.
    pub fn has_pending(&self) -> bool {
        self.lock_pending()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub async fn handle(&self, update: &ClientUpdate) -> ThrottleOutcome {
        let now = self.inner.clock.now().as_unix_secs();
        let key = update.key();

        let mut processed = self.inner.load_processed().await;
        processed.retain(|_, seen_at| now - *seen_at <= DEDUP_WINDOW_SECS);

        if processed.contains_key(key.as_str()) {
            tracing::debug!(event_key = %key, "Duplicate update ignored");
            return ThrottleOutcome::Duplicate;
        }

        let age = now - update.timestamp();
        if age >= STALE_AFTER_SECS {
            tracing::debug!(event_key = %key, age_secs = age, "Stale update ignored");
            return ThrottleOutcome::Stale;
        }

        processed.insert(key.to_string(), now);
        self.inner.save_json(PROCESSED_EVENTS_KEY, &processed).await;
        self.inner
            .save_json(LAST_CHANGE_KEY, &LastChange::describe(update, now))
            .await;

        let mut pending = self.lock_pending();
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        if self.is_busy() {
            tracing::debug!(event_key = %key, "Refresh held back by running operation");
            return ThrottleOutcome::Busy;
        }

        let inner = Arc::clone(&self.inner);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            inner.fire().await;
        }));

        ThrottleOutcome::Scheduled
    }

    /// Return and forget the descriptor of the last accepted change.
    pub async fn take_last_change(&self) -> Result<Option<LastChange>, KeyValueError> {
        let Some(raw) = self.inner.store.get(LAST_CHANGE_KEY).await? else {
            return Ok(None);
        };
        self.inner.store.remove(LAST_CHANGE_KEY).await?;

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| KeyValueError::Serialization(e.to_string()))
    }

    /// Cancel a pending refresh.
    pub fn shutdown(&self) {
        if let Some(handle) = self.lock_pending().take() {
            handle.abort();
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for RefreshThrottle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[async_trait]
impl UpdateHandler for RefreshThrottle {
    async fn on_update(&self, update: ClientUpdate) {
        let outcome = self.handle(&update).await;
        tracing::trace!(?outcome, kind = update.kind(), "Update offered to throttle");
    }
}

impl Inner {
    async fn fire(&self) {
        if self.busy.load(Ordering::SeqCst) {
            tracing::debug!("Refresh skipped: operation in progress");
            return;
        }

        let now_ms = self.clock.now().as_unix_millis();
        let last_ms = match self.store.get(LAST_REFRESH_KEY).await {
            Ok(value) => value.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(0),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read last refresh time");
                0
            }
        };

        if now_ms - last_ms < self.cooldown.as_millis() as i64 {
            tracing::debug!(since_last_ms = now_ms - last_ms, "Refresh suppressed by cooldown");
            return;
        }

        if let Err(e) = self.store.set(LAST_REFRESH_KEY, &now_ms.to_string()).await {
            tracing::warn!(error = %e, "Could not persist last refresh time");
        }

        self.refreshes.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Refreshing after booking changes");
        self.refresh.refresh();
    }

    async fn load_processed(&self) -> BTreeMap<String, i64> {
        match self.store.get(PROCESSED_EVENTS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding unreadable dedup cache");
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read dedup cache");
                BTreeMap::new()
            }
        }
    }

    async fn save_json<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Could not serialize client state");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &raw).await {
            tracing::warn!(key, error = %e, "Could not persist client state");
        }
    }
}
