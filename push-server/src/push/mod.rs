//! Asynchronous push delivery.
//!
//! Deliveries are dispatched off the matching path through a bounded worker
//! pool, deduplicated by content fingerprint, and tracked per subscription:
//! repeated failure or an explicit forget-me acknowledgement removes the
//! subscription permanently.

mod gateway;
pub mod mock;
mod payload;

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::domain::{Subscription, SubscriptionId};
use crate::store::SubscriptionStore;

pub use gateway::{HttpPushGateway, PushError, PushGateway, PushOutcome};
pub use payload::{DeviationSummary, JourneyAlert, Notification};

/// Configuration for the delivery engine.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Per-request timeout for the HTTP gateway.
    pub timeout: Duration,

    /// Maximum concurrent deliveries.
    pub max_concurrent: usize,

    /// How long a sent fingerprint suppresses identical content.
    pub dedup_ttl: Duration,

    /// Maximum dedup entries held at once.
    pub dedup_capacity: u64,

    /// Consecutive failures after which a subscription is removed.
    pub max_failed_pushes: u32,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_concurrent: 8,
            dedup_ttl: Duration::from_secs(60 * 60),
            dedup_capacity: 100_000,
            max_failed_pushes: 4,
        }
    }
}

/// Deduplication key for one (subscription, payload) pair.
///
/// Derived from the subscription identity and a fingerprint of the payload,
/// which the caller has already restricted to the fields relevant to that
/// subscription's scope. Identical relevant content within the TTL window
/// maps to the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn new(subscription: &Subscription, notification: &Notification) -> Self {
        let mut hasher = DefaultHasher::new();
        serde_json::to_string(notification)
            .unwrap_or_default()
            .hash(&mut hasher);
        DedupKey(format!("{}:{:x}", subscription.id, hasher.finish()))
    }

    fn into_inner(self) -> String {
        self.0
    }
}

/// Asynchronous, deduplicating, failure-tracking delivery engine.
///
/// Submitting a delivery never blocks the matching path; the number of
/// in-flight deliveries is observable so callers can wait for quiescence.
pub struct PushEngine {
    gateway: Arc<dyn PushGateway>,
    store: Arc<dyn SubscriptionStore>,
    dedup: Cache<String, ()>,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    max_failed_pushes: u32,
}

impl PushEngine {
    pub fn new(
        gateway: Arc<dyn PushGateway>,
        store: Arc<dyn SubscriptionStore>,
        config: &PushConfig,
    ) -> Self {
        let dedup = Cache::builder()
            .time_to_live(config.dedup_ttl)
            .max_capacity(config.dedup_capacity)
            .build();

        Self {
            gateway,
            store,
            dedup,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_failed_pushes: config.max_failed_pushes,
        }
    }

    /// Dispatch one notification to one subscriber, unless identical
    /// content was already sent within the dedup window.
    ///
    /// Returns false when the delivery was suppressed. The check-and-record
    /// is atomic per key; a failed delivery releases the key again so the
    /// next matching event acts as the retry.
    pub async fn submit(&self, subscription: &Subscription, notification: &Notification) -> bool {
        let key = DedupKey::new(subscription, notification);
        let entry = self.dedup.entry(key.0.clone()).or_insert(()).await;
        if !entry.is_fresh() {
            debug!(subscription = %subscription.id, "suppressing duplicate notification");
            return false;
        }

        let body = match serde_json::to_value(notification) {
            Ok(body) => body,
            Err(e) => {
                warn!(subscription = %subscription.id, error = %e, "failed to serialize notification");
                self.dedup.invalidate(&key.0).await;
                return false;
            }
        };

        let gateway = Arc::clone(&self.gateway);
        let store = Arc::clone(&self.store);
        let dedup = self.dedup.clone();
        let semaphore = Arc::clone(&self.semaphore);
        let max_failed_pushes = self.max_failed_pushes;
        let id = subscription.id.clone();
        let address = subscription.push_address.clone();
        let key = key.into_inner();

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        tokio::spawn(async move {
            let _guard = guard;
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };

            match gateway.deliver(&address, &body).await {
                Ok(PushOutcome::Delivered) => {
                    debug!(subscription = %id, "delivered notification");
                    store.reset_push_failures(&id);
                }
                Ok(PushOutcome::ForgetMe) => {
                    info!(subscription = %id, "subscriber asked to be forgotten, removing");
                    store.remove(&id);
                }
                Ok(PushOutcome::Failed { status }) => {
                    warn!(subscription = %id, status = ?status, "delivery failed");
                    handle_failure(&*store, &dedup, &key, &id, max_failed_pushes).await;
                }
                Err(e) => {
                    warn!(subscription = %id, error = %e, "delivery failed");
                    handle_failure(&*store, &dedup, &key, &id, max_failed_pushes).await;
                }
            }
        });

        true
    }

    /// Deliveries currently dispatched but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until every dispatched delivery has completed.
    pub async fn wait_idle(&self) {
        while self.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// Failure bookkeeping: release the dedup key so the next matching event
/// retries, count the failure, and drop the subscription once the threshold
/// is reached.
async fn handle_failure(
    store: &dyn SubscriptionStore,
    dedup: &Cache<String, ()>,
    key: &str,
    id: &SubscriptionId,
    max_failed_pushes: u32,
) {
    dedup.invalidate(key).await;
    if let Some(count) = store.record_push_failure(id)
        && count >= max_failed_pushes
    {
        warn!(subscription = %id, failures = count, "removing subscription after repeated failures");
        store.remove(id);
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
