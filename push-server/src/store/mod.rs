//! Subscription and live-journey storage.
//!
//! The matchers only ever read these stores; mutation comes from the
//! control plane (subscriptions) and from the feed handler and delivery
//! engine (live journeys, failure bookkeeping). The subscription store is a
//! trait so a document-store-backed implementation can replace the
//! in-memory one at startup without touching the matching logic.

mod live;
mod memory;

use crate::domain::{StopRef, Subscription, SubscriptionId};

pub use live::{LIVE_JOURNEY_TTL, LiveCall, LiveJourney, LiveJourneyStore};
pub use memory::InMemorySubscriptionStore;

/// Subscription index, queryable by stop, line, and codespace.
///
/// Implementations must support concurrent reads and occasional concurrent
/// writes without blocking readers, and must keep the stop index consistent
/// with each subscription's `from_stops ∪ to_stops` on every mutation.
pub trait SubscriptionStore: Send + Sync {
    /// Subscriptions registered on a stop (member of its from or to set).
    fn find(&self, stop: &StopRef) -> Vec<Subscription>;

    /// Subscriptions whose line filter contains the line.
    fn find_by_line(&self, line: &str) -> Vec<Subscription>;

    /// Subscriptions whose codespace filter contains the codespace.
    fn find_by_codespace(&self, codespace: &str) -> Vec<Subscription>;

    fn get(&self, id: &SubscriptionId) -> Option<Subscription>;

    /// Insert or replace a subscription, re-indexing it atomically.
    fn add(&self, subscription: Subscription);

    /// Replace an existing subscription. Same contract as [`add`].
    ///
    /// [`add`]: SubscriptionStore::add
    fn update(&self, subscription: Subscription);

    /// Remove a subscription and all its index entries.
    fn remove(&self, id: &SubscriptionId) -> Option<Subscription>;

    fn all(&self) -> Vec<Subscription>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Increment the failure counter, returning the new count.
    ///
    /// Expressed as a store operation so the read-increment-write is atomic
    /// under concurrent deliveries.
    fn record_push_failure(&self, id: &SubscriptionId) -> Option<u32>;

    /// Reset the failure counter after a successful delivery.
    fn reset_push_failures(&self, id: &SubscriptionId);
}
