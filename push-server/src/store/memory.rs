//! In-memory subscription store.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::domain::{StopRef, Subscription, SubscriptionId};

use super::SubscriptionStore;

/// Concurrent in-memory subscription index.
///
/// Primary map plus secondary id-set indexes by stop, line, and codespace.
/// Readers never block each other; writers only contend on the touched
/// shards.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: DashMap<SubscriptionId, Subscription>,
    by_stop: DashMap<StopRef, HashSet<SubscriptionId>>,
    by_line: DashMap<String, HashSet<SubscriptionId>>,
    by_codespace: DashMap<String, HashSet<SubscriptionId>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self, subscription: &Subscription) {
        let id = &subscription.id;
        for stop in subscription.stops() {
            self.by_stop
                .entry(stop.clone())
                .or_default()
                .insert(id.clone());
        }
        for line in &subscription.line_refs {
            self.by_line
                .entry(line.clone())
                .or_default()
                .insert(id.clone());
        }
        for codespace in &subscription.codespaces {
            self.by_codespace
                .entry(codespace.clone())
                .or_default()
                .insert(id.clone());
        }
    }

    fn unindex(&self, subscription: &Subscription) {
        let id = &subscription.id;
        for stop in subscription.stops() {
            if let Some(mut ids) = self.by_stop.get_mut(stop) {
                ids.remove(id);
            }
        }
        for line in &subscription.line_refs {
            if let Some(mut ids) = self.by_line.get_mut(line) {
                ids.remove(id);
            }
        }
        for codespace in &subscription.codespaces {
            if let Some(mut ids) = self.by_codespace.get_mut(codespace) {
                ids.remove(id);
            }
        }
    }

    fn collect(&self, ids: Option<HashSet<SubscriptionId>>) -> Vec<Subscription> {
        let Some(ids) = ids else {
            return Vec::new();
        };
        let mut found: Vec<Subscription> = ids
            .iter()
            .filter_map(|id| self.subscriptions.get(id).map(|s| s.value().clone()))
            .collect();
        // Deterministic result order for matching and tests.
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }
}

impl SubscriptionStore for InMemorySubscriptionStore {
    fn find(&self, stop: &StopRef) -> Vec<Subscription> {
        self.collect(self.by_stop.get(stop).map(|ids| ids.value().clone()))
    }

    fn find_by_line(&self, line: &str) -> Vec<Subscription> {
        self.collect(self.by_line.get(line).map(|ids| ids.value().clone()))
    }

    fn find_by_codespace(&self, codespace: &str) -> Vec<Subscription> {
        self.collect(self.by_codespace.get(codespace).map(|ids| ids.value().clone()))
    }

    fn get(&self, id: &SubscriptionId) -> Option<Subscription> {
        self.subscriptions.get(id).map(|s| s.value().clone())
    }

    fn add(&self, subscription: Subscription) {
        // Drop stale index entries first so a changed scope cannot leave
        // the subscription reachable under stops it no longer declares.
        if let Some(existing) = self.subscriptions.get(&subscription.id) {
            let existing = existing.value().clone();
            self.unindex(&existing);
        }
        self.index(&subscription);
        self.subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    fn update(&self, subscription: Subscription) {
        self.add(subscription);
    }

    fn remove(&self, id: &SubscriptionId) -> Option<Subscription> {
        let (_, subscription) = self.subscriptions.remove(id)?;
        self.unindex(&subscription);
        Some(subscription)
    }

    fn all(&self) -> Vec<Subscription> {
        let mut subscriptions: Vec<Subscription> =
            self.subscriptions.iter().map(|s| s.value().clone()).collect();
        subscriptions.sort_by(|a, b| a.id.cmp(&b.id));
        subscriptions
    }

    fn len(&self) -> usize {
        self.subscriptions.len()
    }

    fn record_push_failure(&self, id: &SubscriptionId) -> Option<u32> {
        self.subscriptions.get_mut(id).map(|mut s| {
            s.failed_push_count += 1;
            s.failed_push_count
        })
    }

    fn reset_push_failures(&self, id: &SubscriptionId) {
        if let Some(mut s) = self.subscriptions.get_mut(id) {
            s.failed_push_count = 0;
        }
    }
}
