//! Stop-alias resolution.
//!
//! A static bidirectional mapping between fine-grained quay identifiers and
//! their parent stop places, loaded at startup and refreshed periodically in
//! the background. Subscriptions and events may use either granularity; the
//! matcher uses this mapping to reconcile them.

mod loader;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::StopRef;

pub use loader::{AliasLoader, AliasSource, StopAliasError};

/// Thread-safe quay ↔ stop-place alias lookup.
///
/// Supports whole-mapping replacement from a background refresh; readers are
/// never blocked across a refresh boundary.
#[derive(Clone, Default)]
pub struct StopAliases {
    inner: Arc<RwLock<AliasMap>>,
}

#[derive(Default, Clone)]
struct AliasMap {
    quay_to_parent: HashMap<StopRef, StopRef>,
    parent_to_quays: HashMap<StopRef, Vec<StopRef>>,
}

impl AliasMap {
    fn from_pairs(mapping: HashMap<StopRef, StopRef>) -> Self {
        let mut parent_to_quays: HashMap<StopRef, Vec<StopRef>> = HashMap::new();
        for (quay, parent) in &mapping {
            parent_to_quays
                .entry(parent.clone())
                .or_default()
                .push(quay.clone());
        }
        // Deterministic reverse-lookup order.
        for quays in parent_to_quays.values_mut() {
            quays.sort();
        }
        Self {
            quay_to_parent: mapping,
            parent_to_quays,
        }
    }
}

impl StopAliases {
    /// Create an empty resolver. Lookups return "no alias" until the first
    /// `replace_all`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve a quay to its parent stop place.
    pub async fn quay_to_parent(&self, quay: &StopRef) -> Option<StopRef> {
        let guard = self.inner.read().await;
        guard.quay_to_parent.get(quay).cloned()
    }

    /// Resolve a stop place to its known quays.
    pub async fn parent_to_quays(&self, parent: &StopRef) -> Vec<StopRef> {
        let guard = self.inner.read().await;
        guard
            .parent_to_quays
            .get(parent)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the whole mapping. `mapping` is quay → parent pairs; the
    /// reverse direction is derived.
    pub async fn replace_all(&self, mapping: HashMap<StopRef, StopRef>) {
        let map = AliasMap::from_pairs(mapping);
        let mut guard = self.inner.write().await;
        *guard = map;
    }

    /// Number of quay → parent pairs currently held.
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.quay_to_parent.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Take an immutable copy for use inside one message-matching pass.
    ///
    /// Matching is synchronous and message-local; a snapshot avoids taking
    /// the lock once per lookup.
    pub async fn snapshot(&self) -> AliasSnapshot {
        let guard = self.inner.read().await;
        AliasSnapshot { map: guard.clone() }
    }
}

/// An immutable alias mapping captured for one matching pass.
#[derive(Clone, Default)]
pub struct AliasSnapshot {
    map: AliasMap,
}

impl AliasSnapshot {
    /// Build a snapshot directly from quay → parent pairs (tests, tooling).
    pub fn from_pairs(mapping: HashMap<StopRef, StopRef>) -> Self {
        Self {
            map: AliasMap::from_pairs(mapping),
        }
    }

    pub fn quay_to_parent(&self, quay: &StopRef) -> Option<&StopRef> {
        self.map.quay_to_parent.get(quay)
    }

    pub fn parent_to_quays(&self, parent: &StopRef) -> &[StopRef] {
        self.map
            .parent_to_quays
            .get(parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True if the two refs name the same stop, directly or via the alias.
    pub fn same_stop(&self, a: &StopRef, b: &StopRef) -> bool {
        a == b
            || self.quay_to_parent(a).is_some_and(|p| p == b)
            || self.quay_to_parent(b).is_some_and(|p| p == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str) -> StopRef {
        StopRef::new(id)
    }

    fn mapping() -> HashMap<StopRef, StopRef> {
        HashMap::from([
            (stop("NSR:Quay:1"), stop("NSR:StopPlace:100")),
            (stop("NSR:Quay:2"), stop("NSR:StopPlace:100")),
            (stop("NSR:Quay:3"), stop("NSR:StopPlace:200")),
        ])
    }

    #[tokio::test]
    async fn lookup_both_directions() {
        let aliases = StopAliases::empty();
        aliases.replace_all(mapping()).await;

        assert_eq!(
            aliases.quay_to_parent(&stop("NSR:Quay:1")).await,
            Some(stop("NSR:StopPlace:100"))
        );
        assert_eq!(
            aliases.parent_to_quays(&stop("NSR:StopPlace:100")).await,
            vec![stop("NSR:Quay:1"), stop("NSR:Quay:2")]
        );
        assert_eq!(aliases.quay_to_parent(&stop("NSR:Quay:99")).await, None);
        assert!(
            aliases
                .parent_to_quays(&stop("NSR:StopPlace:999"))
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn replace_all_swaps_whole_mapping() {
        let aliases = StopAliases::empty();
        aliases.replace_all(mapping()).await;
        assert_eq!(aliases.len().await, 3);

        aliases
            .replace_all(HashMap::from([(
                stop("NSR:Quay:9"),
                stop("NSR:StopPlace:900"),
            )]))
            .await;

        assert_eq!(aliases.len().await, 1);
        assert_eq!(aliases.quay_to_parent(&stop("NSR:Quay:1")).await, None);
    }

    #[test]
    fn snapshot_same_stop() {
        let snapshot = AliasSnapshot::from_pairs(mapping());

        assert!(snapshot.same_stop(&stop("NSR:Quay:1"), &stop("NSR:Quay:1")));
        assert!(snapshot.same_stop(&stop("NSR:Quay:1"), &stop("NSR:StopPlace:100")));
        assert!(snapshot.same_stop(&stop("NSR:StopPlace:100"), &stop("NSR:Quay:2")));
        assert!(!snapshot.same_stop(&stop("NSR:Quay:1"), &stop("NSR:StopPlace:200")));
        // Two quays of the same parent are distinct stops.
        assert!(!snapshot.same_stop(&stop("NSR:Quay:1"), &stop("NSR:Quay:2")));
    }
}
