//! Connection cache
//!
//! Per-source-node adjacency cache with TTL invalidation. Two edge kinds feed
//! it: priced "general" connections (volatile, refreshed on expiry) and
//! structural "belongs-to" membership edges (fetched once, never re-expired).
//! The merge rule between the kinds is first-writer-wins per target.

use super::directory::NodeDirectory;
use super::node::NodeId;
use crate::store::GraphStore;
use crate::Result;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Default cost of reaching a node's own city
pub const BELONGS_TO_CITY_COST: f64 = 0.0;
/// Default cost of reaching a sibling through the city
// TODO: derive from geography instead of a flat placeholder
pub const BELONGS_TO_THROUGH_COST: f64 = 100.0;

/// Per-edge metadata, index-aligned with the weight list of its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeInfo {
    /// Provider that priced this connection
    pub provider: i64,
}

/// The cached neighbourhood of one source node
///
/// `weights` maps each reachable target to an ordered list of edge weights
/// (parallel priced offers keep the store's return order). For targets
/// reached by general edges, `info` holds metadata index-aligned with the
/// weight list; targets reached only by belongs-to edges carry a single
/// weight and no info list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionSet {
    weights: HashMap<NodeId, Vec<f64>>,
    info: HashMap<NodeId, Vec<EdgeInfo>>,
}

impl ConnectionSet {
    /// Target-to-weights view consumed by the path search
    pub fn weights(&self) -> &HashMap<NodeId, Vec<f64>> {
        &self.weights
    }

    /// Per-target general-edge metadata, index-aligned with `weights`
    pub fn info(&self) -> &HashMap<NodeId, Vec<EdgeInfo>> {
        &self.info
    }

    /// Record one general (priced) edge towards `target`
    ///
    /// Appends to the target's weight and info lists, creating both on first
    /// sight of the target for this source.
    pub(crate) fn set_general_relationship(&mut self, target: NodeId, info: EdgeInfo, weight: f64) {
        self.weights.entry(target).or_default().push(weight);
        self.info.entry(target).or_default().push(info);
    }

    /// Record one belongs-to (structural) edge towards `target`
    ///
    /// Set-if-absent: if the target already has a weight list - from a
    /// general edge or an earlier belongs-to sighting - this is a no-op.
    pub(crate) fn set_belongs_to_relationship(&mut self, target: NodeId, weight: f64) {
        self.weights.entry(target).or_insert_with(|| vec![weight]);
    }

    /// Drop every weight list owned by general edges
    ///
    /// General ownership is recorded by the presence of an info list, so
    /// belongs-to-derived entries survive. Called before re-merging fresh
    /// general edges; re-appending onto the old lists would double them.
    pub(crate) fn drop_general_relationships(&mut self) {
        for target in self.info.keys() {
            self.weights.remove(target);
        }
        self.info.clear();
    }
}

/// One cache slot: the connection set plus its refresh stamp
#[derive(Debug)]
struct CacheEntry {
    set: ConnectionSet,
    refreshed_at: Instant,
}

type EntrySlot = Arc<Mutex<Option<CacheEntry>>>;

/// Lazy, TTL-invalidated adjacency cache over a [`GraphStore`]
///
/// Entries move Absent -> Fresh on first use and Fresh -> Stale -> Fresh as
/// the TTL lapses. Staleness triggers a partial refresh: only general edges
/// are re-fetched; belongs-to neighbourhoods are assumed static for the
/// process lifetime and are never re-queried or pruned. That asymmetry is
/// policy, not an accident.
///
/// Refreshes for the same node id are serialized (concurrent callers
/// single-flight behind the entry lock); refreshes for different node ids
/// proceed in parallel.
pub struct ConnectionCache {
    store: Arc<dyn GraphStore>,
    directory: Arc<NodeDirectory>,
    /// Fixed source of the current search; belongs-to queries special-case it
    search_source: NodeId,
    ttl: Duration,
    entries: DashMap<NodeId, EntrySlot>,
}

impl ConnectionCache {
    /// Create an empty cache over the given store
    pub fn new(
        store: Arc<dyn GraphStore>,
        directory: Arc<NodeDirectory>,
        search_source: NodeId,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            directory,
            search_source,
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Return the connection set for `n`, fetching or refreshing as needed
    ///
    /// Absent entry: full initialization (general + belongs-to). Stale entry:
    /// partial refresh (general only). Fresh entry: returned unchanged. Any
    /// store error aborts the refresh and propagates; the caller is expected
    /// to abort the search rather than continue on a partial neighbourhood.
    pub async fn get_or_refresh(&self, n: NodeId) -> Result<ConnectionSet> {
        let slot = self
            .entries
            .entry(n)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        // Holding the slot lock across the whole check-then-refresh sequence
        // is what keeps two overlapping refreshes of one node from
        // double-appending weights.
        let mut slot = slot.lock().await;

        if slot.is_none() {
            let entry = slot.insert(CacheEntry {
                set: ConnectionSet::default(),
                refreshed_at: Instant::now(),
            });
            self.initialize(n, entry).await?;
        } else if let Some(entry) = slot.as_mut() {
            if entry.refreshed_at.elapsed() >= self.ttl {
                self.invalidate(n, entry).await?;
            }
        }

        Ok(slot
            .as_ref()
            .map(|entry| entry.set.clone())
            .unwrap_or_default())
    }

    /// Full population of a freshly installed entry
    async fn initialize(&self, n: NodeId, entry: &mut CacheEntry) -> Result<()> {
        debug!(node = %n, "connection cache miss, initializing");
        self.merge_general(n, &mut entry.set).await?;
        self.merge_belongs_to(n, &mut entry.set).await
    }

    /// Partial refresh of a stale entry: general edges only
    ///
    /// Belongs-to neighbourhoods are structural and treated as static, so
    /// they are neither re-fetched nor pruned here.
    async fn invalidate(&self, n: NodeId, entry: &mut CacheEntry) -> Result<()> {
        debug!(node = %n, "connection cache entry stale, refreshing general edges");
        entry.refreshed_at = Instant::now();
        entry.set.drop_general_relationships();
        self.merge_general(n, &mut entry.set).await
    }

    /// Fetch general edges for `n` and merge them into `set`
    ///
    /// Weight-list order mirrors the store's return order (edge identity
    /// ascending); that ordering is an observable contract.
    async fn merge_general(&self, n: NodeId, set: &mut ConnectionSet) -> Result<()> {
        let edges = self.store.general_edges(n).await?;
        debug!(node = %n, edges = edges.len(), "merging general connections");

        for edge in edges {
            let target = edge.target.id();
            self.directory.set_if_absent(edge.target);
            set.set_general_relationship(
                target,
                EdgeInfo {
                    provider: edge.provider,
                },
                edge.price,
            );
        }

        Ok(())
    }

    /// Fetch the belongs-to neighbourhood for `n` and merge it into `set`
    ///
    /// Same-city peers come first at the city cost, then through-city
    /// siblings at the through cost; both respect entries already claimed by
    /// general edges (first-writer-wins).
    async fn merge_belongs_to(&self, n: NodeId, set: &mut ConnectionSet) -> Result<()> {
        let peers = self.store.belongs_to_peers(n, self.search_source).await?;
        for node in peers {
            let target = node.id();
            self.directory.set_if_absent(node);
            set.set_belongs_to_relationship(target, BELONGS_TO_CITY_COST);
        }

        let through = self
            .store
            .belongs_to_through_city(n, self.search_source)
            .await?;
        for node in through {
            let target = node.id();
            self.directory.set_if_absent(node);
            set.set_belongs_to_relationship(target, BELONGS_TO_THROUGH_COST);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_general_relationship_appends_in_order() {
        let mut set = ConnectionSet::default();
        let target = NodeId::new(1);

        set.set_general_relationship(target, EdgeInfo { provider: 0 }, 100.0);
        set.set_general_relationship(target, EdgeInfo { provider: 1 }, 150.0);

        assert_eq!(set.weights()[&target], vec![100.0, 150.0]);
        assert_eq!(
            set.info()[&target],
            vec![EdgeInfo { provider: 0 }, EdgeInfo { provider: 1 }]
        );
    }

    #[test]
    fn test_set_belongs_to_relationship_is_set_if_absent() {
        let mut set = ConnectionSet::default();
        let target = NodeId::new(1);

        set.set_belongs_to_relationship(target, 0.0);
        set.set_belongs_to_relationship(target, 100.0);

        assert_eq!(set.weights()[&target], vec![0.0]);
        assert!(set.info().get(&target).is_none());
    }

    #[test]
    fn test_belongs_to_never_touches_general_entries() {
        let mut set = ConnectionSet::default();
        let target = NodeId::new(1);

        set.set_general_relationship(target, EdgeInfo { provider: 0 }, 200.0);
        set.set_belongs_to_relationship(target, 0.0);

        assert_eq!(set.weights()[&target], vec![200.0]);
    }

    #[test]
    fn test_drop_general_relationships_spares_belongs_to() {
        let mut set = ConnectionSet::default();
        let priced = NodeId::new(1);
        let city = NodeId::new(2);

        set.set_general_relationship(priced, EdgeInfo { provider: 0 }, 200.0);
        set.set_belongs_to_relationship(city, 0.0);

        set.drop_general_relationships();

        assert!(set.weights().get(&priced).is_none());
        assert_eq!(set.weights()[&city], vec![0.0]);
        assert!(set.info().is_empty());
    }
}
