//! Graph adapter
//!
//! The facade a shortest-path search runs against. One adapter owns the node
//! directory, the connection cache, and the heuristic cache for a single
//! fixed (source, target) search, and translates search queries into cache
//! lookups. Errors are returned, not swallowed: a partially-known
//! neighbourhood would corrupt the search result, so the consumer is expected
//! to abort on the first failure.

use super::connections::{ConnectionCache, ConnectionSet};
use super::directory::NodeDirectory;
use super::heuristic::HeuristicCache;
use super::node::{Node, NodeId};
use crate::store::{GraphStore, HeuristicStore};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Search facade over the connection and heuristic caches
pub struct GraphAdapter {
    graph_store: Arc<dyn GraphStore>,
    directory: Arc<NodeDirectory>,
    connections: ConnectionCache,
    heuristic: HeuristicCache,
    s: NodeId,
    t: NodeId,
}

impl GraphAdapter {
    /// Build an adapter for the fixed search endpoints `(s, t)`
    ///
    /// Eagerly resolves and registers the source node's metadata as a
    /// one-time warm-up. A store failure during the warm-up is fatal to
    /// construction; the source simply not existing is not (it is left
    /// unregistered, matching the lookup-miss policy everywhere else).
    pub async fn new(
        s: NodeId,
        t: NodeId,
        graph_store: Arc<dyn GraphStore>,
        heuristic_store: Arc<dyn HeuristicStore>,
        ttl: Duration,
    ) -> Result<Self> {
        let directory = Arc::new(NodeDirectory::new());
        let adapter = Self {
            connections: ConnectionCache::new(
                Arc::clone(&graph_store),
                Arc::clone(&directory),
                s,
                ttl,
            ),
            heuristic: HeuristicCache::new(heuristic_store),
            graph_store,
            directory,
            s,
            t,
        };

        adapter.resolve_node(s).await?;
        info!(source = %s, target = %t, "graph adapter ready");

        Ok(adapter)
    }

    /// The fixed search source
    pub fn s(&self) -> NodeId {
        self.s
    }

    /// The fixed search target
    pub fn t(&self) -> NodeId {
        self.t
    }

    /// The node directory shared by the caches
    pub fn directory(&self) -> &NodeDirectory {
        &self.directory
    }

    /// Neighbours of `n` as target -> ordered weights
    pub async fn connections(&self, n: NodeId) -> Result<HashMap<NodeId, Vec<f64>>> {
        let set = self.connections.get_or_refresh(n).await?;
        Ok(set.weights().clone())
    }

    /// Neighbours of `n` with per-edge metadata included
    ///
    /// Same cache path as [`connections`](Self::connections); used by
    /// consumers that need provider info to assemble a bookable trip from a
    /// found path.
    pub async fn connection_set(&self, n: NodeId) -> Result<ConnectionSet> {
        self.connections.get_or_refresh(n).await
    }

    /// Expected remaining cost from `n` to the fixed target
    pub async fn f_value(&self, n: NodeId) -> Result<f64> {
        self.heuristic.get_or_compute(n, self.t).await
    }

    /// Node metadata for `id`, from the directory or the store
    ///
    /// A directory hit avoids the store entirely; otherwise the store is
    /// queried and a found node registered. A node the store does not know is
    /// reported as `None`, never as an error.
    pub async fn resolve_node(&self, id: NodeId) -> Result<Option<Node>> {
        if let Some(node) = self.directory.get(id) {
            return Ok(Some(node));
        }

        match self.graph_store.node_info(id).await? {
            Some(node) => {
                self.directory.set_if_absent(node.clone());
                Ok(Some(node))
            }
            None => Ok(None),
        }
    }
}
