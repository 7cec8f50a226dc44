//! Integration tests for farepath
//!
//! These tests drive the adapter and caches against call-counting fake
//! stores, so every assertion about fetch counts and merge order is exact.
//! The scenario fixture mirrors a small real-world graph: YYZ connects to
//! JFK by a priced offer, JFK and LGA belong to New York, YYZ belongs to
//! Toronto, and the search runs New York -> Toronto.

use async_trait::async_trait;
use farepath::graph::{
    GraphAdapter, HeuristicCache, Node, NodeId, BELONGS_TO_CITY_COST, BELONGS_TO_THROUGH_COST,
};
use farepath::store::{Average, AverageLookup, GeneralEdge, GraphStore, HeuristicStore};
use farepath::{FarepathError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const YYZ: i64 = 1;
const JFK: i64 = 2;
const LGA: i64 = 3;
const TORONTO: i64 = 4;
const NEW_YORK: i64 = 5;

const DAY: Duration = Duration::from_secs(24 * 3600);

fn yyz() -> Node {
    Node::airport(YYZ, "YYZ")
}
fn jfk() -> Node {
    Node::airport(JFK, "JFK")
}
fn lga() -> Node {
    Node::airport(LGA, "LGA")
}
fn toronto() -> Node {
    Node::city(TORONTO, "Toronto")
}
fn new_york() -> Node {
    Node::city(NEW_YORK, "New York")
}

/// Call-counting fake graph store
#[derive(Default)]
struct FakeGraphStore {
    nodes: HashMap<NodeId, Node>,
    general: HashMap<NodeId, Vec<GeneralEdge>>,
    peers: HashMap<NodeId, Vec<Node>>,
    through: HashMap<NodeId, Vec<Node>>,
    node_info_calls: AtomicUsize,
    general_calls: AtomicUsize,
    peers_calls: AtomicUsize,
    through_calls: AtomicUsize,
    general_delay: Option<Duration>,
    fail_general: bool,
}

impl FakeGraphStore {
    fn with_node(mut self, node: Node) -> Self {
        self.nodes.insert(node.id(), node);
        self
    }

    fn with_general(mut self, source: i64, edges: Vec<GeneralEdge>) -> Self {
        self.general.insert(NodeId::new(source), edges);
        self
    }

    fn with_peers(mut self, source: i64, peers: Vec<Node>) -> Self {
        self.peers.insert(NodeId::new(source), peers);
        self
    }

    fn with_through(mut self, source: i64, through: Vec<Node>) -> Self {
        self.through.insert(NodeId::new(source), through);
        self
    }
}

#[async_trait]
impl GraphStore for FakeGraphStore {
    async fn node_info(&self, id: NodeId) -> Result<Option<Node>> {
        self.node_info_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.nodes.get(&id).cloned())
    }

    async fn general_edges(&self, source: NodeId) -> Result<Vec<GeneralEdge>> {
        self.general_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.general_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_general {
            return Err(FarepathError::Storage("general edges unavailable".to_string()));
        }
        Ok(self.general.get(&source).cloned().unwrap_or_default())
    }

    async fn belongs_to_peers(&self, source: NodeId, _search_source: NodeId) -> Result<Vec<Node>> {
        self.peers_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.peers.get(&source).cloned().unwrap_or_default())
    }

    async fn belongs_to_through_city(
        &self,
        source: NodeId,
        _search_source: NodeId,
    ) -> Result<Vec<Node>> {
        self.through_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.through.get(&source).cloned().unwrap_or_default())
    }
}

/// Call-counting fake averages store
#[derive(Default)]
struct FakeHeuristicStore {
    docs: Mutex<HashMap<NodeId, HashMap<NodeId, Average>>>,
    create_calls: AtomicUsize,
    add_calls: AtomicUsize,
}

impl FakeHeuristicStore {
    fn seed(&self, source: i64, target: i64, avg: f64, samples: u32) {
        self.docs
            .lock()
            .unwrap()
            .entry(NodeId::new(source))
            .or_default()
            .insert(NodeId::new(target), Average { avg, samples });
    }
}

#[async_trait]
impl HeuristicStore for FakeHeuristicStore {
    async fn find_average(&self, source: NodeId, target: NodeId) -> Result<AverageLookup> {
        let docs = self.docs.lock().unwrap();
        match docs.get(&source) {
            None => Ok(AverageLookup::DocumentMissing),
            Some(doc) => match doc.get(&target) {
                Some(entry) => Ok(AverageLookup::Found(entry.avg)),
                None => Ok(AverageLookup::EntryMissing),
            },
        }
    }

    async fn create_document(&self, source: NodeId, target: NodeId) -> Result<Average> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut doc = HashMap::new();
        doc.insert(target, Average::zero());
        self.docs.lock().unwrap().insert(source, doc);
        Ok(Average::zero())
    }

    async fn add_entry(&self, source: NodeId, target: NodeId) -> Result<Average> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.docs
            .lock()
            .unwrap()
            .entry(source)
            .or_default()
            .insert(target, Average::zero());
        Ok(Average::zero())
    }
}

/// The YYZ/JFK/LGA scenario graph
fn scenario_store() -> FakeGraphStore {
    FakeGraphStore::default()
        .with_node(yyz())
        .with_node(jfk())
        .with_node(lga())
        .with_node(toronto())
        .with_node(new_york())
        .with_general(
            YYZ,
            vec![GeneralEdge {
                target: jfk(),
                price: 200.0,
                provider: 0,
            }],
        )
        .with_peers(YYZ, vec![toronto()])
        .with_peers(JFK, vec![new_york()])
        .with_peers(LGA, vec![new_york()])
        .with_peers(NEW_YORK, vec![jfk(), lga()])
        .with_through(JFK, vec![lga()])
        .with_through(LGA, vec![jfk()])
}

async fn scenario_adapter(graph: Arc<FakeGraphStore>, ttl: Duration) -> GraphAdapter {
    GraphAdapter::new(
        NodeId::new(NEW_YORK),
        NodeId::new(TORONTO),
        graph,
        Arc::new(FakeHeuristicStore::default()),
        ttl,
    )
    .await
    .unwrap()
}

fn expected(pairs: &[(i64, &[f64])]) -> HashMap<NodeId, Vec<f64>> {
    pairs
        .iter()
        .map(|(id, weights)| (NodeId::new(*id), weights.to_vec()))
        .collect()
}

mod connection_tests {
    use super::*;

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let graph = Arc::new(scenario_store());
        let adapter = scenario_adapter(Arc::clone(&graph), DAY).await;

        assert_eq!(
            adapter.connections(NodeId::new(YYZ)).await.unwrap(),
            expected(&[(JFK, &[200.0]), (TORONTO, &[BELONGS_TO_CITY_COST])])
        );
        assert_eq!(
            adapter.connections(NodeId::new(JFK)).await.unwrap(),
            expected(&[
                (LGA, &[BELONGS_TO_THROUGH_COST]),
                (NEW_YORK, &[BELONGS_TO_CITY_COST])
            ])
        );
        assert_eq!(
            adapter.connections(NodeId::new(NEW_YORK)).await.unwrap(),
            expected(&[
                (JFK, &[BELONGS_TO_CITY_COST]),
                (LGA, &[BELONGS_TO_CITY_COST])
            ])
        );
        // A city that is not the search source exposes no neighbours
        assert_eq!(
            adapter.connections(NodeId::new(TORONTO)).await.unwrap(),
            expected(&[])
        );

        // Every node discovered along the way is registered once
        let directory = adapter.directory();
        assert_eq!(directory.get(NodeId::new(JFK)), Some(jfk()));
        assert_eq!(directory.get(NodeId::new(LGA)), Some(lga()));
        assert_eq!(directory.get(NodeId::new(TORONTO)), Some(toronto()));
        assert_eq!(directory.get(NodeId::new(NEW_YORK)), Some(new_york()));
        // YYZ was only ever a query source, never discovered
        assert_eq!(directory.get(NodeId::new(YYZ)), None);
    }

    #[tokio::test]
    async fn test_connections_idempotent_within_ttl() {
        let graph = Arc::new(scenario_store());
        let adapter = scenario_adapter(Arc::clone(&graph), DAY).await;

        let first = adapter.connections(NodeId::new(YYZ)).await.unwrap();
        let second = adapter.connections(NodeId::new(YYZ)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(graph.general_calls.load(Ordering::SeqCst), 1);
        assert_eq!(graph.peers_calls.load(Ordering::SeqCst), 1);
        assert_eq!(graph.through_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_parallel_edges_keep_store_order() {
        let graph = Arc::new(
            FakeGraphStore::default().with_node(new_york()).with_general(
                YYZ,
                vec![
                    GeneralEdge {
                        target: jfk(),
                        price: 100.0,
                        provider: 0,
                    },
                    GeneralEdge {
                        target: jfk(),
                        price: 150.0,
                        provider: 1,
                    },
                ],
            ),
        );
        let adapter = scenario_adapter(Arc::clone(&graph), DAY).await;

        let set = adapter.connection_set(NodeId::new(YYZ)).await.unwrap();
        assert_eq!(set.weights()[&NodeId::new(JFK)], vec![100.0, 150.0]);

        // Metadata stays index-aligned with the weights
        let info = &set.info()[&NodeId::new(JFK)];
        assert_eq!(info.len(), 2);
        assert_eq!(info[0].provider, 0);
        assert_eq!(info[1].provider, 1);
    }

    #[tokio::test]
    async fn test_belongs_to_never_overwrites_general() {
        // JFK is already priced from YYZ when the through-city pass sees it
        let graph = Arc::new(
            FakeGraphStore::default()
                .with_node(new_york())
                .with_general(
                    YYZ,
                    vec![GeneralEdge {
                        target: jfk(),
                        price: 100.0,
                        provider: 0,
                    }],
                )
                .with_through(YYZ, vec![jfk()]),
        );
        let adapter = scenario_adapter(Arc::clone(&graph), DAY).await;

        assert_eq!(
            adapter.connections(NodeId::new(YYZ)).await.unwrap(),
            expected(&[(JFK, &[100.0])])
        );
    }

    #[tokio::test]
    async fn test_staleness_refreshes_only_general_edges() {
        // Zero TTL: every lookup after the first finds a stale entry
        let graph = Arc::new(scenario_store());
        let adapter = scenario_adapter(Arc::clone(&graph), Duration::ZERO).await;

        let first = adapter.connections(NodeId::new(YYZ)).await.unwrap();
        assert_eq!(graph.general_calls.load(Ordering::SeqCst), 1);

        let second = adapter.connections(NodeId::new(YYZ)).await.unwrap();

        // One more general fetch, no belongs-to re-fetch
        assert_eq!(graph.general_calls.load(Ordering::SeqCst), 2);
        assert_eq!(graph.peers_calls.load(Ordering::SeqCst), 1);
        assert_eq!(graph.through_calls.load(Ordering::SeqCst), 1);

        // Belongs-to-derived entries survive the refresh, general entries
        // are rebuilt rather than doubled
        assert_eq!(first, second);
        assert_eq!(
            second,
            expected(&[(JFK, &[200.0]), (TORONTO, &[BELONGS_TO_CITY_COST])])
        );
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = scenario_store();
        store.fail_general = true;
        let adapter = scenario_adapter(Arc::new(store), DAY).await;

        let result = adapter.connections(NodeId::new(YYZ)).await;
        assert!(matches!(result, Err(FarepathError::Storage(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_single_flight() {
        let mut store = scenario_store();
        store.general_delay = Some(Duration::from_millis(20));
        let graph = Arc::new(store);
        let adapter = Arc::new(scenario_adapter(Arc::clone(&graph), DAY).await);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let adapter = Arc::clone(&adapter);
                tokio::spawn(async move { adapter.connections(NodeId::new(YYZ)).await.unwrap() })
            })
            .collect();

        let expected_map = expected(&[(JFK, &[200.0]), (TORONTO, &[BELONGS_TO_CITY_COST])]);
        for handle in handles {
            assert_eq!(handle.await.unwrap(), expected_map);
        }

        // All eight callers were served by a single refresh
        assert_eq!(graph.general_calls.load(Ordering::SeqCst), 1);
        assert_eq!(graph.peers_calls.load(Ordering::SeqCst), 1);
        assert_eq!(graph.through_calls.load(Ordering::SeqCst), 1);

        // A different node still gets its own fetch
        adapter.connections(NodeId::new(JFK)).await.unwrap();
        assert_eq!(graph.general_calls.load(Ordering::SeqCst), 2);
    }
}

mod heuristic_tests {
    use super::*;

    #[tokio::test]
    async fn test_lazy_creation_per_source_and_target() {
        let store = Arc::new(FakeHeuristicStore::default());
        let cache = HeuristicCache::new(Arc::clone(&store) as Arc<dyn HeuristicStore>);
        let (s, t1, t2) = (NodeId::new(10), NodeId::new(20), NodeId::new(30));

        // Unseen source: one document creation, zero default returned
        assert_eq!(cache.get_or_compute(s, t1).await.unwrap(), 0.0);
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.add_calls.load(Ordering::SeqCst), 0);

        // Known source, unseen target: entry added to the existing document
        assert_eq!(cache.get_or_compute(s, t2).await.unwrap(), 0.0);
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.add_calls.load(Ordering::SeqCst), 1);

        // Both entries now resolve without further writes
        assert_eq!(cache.get_or_compute(s, t1).await.unwrap(), 0.0);
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.add_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stored_average_is_returned() {
        let store = Arc::new(FakeHeuristicStore::default());
        store.seed(10, 20, 4.5, 3);
        let cache = HeuristicCache::new(Arc::clone(&store) as Arc<dyn HeuristicStore>);

        let avg = cache
            .get_or_compute(NodeId::new(10), NodeId::new(20))
            .await
            .unwrap();
        assert_eq!(avg, 4.5);
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.add_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_f_value_targets_the_fixed_search_target() {
        let graph = Arc::new(scenario_store());
        let heuristic = Arc::new(FakeHeuristicStore::default());
        let adapter = GraphAdapter::new(
            NodeId::new(NEW_YORK),
            NodeId::new(TORONTO),
            graph,
            Arc::clone(&heuristic) as Arc<dyn HeuristicStore>,
            DAY,
        )
        .await
        .unwrap();

        assert_eq!(adapter.f_value(NodeId::new(YYZ)).await.unwrap(), 0.0);

        let docs = heuristic.docs.lock().unwrap();
        let doc = docs.get(&NodeId::new(YYZ)).expect("document for YYZ");
        assert!(doc.contains_key(&NodeId::new(TORONTO)));
    }
}

mod adapter_tests {
    use super::*;

    #[tokio::test]
    async fn test_construction_warms_the_source_node() {
        let graph = Arc::new(scenario_store());
        let adapter = scenario_adapter(Arc::clone(&graph), DAY).await;

        assert_eq!(graph.node_info_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            adapter.directory().get(NodeId::new(NEW_YORK)),
            Some(new_york())
        );
        assert_eq!(adapter.s(), NodeId::new(NEW_YORK));
        assert_eq!(adapter.t(), NodeId::new(TORONTO));
    }

    #[tokio::test]
    async fn test_unknown_source_node_is_left_unregistered() {
        // No node rows at all: the warm-up finds nothing and says nothing
        let graph = Arc::new(FakeGraphStore::default());
        let adapter = scenario_adapter(Arc::clone(&graph), DAY).await;

        assert!(adapter.directory().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_node_prefers_the_directory() {
        let graph = Arc::new(scenario_store());
        let adapter = scenario_adapter(Arc::clone(&graph), DAY).await;
        assert_eq!(graph.node_info_calls.load(Ordering::SeqCst), 1);

        // First resolve hits the store and registers the node
        assert_eq!(
            adapter.resolve_node(NodeId::new(JFK)).await.unwrap(),
            Some(jfk())
        );
        assert_eq!(graph.node_info_calls.load(Ordering::SeqCst), 2);

        // Second resolve is a directory hit
        assert_eq!(
            adapter.resolve_node(NodeId::new(JFK)).await.unwrap(),
            Some(jfk())
        );
        assert_eq!(graph.node_info_calls.load(Ordering::SeqCst), 2);

        // A node the store does not know resolves to None, not an error
        assert_eq!(adapter.resolve_node(NodeId::new(99)).await.unwrap(), None);
    }
}
