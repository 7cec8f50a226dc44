//! Backing-store seams
//!
//! The caches talk to two collaborators through the traits here: a
//! [`GraphStore`] holding the property graph of airports, cities, and priced
//! connections, and a [`HeuristicStore`] holding average-price documents.
//! Both are object-safe async traits so production backends and
//! call-counting test fakes slot in interchangeably.
//!
//! Every trait method that performs a lookup distinguishes "not found" from
//! failure in its return type; errors are reserved for genuine query or
//! transport problems.

mod neo4j;
mod sqlite;

pub use neo4j::Neo4jGraphStore;
pub use sqlite::SqliteHeuristicStore;

use crate::graph::{Node, NodeId};
use crate::Result;
use async_trait::async_trait;

/// One priced, directed connection returned by the graph store
///
/// Carries the full target node so the cache can register nodes it discovers
/// through edges without a second round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralEdge {
    /// The node this connection leads to
    pub target: Node,
    /// Offer price (the edge weight)
    pub price: f64,
    /// Provider that published the offer
    pub provider: i64,
}

/// One (average, sample count) entry of an averages document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Average {
    /// Running average price
    pub avg: f64,
    /// Number of samples behind the average
    pub samples: u32,
}

impl Average {
    /// The zero default materialized for unseen (source, target) pairs
    pub fn zero() -> Self {
        Self {
            avg: 0.0,
            samples: 0,
        }
    }
}

/// Outcome of an average lookup
///
/// A three-way variant instead of typed not-found errors: both missing
/// states are ordinary values the heuristic cache branches on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AverageLookup {
    /// The document exists and holds an entry for the target
    Found(f64),
    /// No document exists for the source at all
    DocumentMissing,
    /// The source's document exists but has no entry for the target
    EntryMissing,
}

/// Property-graph collaborator
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Metadata for a single node, or `None` if the store has no such node
    async fn node_info(&self, id: NodeId) -> Result<Option<Node>>;

    /// Priced connections leaving `source`, ordered by edge identity ascending
    ///
    /// The order is a contract: the cache preserves it in the weight lists it
    /// hands to the search.
    async fn general_edges(&self, source: NodeId) -> Result<Vec<GeneralEdge>>;

    /// Belongs-to peers of `source`
    ///
    /// For a transportation node: the city (or cities) it belongs to. For the
    /// city equal to `search_source`: its member nodes. Any other city yields
    /// nothing - a search must not recurse two hops out of an intermediate
    /// city.
    async fn belongs_to_peers(&self, source: NodeId, search_source: NodeId) -> Result<Vec<Node>>;

    /// Second-hop neighbours through `source`'s city, ordered by second-hop
    /// edge identity ascending
    async fn belongs_to_through_city(
        &self,
        source: NodeId,
        search_source: NodeId,
    ) -> Result<Vec<Node>>;
}

/// Average-price document collaborator
///
/// Documents are keyed by source node; each maps target ids to
/// [`Average`] entries. Creation calls return the entry they materialized so
/// the caller can hand its value straight to the search.
#[async_trait]
pub trait HeuristicStore: Send + Sync {
    /// Three-way lookup of the average from `source` to `target`
    async fn find_average(&self, source: NodeId, target: NodeId) -> Result<AverageLookup>;

    /// Create the source's document with a zero entry for `target`
    async fn create_document(&self, source: NodeId, target: NodeId) -> Result<Average>;

    /// Add a zero entry for `target` to the source's existing document
    async fn add_entry(&self, source: NodeId, target: NodeId) -> Result<Average>;
}
