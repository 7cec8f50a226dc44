//! Node identity and metadata
//!
//! Nodes come in two kinds - airports and cities - and are identified by the
//! integer id the graph database assigned them. A node is created on first
//! sighting in a store result and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label the graph database uses for airport nodes
pub const AIRPORT_LABEL: &str = "Airport";
/// Label the graph database uses for city nodes
pub const CITY_LABEL: &str = "City";

/// Type-safe wrapper for store-assigned node ids
///
/// The id is opaque to farepath; it is whatever the graph database handed
/// out. Wrapping it keeps node ids from being mixed up with prices, provider
/// ids, and other integers floating through the cache layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(i64);

impl NodeId {
    /// Create a NodeId from a raw store id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw store id
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

/// Node kind with its discriminating attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// A transportation node (IATA-style code)
    Airport { code: String },
    /// A city grouping its member transportation nodes
    City { name: String },
}

/// A graph node: store id plus kind
///
/// Equality is structural over (id, kind, attribute), so two sightings of the
/// same store row compare equal and a stale directory entry with a different
/// attribute would not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    #[serde(flatten)]
    kind: NodeKind,
}

impl Node {
    /// Create an airport node
    pub fn airport(id: impl Into<NodeId>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Airport { code: code.into() },
        }
    }

    /// Create a city node
    pub fn city(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::City { name: name.into() },
        }
    }

    /// The store-assigned id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node kind and attribute
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether this node is a city
    pub fn is_city(&self) -> bool {
        matches!(self.kind, NodeKind::City { .. })
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Airport { code } => write!(f, "Airport({}, {})", self.id, code),
            NodeKind::City { name } => write!(f, "City({}, {})", self.id, name),
        }
    }
}
