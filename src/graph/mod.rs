//! Core graph types and caches
//!
//! Defines Node, NodeDirectory, ConnectionCache, HeuristicCache, and the
//! GraphAdapter facade the path search consumes.

mod adapter;
mod connections;
mod directory;
mod heuristic;
mod node;

pub use adapter::GraphAdapter;
pub use connections::{
    ConnectionCache, ConnectionSet, EdgeInfo, BELONGS_TO_CITY_COST, BELONGS_TO_THROUGH_COST,
};
pub use directory::NodeDirectory;
pub use heuristic::HeuristicCache;
pub use node::{Node, NodeId, NodeKind, AIRPORT_LABEL, CITY_LABEL};
