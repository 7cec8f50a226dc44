//! Farepath - Lazy Connection Graph Cache for Trip Search
//!
//! Farepath sits between a shortest-path search and two backing stores: a
//! property graph of airports, cities, and priced connections (Neo4j), and a
//! document store of average trip prices (SQLite). It answers repeated
//! `connections(n)` / `f_value(n)` queries from the search without hitting
//! the graph database on every node visit, and refreshes only the volatile
//! priced edges when a cached neighbourhood expires.
//!
//! # Architecture
//!
//! - **graph**: Core types and caches (Node, NodeDirectory, ConnectionCache,
//!   HeuristicCache, GraphAdapter)
//! - **store**: Backing-store seams (GraphStore, HeuristicStore) and their
//!   Neo4j/SQLite implementations
//! - **config**: YAML configuration for store endpoints and cache TTL
//! - **error**: Typed error propagation up to the search consumer

// Core modules
pub mod config;
pub mod error;
pub mod graph;
pub mod store;

// Infrastructure
pub mod logging;

// Re-exports
pub use error::{FarepathError, Result};
