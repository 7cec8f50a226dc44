//! Error types for Farepath
//!
//! Defines a single error enum covering all failure modes across the system.
//! Uses thiserror for ergonomic error handling.
//!
//! Store "not found" conditions are deliberately NOT errors: a missing node
//! row leaves the node unregistered, and a missing averages document or entry
//! drives lazy creation. Only genuine query/transport failures surface here,
//! and they propagate to the adapter boundary untouched so the search
//! consumer can abort.

use crate::graph::NodeId;
use thiserror::Error;

/// Result type alias for Farepath operations
pub type Result<T> = std::result::Result<T, FarepathError>;

/// Error type for Farepath operations
#[derive(Error, Debug)]
pub enum FarepathError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage errors not covered by a backend-specific variant
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed store responses (unknown labels, missing properties)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Node lookup requested by a caller that expects the node to exist
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Graph database errors
    #[error("Graph database error: {0}")]
    Graph(#[from] neo4rs::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
