//! Configuration system
//!
//! Loads ~/.config/farepath/config.yaml with the backing-store endpoints and
//! the connection-cache TTL. Search endpoints (the fixed source and target of
//! a run) are not configuration; they arrive per invocation.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Graph database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStoreConfig {
    /// Bolt endpoint of the graph database
    #[serde(default = "default_graph_uri")]
    pub uri: String,

    /// Database user
    #[serde(default = "default_graph_user")]
    pub user: String,

    /// Database password
    #[serde(default)]
    pub password: String,
}

fn default_graph_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_graph_user() -> String {
    "neo4j".to_string()
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self {
            uri: default_graph_uri(),
            user: default_graph_user(),
            password: String::new(),
        }
    }
}

/// Average-price store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicStoreConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,

    /// Enable WAL mode for better concurrency
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

fn default_wal_mode() -> bool {
    true
}

impl Default for HeuristicStoreConfig {
    fn default() -> Self {
        // Always use ~/.config for consistency across platforms (macOS, Linux)
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("farepath");
        path.push("averages.db");

        Self {
            path,
            wal_mode: default_wal_mode(),
        }
    }
}

/// Connection-cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Hours before a cached connection set is considered stale
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

fn default_ttl_hours() -> u64 {
    24
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
        }
    }
}

impl CacheConfig {
    /// The TTL as a Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours * 3600)
    }
}

/// Farepath configuration
///
/// Represents the complete ~/.config/farepath/config.yaml file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarepathConfig {
    /// Graph database connection
    #[serde(default)]
    pub graph_store: GraphStoreConfig,

    /// Average-price store
    #[serde(default)]
    pub heuristic_store: HeuristicStoreConfig,

    /// Connection cache behavior
    #[serde(default)]
    pub cache: CacheConfig,
}

impl FarepathConfig {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file path (~/.config/farepath/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("farepath");
        path.push("config.yaml");
        path
    }

    /// Load configuration from the default path
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::FarepathError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading farepath configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            graph_uri = %config.graph_store.uri,
            ttl_hours = config.cache.ttl_hours,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;

        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }
}
