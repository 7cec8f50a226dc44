//! Farepath - Lazy Connection Graph Cache for Trip Search
//!
//! Main entry point for the farepath CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use farepath::config::FarepathConfig;
use farepath::graph::{GraphAdapter, NodeId};
use farepath::store::{Neo4jGraphStore, SqliteHeuristicStore};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Farepath - connection graph queries for trip search
#[derive(Parser, Debug)]
#[command(name = "farepath")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/farepath/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file
    Init,

    /// Show a node's metadata
    Node {
        /// Store-assigned node id
        id: i64,
    },

    /// List the cached connections of a node
    Connections {
        /// Fixed search source node id
        #[arg(short, long)]
        source: i64,

        /// Fixed search target node id
        #[arg(short, long)]
        target: i64,

        /// Node whose neighbours to list
        node: i64,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the heuristic f-value of a node
    Fvalue {
        /// Fixed search source node id
        #[arg(short, long)]
        source: i64,

        /// Fixed search target node id
        #[arg(short, long)]
        target: i64,

        /// Node to evaluate
        node: i64,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = farepath::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init = cli.command {
        return handle_init(cli.config);
    }

    let config = match &cli.config {
        Some(path) => FarepathConfig::load(path)?,
        None => FarepathConfig::load_default()
            .context("no configuration found; run 'farepath init' first")?,
    };

    match cli.command {
        Commands::Init => unreachable!("handled above"),

        Commands::Node { id } => {
            let store = Neo4jGraphStore::connect(&config.graph_store).await?;
            match farepath::store::GraphStore::node_info(&store, NodeId::new(id)).await? {
                Some(node) => println!("{}", node),
                None => return Err(farepath::FarepathError::NodeNotFound(NodeId::new(id)).into()),
            }
        }

        Commands::Connections {
            source,
            target,
            node,
            json,
        } => {
            let adapter = build_adapter(&config, source, target).await?;
            let connections = adapter.connections(NodeId::new(node)).await?;

            // Sort for stable output
            let sorted: BTreeMap<i64, Vec<f64>> = connections
                .into_iter()
                .map(|(id, weights)| (id.as_i64(), weights))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&sorted)?);
            } else {
                println!("Connections of node {} ({} targets):", node, sorted.len());
                for (target_id, weights) in sorted {
                    let label = adapter
                        .resolve_node(NodeId::new(target_id))
                        .await?
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| target_id.to_string());
                    println!("  {} -> {:?}", label, weights);
                }
            }
        }

        Commands::Fvalue {
            source,
            target,
            node,
        } => {
            let adapter = build_adapter(&config, source, target).await?;
            let value = adapter.f_value(NodeId::new(node)).await?;
            println!("{}", value);
        }
    }

    Ok(())
}

/// Wire the production stores into an adapter for the given endpoints
async fn build_adapter(
    config: &FarepathConfig,
    source: i64,
    target: i64,
) -> anyhow::Result<GraphAdapter> {
    let graph_store = Neo4jGraphStore::connect(&config.graph_store)
        .await
        .context("connecting to the graph database")?;
    let heuristic_store = SqliteHeuristicStore::new(&config.heuristic_store)
        .context("opening the averages database")?;

    let adapter = GraphAdapter::new(
        NodeId::new(source),
        NodeId::new(target),
        Arc::new(graph_store),
        Arc::new(heuristic_store),
        config.cache.ttl(),
    )
    .await?;

    Ok(adapter)
}

fn handle_init(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(FarepathConfig::default_path);

    if path.exists() {
        anyhow::bail!("config already exists at {}", path.display());
    }

    FarepathConfig::new().save(&path)?;
    println!("Wrote default config to {}", path.display());
    println!("Edit the graph database endpoint and credentials before first use.");

    Ok(())
}
