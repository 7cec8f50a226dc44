//! Neo4j graph store
//!
//! Cypher-backed [`GraphStore`] over the Bolt protocol. Queries are
//! parameterized and read-only; ordering clauses are part of the store
//! contract (edge identity ascending), not cosmetics.

use super::{GeneralEdge, GraphStore};
use crate::config::GraphStoreConfig;
use crate::graph::{Node, NodeId, AIRPORT_LABEL, CITY_LABEL};
use crate::{FarepathError, Result};
use async_trait::async_trait;
use neo4rs::{query, Graph, Row};
use tracing::{debug, info};

const NODE_INFO_QUERY: &str = "MATCH (n) WHERE id(n) = $id \
     RETURN labels(n)[0] AS label, id(n) AS id, n.code AS code, n.name AS name";

const GENERAL_EDGES_QUERY: &str = "MATCH (a)-[r:Gen]->(b) WHERE id(a) = $id \
     RETURN r.price AS price, r.provider AS provider, \
            labels(b)[0] AS label, id(b) AS id, b.code AS code, b.name AS name \
     ORDER BY id(r)";

// An airport reports the cities it belongs to; the search-source city (and
// only that city) reports its member nodes. Intermediate cities stay opaque
// so the search cannot recurse two hops out of them.
const BELONGS_TO_PEERS_QUERY: &str = "MATCH (a)-[:BelongsTo]->(b:City) WHERE id(a) = $id \
     RETURN labels(b)[0] AS label, id(b) AS id, b.code AS code, b.name AS name \
     UNION \
     MATCH (a:City)<-[:BelongsTo]-(b) WHERE id(a) = $id AND id(a) = $s \
     RETURN labels(b)[0] AS label, id(b) AS id, b.code AS code, b.name AS name";

const BELONGS_TO_THROUGH_CITY_QUERY: &str =
    "MATCH (a)-[r1:BelongsTo]->(b:City)-[r2:BelongsTo]-(c) WHERE id(a) = $id \
     RETURN labels(c)[0] AS label, id(c) AS id, c.code AS code, c.name AS name \
     ORDER BY id(r2)";

/// [`GraphStore`] implementation over a Neo4j Bolt endpoint
pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    /// Connect with the configured endpoint and credentials
    pub async fn connect(config: &GraphStoreConfig) -> Result<Self> {
        info!(uri = %config.uri, user = %config.user, "Connecting to graph database");
        let graph = Graph::new(&config.uri, &config.user, &config.password).await?;
        Ok(Self { graph })
    }

    /// Run a node-returning query and decode every row
    async fn fetch_nodes(&self, q: neo4rs::Query) -> Result<Vec<Node>> {
        let mut rows = self.graph.execute(q).await?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await? {
            nodes.push(decode_node(&row)?);
        }
        Ok(nodes)
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn node_info(&self, id: NodeId) -> Result<Option<Node>> {
        debug!(node = %id, "fetching node info");
        let mut rows = self
            .graph
            .execute(query(NODE_INFO_QUERY).param("id", id.as_i64()))
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(decode_node(&row)?)),
            None => Ok(None),
        }
    }

    async fn general_edges(&self, source: NodeId) -> Result<Vec<GeneralEdge>> {
        debug!(node = %source, "fetching general edges");
        let mut rows = self
            .graph
            .execute(query(GENERAL_EDGES_QUERY).param("id", source.as_i64()))
            .await?;

        let mut edges = Vec::new();
        while let Some(row) = rows.next().await? {
            edges.push(GeneralEdge {
                target: decode_node(&row)?,
                price: column(&row, "price")?,
                provider: column(&row, "provider")?,
            });
        }
        Ok(edges)
    }

    async fn belongs_to_peers(&self, source: NodeId, search_source: NodeId) -> Result<Vec<Node>> {
        debug!(node = %source, "fetching belongs-to peers");
        self.fetch_nodes(
            query(BELONGS_TO_PEERS_QUERY)
                .param("id", source.as_i64())
                .param("s", search_source.as_i64()),
        )
        .await
    }

    async fn belongs_to_through_city(
        &self,
        source: NodeId,
        _search_source: NodeId,
    ) -> Result<Vec<Node>> {
        debug!(node = %source, "fetching through-city neighbours");
        self.fetch_nodes(query(BELONGS_TO_THROUGH_CITY_QUERY).param("id", source.as_i64()))
            .await
    }
}

/// Read a column, turning deserialization problems into parse errors
fn column<'a, T: serde::Deserialize<'a>>(row: &'a Row, name: &str) -> Result<T> {
    row.get::<T>(name)
        .map_err(|e| FarepathError::Parse(format!("bad column {}: {}", name, e)))
}

/// Build a [`Node`] from the label/id/code/name columns every node query returns
fn decode_node(row: &Row) -> Result<Node> {
    let label: String = column(row, "label")?;
    let id: i64 = column(row, "id")?;

    match label.as_str() {
        AIRPORT_LABEL => {
            let code: Option<String> = column(row, "code")?;
            let code = code.ok_or_else(|| {
                FarepathError::Parse(format!("airport node {} has no code property", id))
            })?;
            Ok(Node::airport(id, code))
        }
        CITY_LABEL => {
            let name: Option<String> = column(row, "name")?;
            let name = name.ok_or_else(|| {
                FarepathError::Parse(format!("city node {} has no name property", id))
            })?;
            Ok(Node::city(id, name))
        }
        other => Err(FarepathError::Parse(format!(
            "unknown node label: {}",
            other
        ))),
    }
}
