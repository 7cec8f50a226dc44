//! Heuristic cache
//!
//! Supplies the search's f-value: the average observed price from a node to
//! the fixed target, held in a lazily-populated external document store.
//! Unseen (source, target) pairs materialize as zero-valued defaults; the
//! running-average update that later fills them in lives outside this crate.

use super::node::NodeId;
use crate::store::{AverageLookup, HeuristicStore};
use crate::Result;
use std::sync::Arc;
use tracing::debug;

/// Lazy view over the average-price document store
pub struct HeuristicCache {
    store: Arc<dyn HeuristicStore>,
}

impl HeuristicCache {
    /// Create a cache over the given store
    pub fn new(store: Arc<dyn HeuristicStore>) -> Self {
        Self { store }
    }

    /// The expected cost from `source` to `target`
    ///
    /// Missing documents and missing entries are not errors: either one is
    /// created on the spot with a zero default, which is also the returned
    /// value. Store failures propagate.
    pub async fn get_or_compute(&self, source: NodeId, target: NodeId) -> Result<f64> {
        match self.store.find_average(source, target).await? {
            AverageLookup::Found(avg) => Ok(avg),
            AverageLookup::DocumentMissing => {
                debug!(%source, %target, "no averages document, creating one");
                let entry = self.store.create_document(source, target).await?;
                Ok(entry.avg)
            }
            AverageLookup::EntryMissing => {
                debug!(%source, %target, "averages document lacks target, adding entry");
                let entry = self.store.add_entry(source, target).await?;
                Ok(entry.avg)
            }
        }
    }
}
