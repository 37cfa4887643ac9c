use serde::{Serialize, Deserialize};
use crate::core::types::{DocumentHandle, NodeId};

/// Page of permitted hits returned to the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub hits: Vec<DocumentHandle>,
    /// Exact in count-only mode and once every hit was examined,
    /// otherwise the engine's hit count minus the denials seen so far.
    pub total_count: usize,
    pub rounds: usize,      // scoring rounds run against the engine
    pub examined: usize,    // raw candidates passed to the permission filter
}

impl QueryResult {
    pub fn count_only(total_count: usize, rounds: usize, examined: usize) -> Self {
        QueryResult {
            hits: Vec::new(),
            total_count,
            rounds,
            examined,
        }
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.hits.iter().map(|h| h.node_id).collect()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
