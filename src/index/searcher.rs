use std::sync::Arc;
use crate::core::context::SortField;
use crate::core::error::Result;
use crate::core::types::DocumentHandle;
use crate::index::collector::TopDocs;
use crate::index::query::EngineQuery;

/// Position of a document inside one snapshot
pub type DocAddress = u32;

/// One scoring round: keep the best `skip + top` hits and return the
/// `top` after the first `skip`
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub top: usize,
    pub skip: usize,
    pub sort: &'a [SortField],
}

impl<'a> SearchRequest<'a> {
    pub fn new(top: usize, skip: usize, sort: &'a [SortField]) -> Self {
        SearchRequest { top, skip, sort }
    }

    /// Size of the collector the engine has to fill.
    pub fn collector_size(&self) -> usize {
        self.skip.saturating_add(self.top)
    }
}

/// Search capability of a consistent, read-only index snapshot
pub trait IndexSearcher: Send + Sync {
    /// Live (non-deleted) documents in the snapshot.
    fn num_docs(&self) -> usize;

    fn search(&self, query: &EngineQuery, request: &SearchRequest<'_>) -> Result<TopDocs>;

    /// Stream every match in address order without ranking. The visitor
    /// returns `false` to stop early. Returns the number of visited matches.
    fn visit(&self, query: &EngineQuery, visitor: &mut dyn FnMut(DocAddress) -> Result<bool>) -> Result<usize>;

    /// Materialize a hit with the requested stored fields.
    fn handle(&self, doc: DocAddress, fields: &[String]) -> Result<DocumentHandle>;

    fn version(&self) -> u64 {
        0
    }
}

/// Hands out searchers. `refresh = false` may return a stale snapshot
/// instead of reopening the index.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self, refresh: bool) -> Result<Arc<dyn IndexSearcher>>;
}
