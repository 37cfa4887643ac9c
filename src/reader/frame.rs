use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use crate::core::error::Result;
use crate::core::types::DocumentHandle;
use crate::index::collector::TopDocs;
use crate::index::query::EngineQuery;
use crate::index::searcher::{DocAddress, IndexSearcher, SearchRequest};

/// Scoped access to one index snapshot. Released when dropped, on every
/// exit path of the code holding it.
pub struct IndexReaderFrame {
    searcher: Arc<dyn IndexSearcher>,
    active: Arc<AtomicUsize>,
}

impl IndexReaderFrame {
    pub(crate) fn new(searcher: Arc<dyn IndexSearcher>, active: Arc<AtomicUsize>) -> Self {
        IndexReaderFrame { searcher, active }
    }

    pub fn num_docs(&self) -> usize {
        self.searcher.num_docs()
    }

    pub fn version(&self) -> u64 {
        self.searcher.version()
    }

    pub fn search(&self, query: &EngineQuery, request: &SearchRequest<'_>) -> Result<TopDocs> {
        self.searcher.search(query, request)
    }

    pub fn visit(&self, query: &EngineQuery, visitor: &mut dyn FnMut(DocAddress) -> Result<bool>) -> Result<usize> {
        self.searcher.visit(query, visitor)
    }

    pub fn handle(&self, doc: DocAddress, fields: &[String]) -> Result<DocumentHandle> {
        self.searcher.handle(doc, fields)
    }
}

impl Drop for IndexReaderFrame {
    fn drop(&mut self) {
        let remaining = self.active.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!(version = self.searcher.version(), active = remaining, "released index reader frame");
    }
}
