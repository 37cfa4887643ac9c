use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use crate::core::error::Result;
use crate::index::searcher::SnapshotSource;
use crate::reader::frame::IndexReaderFrame;

/// Hands out index reader frames over a snapshot source
pub struct ReaderPool {
    pub source: Arc<dyn SnapshotSource>,
    active: Arc<AtomicUsize>,
}

impl ReaderPool {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        ReaderPool {
            source,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Open a frame on a consistent snapshot. `quick` accepts the last
    /// opened snapshot instead of refreshing the reader.
    pub fn acquire(&self, quick: bool) -> Result<IndexReaderFrame> {
        let searcher = self.source.snapshot(!quick)?;
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(quick, version = searcher.version(), active, "acquired index reader frame");
        Ok(IndexReaderFrame::new(searcher, self.active.clone()))
    }

    /// Frames acquired and not yet released.
    pub fn active_frames(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::inverted::{IndexDocument, MemoryIndex};
    use crate::schema::schema::FieldRegistry;

    #[test]
    fn quick_frames_reuse_the_published_snapshot() {
        let index = Arc::new(MemoryIndex::new(Arc::new(FieldRegistry::with_content_fields())).unwrap());
        index.add(IndexDocument::new(1, true, true));
        let pool = ReaderPool::new(index.clone());

        let quick = pool.acquire(true).unwrap();
        assert_eq!(quick.num_docs(), 0);
        let fresh = pool.acquire(false).unwrap();
        assert_eq!(fresh.num_docs(), 1);
        assert_eq!(pool.active_frames(), 2);

        index.add(IndexDocument::new(2, true, true));
        assert_eq!(fresh.num_docs(), 1);

        drop(quick);
        drop(fresh);
        assert_eq!(pool.active_frames(), 0);
    }
}
