use tracing::debug;
use crate::core::cancel::CancellationToken;
use crate::core::config::GrowthBudgets;
use crate::core::context::ExecutionMode;
use crate::core::error::Result;
use crate::query::compiler::CompiledQuery;
use crate::reader::frame::IndexReaderFrame;
use crate::reader::reader_pool::ReaderPool;
use crate::index::searcher::SearchRequest;
use crate::search::results::QueryResult;
use crate::security::filter::PermissionFilter;

/// Runs a compiled query in growing scoring rounds until enough permitted
/// hits are collected
pub struct PaginatedExecutor {
    pub budgets: GrowthBudgets,
}

impl PaginatedExecutor {
    pub fn new(budgets: GrowthBudgets) -> Self {
        PaginatedExecutor { budgets }
    }

    /// Acquire a frame, execute, and release the frame on every exit path.
    /// Engine errors are returned as they are; nothing is retried.
    pub fn execute(
        &self,
        compiled: &CompiledQuery,
        pool: &ReaderPool,
        filter: &dyn PermissionFilter,
        cancel: &CancellationToken,
    ) -> Result<QueryResult> {
        cancel.check("frame acquisition")?;
        let frame = pool.acquire(compiled.mode == ExecutionMode::Quick)?;

        if compiled.count_only {
            return self.count(compiled, &frame, filter, cancel);
        }
        if filter.is_unrestricted() {
            return self.single_round(compiled, &frame, cancel);
        }
        self.paged(compiled, &frame, filter, cancel)
    }

    fn wanted(compiled: &CompiledQuery) -> usize {
        if compiled.top == 0 { usize::MAX } else { compiled.top }
    }

    /// Nothing will be filtered out, so one round of exactly `skip + top`.
    fn single_round(&self, compiled: &CompiledQuery, frame: &IndexReaderFrame, cancel: &CancellationToken) -> Result<QueryResult> {
        cancel.check("round 1")?;
        let top = Self::wanted(compiled).min(frame.num_docs());
        let top_docs = frame.search(&compiled.query, &SearchRequest::new(top, compiled.skip, &compiled.sort))?;

        let mut hits = Vec::with_capacity(top_docs.hits.len());
        for score_doc in &top_docs.hits {
            hits.push(frame.handle(score_doc.doc, &compiled.fields)?);
        }
        debug!(total_hits = top_docs.total_hits, returned = hits.len(), "executed unrestricted query");

        Ok(QueryResult {
            examined: hits.len(),
            hits,
            total_count: top_docs.total_hits,
            rounds: 1,
        })
    }

    fn paged(
        &self,
        compiled: &CompiledQuery,
        frame: &IndexReaderFrame,
        filter: &dyn PermissionFilter,
        cancel: &CancellationToken,
    ) -> Result<QueryResult> {
        let wanted = Self::wanted(compiled);
        let num_docs = frame.num_docs();

        let mut hits = Vec::new();
        let mut user_skip = compiled.skip;   // permitted hits still to drop
        let mut raw_offset = 0usize;         // raw hits consumed by earlier rounds
        let mut denied = 0usize;
        let mut examined = 0usize;
        let mut total_hits = 0usize;
        let mut rounds = 0usize;

        for budget in self.budgets.schedule(compiled.skip.saturating_add(wanted)) {
            cancel.check("scoring")?;
            if raw_offset >= num_docs {
                break;
            }
            let how_many = budget.min(num_docs - raw_offset);
            let top_docs = frame.search(&compiled.query, &SearchRequest::new(how_many, raw_offset, &compiled.sort))?;
            rounds += 1;
            total_hits = top_docs.total_hits;
            let round_hits = top_docs.hits.len();
            let round_denied = denied;

            for score_doc in &top_docs.hits {
                cancel.check("permission filtering")?;
                examined += 1;
                let handle = frame.handle(score_doc.doc, &compiled.fields)?;
                if !filter.is_permitted(handle.node_id, handle.is_last_public, handle.is_last_draft) {
                    denied += 1;
                    continue;
                }
                if user_skip > 0 {
                    user_skip -= 1;
                    continue;
                }
                hits.push(handle);
                if hits.len() >= wanted {
                    break;
                }
            }
            raw_offset += round_hits;

            debug!(
                round = rounds,
                budget = how_many,
                returned = round_hits,
                denied = denied - round_denied,
                collected = hits.len(),
                total_hits,
                "executed scoring round"
            );

            let satisfied = hits.len() >= wanted;
            let exhausted = round_hits < how_many || raw_offset >= total_hits;
            if satisfied || exhausted {
                break;
            }
        }

        Ok(QueryResult {
            hits,
            total_count: total_hits.saturating_sub(denied),
            rounds,
            examined,
        })
    }

    /// Exact count without building a page.
    fn count(
        &self,
        compiled: &CompiledQuery,
        frame: &IndexReaderFrame,
        filter: &dyn PermissionFilter,
        cancel: &CancellationToken,
    ) -> Result<QueryResult> {
        cancel.check("counting")?;
        if filter.is_unrestricted() {
            let top_docs = frame.search(&compiled.query, &SearchRequest::new(1, 0, &[]))?;
            return Ok(QueryResult::count_only(top_docs.total_hits, 1, 0));
        }

        let mut permitted = 0usize;
        let visited = frame.visit(&compiled.query, &mut |doc| {
            cancel.check("permission filtering")?;
            let handle = frame.handle(doc, &[])?;
            if filter.is_permitted(handle.node_id, handle.is_last_public, handle.is_last_draft) {
                permitted += 1;
            }
            Ok(true)
        })?;
        debug!(visited, permitted, "counted query hits");

        Ok(QueryResult::count_only(permitted, 1, visited))
    }
}
