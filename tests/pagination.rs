//! Pagination Tests
//!
//! Executor behaviour over permission-filtered result sets:
//! - Skip/top pages line up with a larger page
//! - Growth budgets are walked until enough permitted hits are found
//! - Reader frames are released on success, failure and cancellation

use cql_engine::core::cancel::CancellationToken;
use cql_engine::index::collector::TopDocs;
use cql_engine::index::inverted::{IndexDocument, MemoryIndex};
use cql_engine::index::query::EngineQuery;
use cql_engine::index::searcher::{DocAddress, IndexSearcher, SearchRequest, SnapshotSource};
use cql_engine::schema::schema::FieldRegistry;
use cql_engine::security::permission::{AceInfo, PermissionType};
use cql_engine::security::provider::{MemorySecurityProvider, SecurityProvider};
use cql_engine::{
    DocumentHandle, EngineConfig, Error, ErrorKind, ExecutionMode, GrowthBudgets, NodeId, QueryEngine,
    QuerySettings, Result, SimpleQueryContext,
};
use std::sync::Arc;

const USER: i32 = 42;

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    index: Arc<MemoryIndex>,
    security: Arc<MemorySecurityProvider>,
    fields: Arc<FieldRegistry>,
}

impl Fixture {
    fn new() -> Self {
        let fields = Arc::new(FieldRegistry::with_content_fields());
        Fixture {
            index: Arc::new(MemoryIndex::new(fields.clone()).unwrap()),
            security: Arc::new(MemorySecurityProvider::new()),
            fields,
        }
    }

    /// Documents `1..=count`, visible to USER when `permitted(id)`.
    fn populated(count: i32, permitted: impl Fn(i32) -> bool) -> Self {
        let fx = Fixture::new();
        for id in 1..=count {
            fx.add(id, true, true);
            if permitted(id) {
                fx.grant(id, PermissionType::SEE);
            }
        }
        fx.index.commit().unwrap();
        fx
    }

    fn add(&self, id: i32, is_last_public: bool, is_last_draft: bool) {
        self.index.add(
            IndexDocument::new(id, is_last_public, is_last_draft)
                .field("Id", id)
                .field("Index", id),
        );
    }

    fn grant(&self, id: i32, permission: PermissionType) {
        self.security.set_entries(NodeId(id), vec![AceInfo::allow(USER, &[permission])]);
    }

    fn engine(&self) -> QueryEngine {
        QueryEngine::new(EngineConfig::default(), self.index.clone(), self.security.clone()).unwrap()
    }

    fn context(&self, settings: QuerySettings) -> SimpleQueryContext {
        SimpleQueryContext::new(USER, settings, self.fields.clone())
    }
}

fn ids(engine: &QueryEngine, ctx: &SimpleQueryContext, text: &str) -> Vec<i32> {
    engine.execute(text, ctx).unwrap().node_ids().into_iter().map(|id| id.value()).collect()
}

// =============================================================================
// Paging
// =============================================================================

/// A public, B only a draft, C public; the user may see A and C only.
#[test]
fn test_denied_candidates_are_dropped_from_page_and_count() {
    let fx = Fixture::new();
    fx.add(1, true, false);
    fx.add(2, false, true);
    fx.add(3, true, false);
    fx.grant(1, PermissionType::SEE);
    fx.grant(3, PermissionType::SEE);
    fx.index.commit().unwrap();

    let engine = fx.engine();
    let result = engine.execute("*:*", &fx.context(QuerySettings::default().top(10))).unwrap();
    assert_eq!(result.node_ids(), vec![NodeId(1), NodeId(3)]);
    assert_eq!(result.total_count, 2);
    assert_eq!(result.rounds, 1);
}

#[test]
fn test_skip_pages_line_up_with_larger_page() {
    let fx = Fixture::populated(90, |id| id % 3 != 0);
    let engine = fx.engine();

    let first_twenty = ids(&engine, &fx.context(QuerySettings::default().top(20)), "*:*");
    let second_ten = ids(&engine, &fx.context(QuerySettings::default().top(10).skip(10)), "*:*");

    assert_eq!(first_twenty.len(), 20);
    assert_eq!(second_ten, first_twenty[10..20].to_vec());
    assert!(second_ten.iter().all(|id| id % 3 != 0));
}

#[test]
fn test_skip_past_permitted_hits_returns_empty_page() {
    let fx = Fixture::populated(30, |id| id <= 5);
    let engine = fx.engine();
    let result = engine
        .execute("*:*", &fx.context(QuerySettings::default().top(10).skip(5)))
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(result.total_count, 5);
}

#[test]
fn test_sorted_pages_follow_sort_order() {
    let fx = Fixture::populated(50, |id| id % 2 == 0);
    let engine = fx.engine();
    let settings = QuerySettings::default()
        .top(5)
        .sort_by(cql_engine::SortField::desc("Index"));
    assert_eq!(ids(&engine, &fx.context(settings), "*:*"), vec![50, 48, 46, 44, 42]);
}

#[test]
fn test_heavy_rejection_walks_every_budget() {
    // only the last five of 2000 candidates are visible
    let fx = Fixture::populated(2000, |id| id > 1995);
    let engine = fx.engine();
    let result = engine.execute("*:*", &fx.context(QuerySettings::default().top(10))).unwrap();

    assert_eq!(result.node_ids(), (1996..=2000).map(NodeId).collect::<Vec<_>>());
    assert_eq!(result.total_count, 5);
    assert_eq!(result.rounds, 3);
    assert_eq!(result.examined, 2000);
}

#[test]
fn test_satisfied_page_stops_after_first_round() {
    let fx = Fixture::populated(2000, |id| id % 2 == 0);
    let engine = fx.engine();
    let result = engine.execute("*:*", &fx.context(QuerySettings::default().top(10))).unwrap();

    assert_eq!(result.len(), 10);
    assert_eq!(result.rounds, 1);
    assert!(result.examined <= 100);
}

#[test]
fn test_custom_budgets_are_used() {
    let fx = Fixture::populated(40, |id| id > 30);
    let config = EngineConfig {
        growth_budgets: GrowthBudgets::new(vec![10, 20, 0]).unwrap(),
        ..EngineConfig::default()
    };
    let engine = QueryEngine::new(config, fx.index.clone(), fx.security.clone()).unwrap();
    let result = engine.execute("*:*", &fx.context(QuerySettings::default().top(5))).unwrap();

    assert_eq!(result.node_ids(), (31..=35).map(NodeId).collect::<Vec<_>>());
    assert_eq!(result.rounds, 3);
}

// =============================================================================
// Counting
// =============================================================================

#[test]
fn test_count_only_matches_unbounded_page() {
    let fx = Fixture::populated(300, |id| id % 7 == 0 || id % 5 == 0);
    let engine = fx.engine();

    let page = engine.execute("Index:[10 TO 250]", &fx.context(QuerySettings::default())).unwrap();
    let count = engine
        .execute(
            "Index:[10 TO 250]",
            &fx.context(QuerySettings { count_only: true, ..QuerySettings::default() }),
        )
        .unwrap();

    assert!(count.is_empty());
    assert_eq!(count.total_count, page.len());
    assert_eq!(page.total_count, page.len());
}

#[test]
fn test_system_user_counts_without_filtering() {
    let fx = Fixture::populated(25, |_| false);
    let engine = fx.engine();
    let ctx = SimpleQueryContext::new(
        cql_engine::core::types::SYSTEM_IDENTITY,
        QuerySettings { count_only: true, ..QuerySettings::default() },
        fx.fields.clone(),
    );
    assert_eq!(engine.execute("*:*", &ctx).unwrap().total_count, 25);
}

// =============================================================================
// Snapshots
// =============================================================================

#[test]
fn test_quick_mode_reads_published_snapshot() {
    let fx = Fixture::populated(3, |_| true);
    fx.add(4, true, true);
    fx.grant(4, PermissionType::SEE);

    let engine = fx.engine();
    let quick = fx.context(QuerySettings { mode: ExecutionMode::Quick, ..QuerySettings::default() });
    let fresh = fx.context(QuerySettings::default());

    assert_eq!(ids(&engine, &quick, "*:*"), vec![1, 2, 3]);
    assert_eq!(ids(&engine, &fresh, "*:*"), vec![1, 2, 3, 4]);
    assert_eq!(ids(&engine, &quick, "*:*"), vec![1, 2, 3, 4]);
}

#[test]
fn test_deleted_nodes_disappear_after_refresh() {
    let fx = Fixture::populated(5, |_| true);
    assert_eq!(fx.index.delete_node(NodeId(2)), 1);
    let engine = fx.engine();
    assert_eq!(ids(&engine, &fx.context(QuerySettings::default()), "*:*"), vec![1, 3, 4, 5]);
}

// =============================================================================
// Failures
// =============================================================================

struct FailingSearcher;

impl IndexSearcher for FailingSearcher {
    fn num_docs(&self) -> usize {
        10
    }

    fn search(&self, _query: &EngineQuery, _request: &SearchRequest<'_>) -> Result<TopDocs> {
        Err(Error::engine("segment checksum mismatch"))
    }

    fn visit(&self, _query: &EngineQuery, _visitor: &mut dyn FnMut(DocAddress) -> Result<bool>) -> Result<usize> {
        Err(Error::engine("segment checksum mismatch"))
    }

    fn handle(&self, _doc: DocAddress, _fields: &[String]) -> Result<DocumentHandle> {
        Err(Error::engine("segment checksum mismatch"))
    }
}

struct FailingSource;

impl SnapshotSource for FailingSource {
    fn snapshot(&self, _refresh: bool) -> Result<Arc<dyn IndexSearcher>> {
        Ok(Arc::new(FailingSearcher))
    }
}

#[test]
fn test_engine_errors_propagate_and_release_frame() {
    let fx = Fixture::new();
    let engine = QueryEngine::new(EngineConfig::default(), Arc::new(FailingSource), fx.security.clone()).unwrap();

    for settings in [
        QuerySettings::default().top(10),
        QuerySettings { count_only: true, ..QuerySettings::default() },
    ] {
        let err = engine.execute("*:*", &fx.context(settings)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineExecution);
        assert!(!err.is_retriable());
        assert_eq!(engine.active_frames(), 0);
    }
}

#[test]
fn test_cancelled_before_start() {
    let fx = Fixture::populated(10, |_| true);
    let engine = fx.engine();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = engine
        .execute_with("*:*", &fx.context(QuerySettings::default()), &cancel)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(engine.active_frames(), 0);
}

/// Raises the cancellation signal the first time an ACL is read.
struct CancellingProvider {
    inner: MemorySecurityProvider,
    cancel: CancellationToken,
}

impl SecurityProvider for CancellingProvider {
    fn identities(&self, user_id: i32) -> Result<Vec<i32>> {
        self.inner.identities(user_id)
    }

    fn entries(&self, node_id: NodeId) -> Result<Vec<AceInfo>> {
        self.cancel.cancel();
        self.inner.entries(node_id)
    }
}

#[test]
fn test_cancelled_while_filtering() {
    let fx = Fixture::populated(50, |_| true);
    let cancel = CancellationToken::new();
    let provider = CancellingProvider {
        inner: MemorySecurityProvider::new(),
        cancel: cancel.clone(),
    };
    let engine = QueryEngine::new(EngineConfig::default(), fx.index.clone(), Arc::new(provider)).unwrap();

    let err = engine
        .execute_with("*:*", &fx.context(QuerySettings::default().top(10)), &cancel)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(engine.active_frames(), 0);
}
