use std::sync::Arc;
use tracing::debug;
use crate::core::cancel::CancellationToken;
use crate::core::config::EngineConfig;
use crate::core::context::QueryContext;
use crate::core::error::Result;
use crate::index::searcher::SnapshotSource;
use crate::query::ast::Predicate;
use crate::query::compiler::{CompiledQuery, QueryCompiler};
use crate::query::parser::CqlParser;
use crate::reader::reader_pool::ReaderPool;
use crate::search::executor::PaginatedExecutor;
use crate::search::results::QueryResult;
use crate::security::filter::AclPermissionFilter;
use crate::security::provider::SecurityProvider;

/// Content query engine: CQL text in, permitted page out
pub struct QueryEngine {
    pub config: EngineConfig,
    pub compiler: QueryCompiler,
    pub executor: PaginatedExecutor,
    pub pool: ReaderPool,
    pub security: Arc<dyn SecurityProvider>,
}

impl QueryEngine {
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn SnapshotSource>,
        security: Arc<dyn SecurityProvider>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(QueryEngine {
            compiler: QueryCompiler::new(config.clone()),
            executor: PaginatedExecutor::new(config.growth_budgets.clone()),
            pool: ReaderPool::new(source),
            security,
            config,
        })
    }

    pub fn parse(&self, text: &str, context: &dyn QueryContext) -> Result<Predicate> {
        CqlParser::new()
            .with_default_similarity(self.config.fuzzy_default_similarity)
            .with_max_depth(self.config.validation.max_depth)
            .with_context(context)
            .parse(text)
    }

    pub fn compile(&self, predicate: &Predicate, context: &dyn QueryContext) -> Result<CompiledQuery> {
        self.compiler.compile(predicate, context)
    }

    pub fn permission_filter(&self, compiled: &CompiledQuery, context: &dyn QueryContext) -> AclPermissionFilter {
        AclPermissionFilter::new(
            self.security.clone(),
            context.user_id(),
            compiled.all_versions,
            compiled.field_level,
        )
    }

    pub fn execute(&self, text: &str, context: &dyn QueryContext) -> Result<QueryResult> {
        self.execute_with(text, context, &CancellationToken::new())
    }

    pub fn execute_with(&self, text: &str, context: &dyn QueryContext, cancel: &CancellationToken) -> Result<QueryResult> {
        let predicate = self.parse(text, context)?;
        self.execute_predicate(&predicate, context, cancel)
    }

    pub fn execute_predicate(
        &self,
        predicate: &Predicate,
        context: &dyn QueryContext,
        cancel: &CancellationToken,
    ) -> Result<QueryResult> {
        let compiled = self.compile(predicate, context)?;
        debug!(user_id = context.user_id(), query = %compiled.query, "executing query");
        let filter = self.permission_filter(&compiled, context);
        self.executor.execute(&compiled, &self.pool, &filter, cancel)
    }

    /// Reader frames currently held by running executions.
    pub fn active_frames(&self) -> usize {
        self.pool.active_frames()
    }
}
