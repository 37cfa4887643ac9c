use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use crate::schema::schema::{FieldInfo, FieldRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Always read the freshest index snapshot
    #[default]
    Default,
    /// Accept a slightly stale snapshot to avoid reopening the reader
    Quick,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub reverse: bool,
}

impl SortField {
    pub fn asc(field: &str) -> Self {
        SortField { field: field.to_string(), reverse: false }
    }

    pub fn desc(field: &str) -> Self {
        SortField { field: field.to_string(), reverse: true }
    }
}

/// Execution directives for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub top: usize,                  // 0 = unbounded
    pub skip: usize,
    pub page_size: usize,            // stands in for `top` when top is 0
    pub sort: Vec<SortField>,
    pub enable_autofilters: bool,
    pub enable_lifespan_filter: bool,
    pub mode: ExecutionMode,
    pub all_versions: bool,
    pub count_only: bool,
    pub fields: Vec<String>,         // stored fields projected into each hit
}

impl Default for QuerySettings {
    fn default() -> Self {
        QuerySettings {
            top: 0,
            skip: 0,
            page_size: 0,
            sort: Vec::new(),
            enable_autofilters: true,
            enable_lifespan_filter: false,
            mode: ExecutionMode::Default,
            all_versions: false,
            count_only: false,
            fields: Vec::new(),
        }
    }
}

impl QuerySettings {
    pub fn top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn sort_by(mut self, field: SortField) -> Self {
        self.sort.push(field);
        self
    }

    pub fn without_autofilters(mut self) -> Self {
        self.enable_autofilters = false;
        self
    }

    /// Number of permitted hits the caller wants after `skip`.
    pub fn effective_top(&self) -> usize {
        match (self.top, self.page_size) {
            (0, 0) => usize::MAX,
            (0, page) => page,
            (top, _) => top,
        }
    }
}

/// Caller-supplied binding for one execution; immutable while the query runs
pub trait QueryContext: Send + Sync {
    fn settings(&self) -> &QuerySettings;

    fn user_id(&self) -> i32;

    /// Indexing metadata for a field, `None` when the field is not indexed.
    fn field_info(&self, name: &str) -> Option<FieldInfo>;

    /// Clock used by the lifespan filter.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `QueryContext` backed by a shared field registry
#[derive(Debug, Clone)]
pub struct SimpleQueryContext {
    pub settings: QuerySettings,
    pub user_id: i32,
    pub fields: Arc<FieldRegistry>,
    pub fixed_now: Option<DateTime<Utc>>,
}

impl SimpleQueryContext {
    pub fn new(user_id: i32, settings: QuerySettings, fields: Arc<FieldRegistry>) -> Self {
        SimpleQueryContext {
            settings,
            user_id,
            fields,
            fixed_now: None,
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }
}

impl QueryContext for SimpleQueryContext {
    fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    fn user_id(&self) -> i32 {
        self.user_id
    }

    fn field_info(&self, name: &str) -> Option<FieldInfo> {
        self.fields.get(name).cloned()
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_top_prefers_top_then_page_size() {
        assert_eq!(QuerySettings::default().effective_top(), usize::MAX);
        let paged = QuerySettings { page_size: 25, ..QuerySettings::default() };
        assert_eq!(paged.effective_top(), 25);
        assert_eq!(paged.top(5).effective_top(), 5);
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: QuerySettings =
            serde_json::from_str(r#"{ "top": 10, "sort": [{ "field": "Name", "reverse": true }] }"#).unwrap();
        assert_eq!(settings.top, 10);
        assert!(settings.enable_autofilters);
        assert_eq!(settings.sort, vec![SortField::desc("Name")]);
    }
}
