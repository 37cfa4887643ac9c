//! Query Language Tests
//!
//! CQL text parsed, compiled and executed against a small fixture index:
//! - Match sets agree with set algebra over the fixture
//! - Canonical text reparses to the same match set
//! - Malformed text and unknown fields surface as typed errors

use cql_engine::core::types::SYSTEM_IDENTITY;
use cql_engine::index::inverted::{IndexDocument, MemoryIndex};
use cql_engine::schema::schema::FieldRegistry;
use cql_engine::security::provider::MemorySecurityProvider;
use cql_engine::{EngineConfig, ErrorKind, QueryEngine, QuerySettings, SimpleQueryContext};
use std::collections::BTreeSet;
use std::sync::Arc;

// =============================================================================
// Fixture
// =============================================================================

struct Row {
    id: i32,
    name: &'static str,
    kind: &'static str,
    index: i32,
    description: &'static str,
}

const ROWS: &[Row] = &[
    Row { id: 1, name: "root", kind: "Folder", index: 0, description: "top level container" },
    Row { id: 2, name: "docs", kind: "Folder", index: 1, description: "shared documents" },
    Row { id: 3, name: "readme", kind: "File", index: 2, description: "project overview document" },
    Row { id: 4, name: "logo", kind: "Image", index: 3, description: "company logo picture" },
    Row { id: 5, name: "budget", kind: "File", index: 4, description: "yearly budget spreadsheet" },
    Row { id: 6, name: "archive", kind: "Folder", index: 5, description: "old shared documents" },
    Row { id: 7, name: "photo", kind: "Image", index: 6, description: "team picture" },
    Row { id: 8, name: "notes", kind: "File", index: 7, description: "meeting notes" },
];

struct Fixture {
    engine: QueryEngine,
    fields: Arc<FieldRegistry>,
}

impl Fixture {
    fn new() -> Self {
        let fields = Arc::new(FieldRegistry::with_content_fields());
        let index = Arc::new(MemoryIndex::new(fields.clone()).unwrap());
        for row in ROWS {
            index.add(
                IndexDocument::new(row.id, true, true)
                    .field("Id", row.id)
                    .field("Name", row.name)
                    .field("Type", row.kind)
                    .field("Index", row.index)
                    .field("Description", row.description)
                    .field("IsSystemContent", row.id == 8),
            );
        }
        index.commit().unwrap();

        let engine = QueryEngine::new(
            EngineConfig::default(),
            index,
            Arc::new(MemorySecurityProvider::new()),
        )
        .unwrap();
        Fixture { engine, fields }
    }

    fn context(&self, settings: QuerySettings) -> SimpleQueryContext {
        SimpleQueryContext::new(SYSTEM_IDENTITY, settings, self.fields.clone())
    }

    fn ids_with(&self, text: &str, settings: QuerySettings) -> BTreeSet<i32> {
        let result = self.engine.execute(text, &self.context(settings)).unwrap();
        result.node_ids().into_iter().map(|id| id.value()).collect()
    }

    /// Matches without autofilters, so the system row takes part.
    fn ids(&self, text: &str) -> BTreeSet<i32> {
        self.ids_with(text, QuerySettings::default().without_autofilters())
    }
}

fn rows(pred: impl Fn(&Row) -> bool) -> BTreeSet<i32> {
    ROWS.iter().filter(|r| pred(r)).map(|r| r.id).collect()
}

// =============================================================================
// Simple Predicates
// =============================================================================

#[test]
fn test_exact_field_match() {
    let fx = Fixture::new();
    assert_eq!(fx.ids("Type:Folder"), rows(|r| r.kind == "Folder"));
    assert_eq!(fx.ids("Name:readme"), rows(|r| r.name == "readme"));
}

#[test]
fn test_exact_match_is_case_sensitive_on_unanalyzed_fields() {
    let fx = Fixture::new();
    assert!(fx.ids("Type:folder").is_empty());
}

#[test]
fn test_analyzed_field_matches_words() {
    let fx = Fixture::new();
    assert_eq!(fx.ids("Description:picture"), rows(|r| r.description.contains("picture")));
    // every word of a multi word value is required
    assert_eq!(fx.ids("Description:\"shared documents\""), rows(|r| r.description.contains("shared documents")));
}

#[test]
fn test_numeric_field_match() {
    let fx = Fixture::new();
    assert_eq!(fx.ids("Index:3"), rows(|r| r.index == 3));
}

#[test]
fn test_match_all_and_field_wildcard() {
    let fx = Fixture::new();
    assert_eq!(fx.ids("*:*"), rows(|_| true));
    assert_eq!(fx.ids("Type:*"), rows(|_| true));
    assert!(fx.ids("DisplayName:*").is_empty());
}

#[test]
fn test_fuzzy_match() {
    let fx = Fixture::new();
    assert_eq!(fx.ids("Name:budgat~0.8"), rows(|r| r.name == "budget"));
    assert!(fx.ids("Name:budgat~1").is_empty());
}

#[test]
fn test_fuzzy_match_keeps_case_on_unanalyzed_fields() {
    let fields = Arc::new(FieldRegistry::with_content_fields());
    let index = Arc::new(MemoryIndex::new(fields.clone()).unwrap());
    index.add(IndexDocument::new(1, true, true).field("Id", 1).field("Name", "README"));
    index.add(IndexDocument::new(2, true, true).field("Id", 2).field("Name", "readme"));
    index.commit().unwrap();

    let engine = QueryEngine::new(EngineConfig::default(), index, Arc::new(MemorySecurityProvider::new())).unwrap();
    let ctx = SimpleQueryContext::new(SYSTEM_IDENTITY, QuerySettings::default(), fields);
    let ids = |text: &str| -> BTreeSet<i32> {
        let result = engine.execute(text, &ctx).unwrap();
        result.node_ids().into_iter().map(|id| id.value()).collect()
    };

    assert_eq!(ids("Name:README"), BTreeSet::from([1]));
    assert_eq!(ids("Name:README~0.9"), ids("Name:README"));
    assert_eq!(ids("Name:READMX~0.8"), BTreeSet::from([1]));
}

// =============================================================================
// Ranges
// =============================================================================

#[test]
fn test_inclusive_and_exclusive_ranges() {
    let fx = Fixture::new();
    assert_eq!(fx.ids("Index:[2 TO 5]"), rows(|r| (2..=5).contains(&r.index)));
    assert_eq!(fx.ids("Index:{2 TO 5}"), rows(|r| r.index > 2 && r.index < 5));
    assert_eq!(fx.ids("Index:[2 TO 5}"), rows(|r| r.index >= 2 && r.index < 5));
}

#[test]
fn test_open_ended_ranges() {
    let fx = Fixture::new();
    assert_eq!(fx.ids("Index:[* TO 2]"), rows(|r| r.index <= 2));
    assert_eq!(fx.ids("Index:{5 TO *]"), rows(|r| r.index > 5));
}

// =============================================================================
// Occurrences
// =============================================================================

#[test]
fn test_default_occurrence_is_union() {
    let fx = Fixture::new();
    assert_eq!(
        fx.ids("Type:Folder Type:Image"),
        rows(|r| r.kind == "Folder" || r.kind == "Image")
    );
    assert_eq!(
        fx.ids("Type:Folder OR Name:readme"),
        rows(|r| r.kind == "Folder" || r.name == "readme")
    );
}

#[test]
fn test_must_is_intersection() {
    let fx = Fixture::new();
    assert_eq!(
        fx.ids("+Type:File +Index:[3 TO *]"),
        rows(|r| r.kind == "File" && r.index >= 3)
    );
    assert_eq!(
        fx.ids("Type:Folder AND Description:shared"),
        rows(|r| r.kind == "Folder" && r.description.contains("shared"))
    );
}

#[test]
fn test_must_not_is_difference() {
    let fx = Fixture::new();
    assert_eq!(
        fx.ids("+Type:Folder -Name:docs"),
        rows(|r| r.kind == "Folder" && r.name != "docs")
    );
    assert_eq!(
        fx.ids("Type:Folder NOT Name:root"),
        rows(|r| r.kind == "Folder" && r.name != "root")
    );
}

#[test]
fn test_pure_negation_complements_everything() {
    let fx = Fixture::new();
    assert_eq!(fx.ids("-Type:Folder"), rows(|r| r.kind != "Folder"));
    assert_eq!(
        fx.ids("-Type:Folder -Type:Image"),
        rows(|r| r.kind != "Folder" && r.kind != "Image")
    );
}

#[test]
fn test_should_is_ignored_next_to_must() {
    let fx = Fixture::new();
    assert_eq!(fx.ids("+Type:Image Name:root"), rows(|r| r.kind == "Image"));
}

#[test]
fn test_nested_groups() {
    let fx = Fixture::new();
    assert_eq!(
        fx.ids("+(Type:File Type:Image) -(Index:[* TO 3])"),
        rows(|r| (r.kind == "File" || r.kind == "Image") && r.index > 3)
    );
    assert_eq!(
        fx.ids("Type:(Folder Image) -Name:logo"),
        rows(|r| (r.kind == "Folder" || r.kind == "Image") && r.name != "logo")
    );
}

#[test]
fn test_empty_query_matches_nothing() {
    let fx = Fixture::new();
    assert!(fx.ids("").is_empty());
    assert!(fx.ids("   ").is_empty());
}

// =============================================================================
// Autofilters
// =============================================================================

#[test]
fn test_system_content_hidden_by_default() {
    let fx = Fixture::new();
    let ids = fx.ids_with("Type:File", QuerySettings::default());
    assert_eq!(ids, rows(|r| r.kind == "File" && r.id != 8));
}

// =============================================================================
// Canonical Text
// =============================================================================

#[test]
fn test_canonical_text_preserves_match_set() {
    let fx = Fixture::new();
    let ctx = fx.context(QuerySettings::default().without_autofilters());
    let queries = [
        "+Type:Folder -Name:docs",
        "Type:(File Image) Index:[2 TO 4}",
        "Description:\"shared documents\" OR Name:logo^2",
        "-Type:Folder",
        "Name:budgat~0.8",
    ];
    for text in queries {
        let predicate = fx.engine.parse(text, &ctx).unwrap();
        let canonical = predicate.to_string();
        assert_eq!(fx.ids(&canonical), fx.ids(text), "{} vs {}", text, canonical);
    }
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_syntax_errors_carry_kind_and_position() {
    let fx = Fixture::new();
    let ctx = fx.context(QuerySettings::default());

    let err = fx.engine.execute("Type:(Folder", &ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QuerySyntax);

    let err = fx.engine.execute("Index:[1 5]", &ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QuerySyntax);
    assert!(err.position.is_some());
}

#[test]
fn test_deep_nesting_is_too_complex() {
    let fx = Fixture::new();
    let ctx = fx.context(QuerySettings::default());
    let depth = 100_000;
    let text = format!("{}Type:Folder{}", "(".repeat(depth), ")".repeat(depth));

    let err = fx.engine.execute(&text, &ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TooComplex);
    assert!(err.position.is_some());

    let shallow = format!("{}Type:Folder{}", "(".repeat(8), ")".repeat(8));
    assert_eq!(fx.ids(&shallow), rows(|r| r.kind == "Folder"));
}

#[test]
fn test_unknown_field_is_rejected() {
    let fx = Fixture::new();
    let ctx = fx.context(QuerySettings::default());
    let err = fx.engine.execute("Colour:red", &ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownField);
}

#[test]
fn test_value_of_wrong_type_is_rejected() {
    let fx = Fixture::new();
    let ctx = fx.context(QuerySettings::default());
    let err = fx.engine.execute("Index:abc", &ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QuerySyntax);
}
