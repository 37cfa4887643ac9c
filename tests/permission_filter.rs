//! Permission Filter Tests
//!
//! Randomized checks of the ACL filter:
//! - Granting more permissions never hides a document
//! - Adding deny entries never reveals a document
//! - Executed results only contain documents the filter permits

use cql_engine::index::inverted::{IndexDocument, MemoryIndex};
use cql_engine::index::searcher::IndexSearcher;
use cql_engine::schema::schema::{FieldRegistry, QueryFieldLevel};
use cql_engine::security::filter::{AclPermissionFilter, PermissionFilter};
use cql_engine::security::permission::{AceInfo, PermissionType};
use cql_engine::security::provider::MemorySecurityProvider;
use cql_engine::{EngineConfig, NodeId, QueryEngine, QuerySettings, SimpleQueryContext};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const USER: i32 = 42;
const GROUP: i32 = 7;
const NODE: NodeId = NodeId(100);

// =============================================================================
// Helper Functions
// =============================================================================

const LEVELS: [QueryFieldLevel; 4] = [
    QueryFieldLevel::NotDefined,
    QueryFieldLevel::HeadOnly,
    QueryFieldLevel::NoBinaryOrFullText,
    QueryFieldLevel::BinaryOrFullText,
];

fn random_permissions(rng: &mut StdRng) -> Vec<PermissionType> {
    PermissionType::ALL
        .iter()
        .copied()
        .filter(|_| rng.gen_bool(0.3))
        .collect()
}

fn with_extra(rng: &mut StdRng, base: &[PermissionType]) -> Vec<PermissionType> {
    let mut more = base.to_vec();
    for _ in 0..rng.gen_range(1..4) {
        let extra = PermissionType::ALL[rng.gen_range(0..PermissionType::ALL.len())];
        if !more.contains(&extra) {
            more.push(extra);
        }
    }
    more
}

/// Is a document that is both the last public and the last draft version
/// visible under the given entries?
fn visible(entries: Vec<AceInfo>, all_versions: bool, level: QueryFieldLevel) -> bool {
    let provider = MemorySecurityProvider::new();
    provider.add_membership(USER, GROUP);
    provider.set_entries(NODE, entries);
    let filter = AclPermissionFilter::new(Arc::new(provider), USER, all_versions, level);
    filter.is_permitted(NODE, true, true)
}

// =============================================================================
// Monotonicity
// =============================================================================

#[test]
fn test_granting_permissions_never_hides() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let granted = random_permissions(&mut rng);
        let widened = with_extra(&mut rng, &granted);
        let identity = if rng.gen_bool(0.5) { USER } else { GROUP };
        let all_versions = rng.gen_bool(0.5);
        let level = LEVELS[rng.gen_range(0..LEVELS.len())];

        let before = visible(vec![AceInfo::allow(identity, &granted)], all_versions, level);
        let after = visible(vec![AceInfo::allow(identity, &widened)], all_versions, level);
        assert!(
            !before || after,
            "granting {:?} on top of {:?} hid the document",
            widened,
            granted
        );
    }
}

#[test]
fn test_denying_permissions_never_reveals() {
    let mut rng = StdRng::seed_from_u64(0xace);
    for _ in 0..500 {
        let granted = random_permissions(&mut rng);
        let denied = random_permissions(&mut rng);
        let all_versions = rng.gen_bool(0.5);
        let level = LEVELS[rng.gen_range(0..LEVELS.len())];

        let before = visible(vec![AceInfo::allow(GROUP, &granted)], all_versions, level);
        let after = visible(
            vec![AceInfo::allow(GROUP, &granted), AceInfo::deny(USER, &denied)],
            all_versions,
            level,
        );
        assert!(!after || before, "denying {:?} revealed the document", denied);
    }
}

#[test]
fn test_wider_field_level_never_reveals() {
    let mut rng = StdRng::seed_from_u64(0xf1e1d);
    for _ in 0..300 {
        let granted = random_permissions(&mut rng);
        let all_versions = rng.gen_bool(0.5);
        let narrow = rng.gen_range(0..LEVELS.len());
        let wide = rng.gen_range(narrow..LEVELS.len());

        let narrow_visible = visible(vec![AceInfo::allow(USER, &granted)], all_versions, LEVELS[narrow]);
        let wide_visible = visible(vec![AceInfo::allow(USER, &granted)], all_versions, LEVELS[wide]);
        assert!(!wide_visible || narrow_visible);
    }
}

#[test]
fn test_deny_overrides_group_allow() {
    let entries = vec![
        AceInfo::allow(GROUP, &[PermissionType::SEE, PermissionType::OPEN]),
        AceInfo::deny(USER, &[PermissionType::SEE, PermissionType::OPEN]),
    ];
    assert!(!visible(entries, false, QueryFieldLevel::HeadOnly));
}

// =============================================================================
// Executed Results
// =============================================================================

#[test]
fn test_results_only_contain_permitted_documents() {
    let mut rng = StdRng::seed_from_u64(0xd0c5);
    let fields = Arc::new(FieldRegistry::with_content_fields());
    let index = Arc::new(MemoryIndex::new(fields.clone()).unwrap());
    let provider = Arc::new(MemorySecurityProvider::new());
    provider.add_membership(USER, GROUP);

    for id in 1..=200 {
        let is_last_public = rng.gen_bool(0.7);
        let is_last_draft = !is_last_public || rng.gen_bool(0.5);
        index.add(IndexDocument::new(id, is_last_public, is_last_draft).field("Id", id));
        if rng.gen_bool(0.8) {
            let identity = if rng.gen_bool(0.5) { USER } else { GROUP };
            provider.set_entries(NodeId(id), vec![AceInfo::allow(identity, &random_permissions(&mut rng))]);
        }
    }
    index.commit().unwrap();

    let engine = QueryEngine::new(EngineConfig::default(), index.clone(), provider.clone()).unwrap();
    let ctx = SimpleQueryContext::new(USER, QuerySettings::default(), fields);
    let result = engine.execute("*:*", &ctx).unwrap();

    let filter = AclPermissionFilter::new(provider, USER, false, QueryFieldLevel::HeadOnly);
    let snapshot = index.snapshot();
    let expected: Vec<NodeId> = (1..=200)
        .map(NodeId)
        .filter(|id| {
            let doc = (id.value() - 1) as u32;
            let handle = snapshot.handle(doc, &[]).unwrap();
            filter.is_permitted(*id, handle.is_last_public, handle.is_last_draft)
        })
        .collect();

    assert_eq!(result.node_ids(), expected);
    assert_eq!(result.total_count, expected.len());
}
