use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use crate::core::types::IndexValueType;

/// How much of a document a field exposes when queried.
/// Ordered from least to most revealing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QueryFieldLevel {
    NotDefined,
    HeadOnly,
    NoBinaryOrFullText,
    BinaryOrFullText,
}

impl Default for QueryFieldLevel {
    fn default() -> Self {
        QueryFieldLevel::NotDefined
    }
}

/// Per-field indexing metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub value_type: IndexValueType,
    pub analyzed: bool,           // text split into lowercase words
    pub stored: bool,
    pub level: QueryFieldLevel,
}

impl FieldInfo {
    pub fn new(name: &str, value_type: IndexValueType) -> Self {
        FieldInfo {
            name: name.to_string(),
            value_type,
            analyzed: false,
            stored: true,
            level: QueryFieldLevel::HeadOnly,
        }
    }

    pub fn text(name: &str) -> Self {
        FieldInfo {
            analyzed: true,
            level: QueryFieldLevel::NoBinaryOrFullText,
            ..FieldInfo::new(name, IndexValueType::String)
        }
    }

    pub fn with_level(mut self, level: QueryFieldLevel) -> Self {
        self.level = level;
        self
    }

    pub fn unstored(mut self) -> Self {
        self.stored = false;
        self
    }
}

/// Static table of indexed fields, built once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldRegistry {
    pub fields: HashMap<String, FieldInfo>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        FieldRegistry {
            fields: HashMap::new(),
        }
    }

    /// Registry preloaded with the content fields every repository indexes.
    pub fn with_content_fields() -> Self {
        FieldRegistry::new()
            .add(FieldInfo::new("Id", IndexValueType::Int))
            .add(FieldInfo::new("ParentId", IndexValueType::Int))
            .add(FieldInfo::new("Name", IndexValueType::String))
            .add(FieldInfo::new("Path", IndexValueType::String))
            .add(FieldInfo::new("Type", IndexValueType::String))
            .add(FieldInfo::new("InTree", IndexValueType::String))
            .add(FieldInfo::new("Index", IndexValueType::Int))
            .add(FieldInfo::new("CreationDate", IndexValueType::Long))
            .add(FieldInfo::new("ModificationDate", IndexValueType::Long))
            .add(FieldInfo::new("IsSystemContent", IndexValueType::Bool))
            .add(FieldInfo::new("EnableLifespan", IndexValueType::Bool))
            .add(FieldInfo::new("ValidFrom", IndexValueType::Long))
            .add(FieldInfo::new("ValidTill", IndexValueType::Long))
            .add(FieldInfo::text("DisplayName"))
            .add(FieldInfo::text("Description"))
            .add(FieldInfo::text("_Text").unstored().with_level(QueryFieldLevel::BinaryOrFullText))
    }

    pub fn add(mut self, info: FieldInfo) -> Self {
        self.register(info);
        self
    }

    pub fn register(&mut self, info: FieldInfo) {
        self.fields.insert(info.name.clone(), info);
    }

    pub fn get(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
