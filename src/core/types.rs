use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Identity id that always resolves to full (OpenMinor) access
pub const SYSTEM_IDENTITY: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub i32);

impl NodeId {
    pub fn new(id: i32) -> Self {
        NodeId(id)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<i32> for NodeId {
    fn from(id: i32) -> Self {
        NodeId(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexValueType {
    String,
    Int,
    Long,
    Float,
    Double,
    Bool,
}

impl IndexValueType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            IndexValueType::Int | IndexValueType::Long | IndexValueType::Float | IndexValueType::Double
        )
    }
}

/// Engine-agnostic typed operand of a predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IndexValue {
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
}

impl IndexValue {
    pub fn value_type(&self) -> IndexValueType {
        match self {
            IndexValue::String(_) => IndexValueType::String,
            IndexValue::Int(_) => IndexValueType::Int,
            IndexValue::Long(_) => IndexValueType::Long,
            IndexValue::Float(_) => IndexValueType::Float,
            IndexValue::Double(_) => IndexValueType::Double,
            IndexValue::Bool(_) => IndexValueType::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            IndexValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a raw lexeme into a value of the requested type.
    /// Booleans accept the CQL spellings `yes`/`no` as well as `true`/`false`.
    pub fn parse_as(text: &str, value_type: IndexValueType) -> Option<IndexValue> {
        match value_type {
            IndexValueType::String => Some(IndexValue::String(text.to_string())),
            IndexValueType::Int => text.parse().ok().map(IndexValue::Int),
            IndexValueType::Long => text.parse().ok().map(IndexValue::Long),
            IndexValueType::Float => text.parse().ok().map(IndexValue::Float),
            IndexValueType::Double => text.parse().ok().map(IndexValue::Double),
            IndexValueType::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(IndexValue::Bool(true)),
                "false" | "no" | "0" => Some(IndexValue::Bool(false)),
                _ => None,
            },
        }
    }

    /// Convert this value to `value_type`, going through its textual form
    /// when the types differ.
    pub fn coerce(&self, value_type: IndexValueType) -> Option<IndexValue> {
        if self.value_type() == value_type {
            return Some(self.clone());
        }
        IndexValue::parse_as(&self.to_string(), value_type)
    }

    fn type_rank(&self) -> u8 {
        match self {
            IndexValue::Bool(_) => 0,
            IndexValue::Int(_) => 1,
            IndexValue::Long(_) => 2,
            IndexValue::Float(_) => 3,
            IndexValue::Double(_) => 4,
            IndexValue::String(_) => 5,
        }
    }

    /// Total order used for sorting: same-typed values compare naturally,
    /// mixed types fall back to a fixed type rank.
    pub fn total_cmp(&self, other: &IndexValue) -> Ordering {
        match (self, other) {
            (IndexValue::Float(a), IndexValue::Float(b)) => a.total_cmp(b),
            (IndexValue::Double(a), IndexValue::Double(b)) => a.total_cmp(b),
            _ => self
                .partial_cmp(other)
                .unwrap_or_else(|| self.type_rank().cmp(&other.type_rank())),
        }
    }
}

impl PartialOrd for IndexValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (IndexValue::String(a), IndexValue::String(b)) => Some(a.cmp(b)),
            (IndexValue::Int(a), IndexValue::Int(b)) => Some(a.cmp(b)),
            (IndexValue::Long(a), IndexValue::Long(b)) => Some(a.cmp(b)),
            (IndexValue::Float(a), IndexValue::Float(b)) => a.partial_cmp(b),
            (IndexValue::Double(a), IndexValue::Double(b)) => a.partial_cmp(b),
            (IndexValue::Bool(a), IndexValue::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexValue::String(s) => write!(f, "{}", s),
            IndexValue::Int(v) => write!(f, "{}", v),
            IndexValue::Long(v) => write!(f, "{}", v),
            IndexValue::Float(v) => write!(f, "{}", v),
            IndexValue::Double(v) => write!(f, "{}", v),
            IndexValue::Bool(true) => write!(f, "yes"),
            IndexValue::Bool(false) => write!(f, "no"),
        }
    }
}

impl From<&str> for IndexValue {
    fn from(s: &str) -> Self {
        IndexValue::String(s.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(s: String) -> Self {
        IndexValue::String(s)
    }
}

impl From<i32> for IndexValue {
    fn from(v: i32) -> Self {
        IndexValue::Int(v)
    }
}

impl From<i64> for IndexValue {
    fn from(v: i64) -> Self {
        IndexValue::Long(v)
    }
}

impl From<f64> for IndexValue {
    fn from(v: f64) -> Self {
        IndexValue::Double(v)
    }
}

impl From<bool> for IndexValue {
    fn from(v: bool) -> Self {
        IndexValue::Bool(v)
    }
}

/// Minimal per-result payload: node id, version status flags and the
/// stored fields the caller asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHandle {
    pub node_id: NodeId,
    pub is_last_public: bool,
    pub is_last_draft: bool,
    pub fields: BTreeMap<String, IndexValue>,
}

impl DocumentHandle {
    pub fn new(node_id: NodeId, is_last_public: bool, is_last_draft: bool) -> Self {
        DocumentHandle {
            node_id,
            is_last_public,
            is_last_draft,
            fields: BTreeMap::new(),
        }
    }

    pub fn get_field(&self, name: &str) -> Option<&IndexValue> {
        self.fields.get(name)
    }
}
