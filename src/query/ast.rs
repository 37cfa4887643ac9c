use std::fmt;
use serde::{Serialize, Deserialize};
use crate::core::types::IndexValue;

/// Field name that, together with the value `*`, matches every document
pub const ANY_FIELD: &str = "*";
pub const ANY_VALUE: &str = "*";

/// Node of a parsed CQL query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Simple(SimplePredicate),     // field:value, field:value~0.7
    Range(RangePredicate),       // field:[min TO max]
    Logical(LogicalPredicate),   // one parenthesis level
}

/// Exact or fuzzy term match on one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplePredicate {
    pub field: String,
    pub value: IndexValue,
    pub fuzzy: Option<f32>,      // minimum similarity, 0..=1
    pub boost: Option<f32>,
}

/// Bounded or half-open range; a missing bound is open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangePredicate {
    pub field: String,
    pub min: Option<IndexValue>,
    pub max: Option<IndexValue>,
    pub min_exclusive: bool,
    pub max_exclusive: bool,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occurrence {
    Default,   // behaves as Should
    Should,
    Must,
    MustNot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalClause {
    pub predicate: Predicate,
    pub occurrence: Occurrence,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogicalPredicate {
    pub clauses: Vec<LogicalClause>,
    pub boost: Option<f32>,
}

impl Predicate {
    pub fn simple(field: &str, value: impl Into<IndexValue>) -> Self {
        Predicate::Simple(SimplePredicate {
            field: field.to_string(),
            value: value.into(),
            fuzzy: None,
            boost: None,
        })
    }

    pub fn range(field: &str, min: Option<IndexValue>, max: Option<IndexValue>) -> Self {
        Predicate::Range(RangePredicate {
            field: field.to_string(),
            min,
            max,
            min_exclusive: false,
            max_exclusive: false,
            boost: None,
        })
    }

    /// `*:*`
    pub fn match_all() -> Self {
        Predicate::simple(ANY_FIELD, ANY_VALUE)
    }

    pub fn boost(&self) -> Option<f32> {
        match self {
            Predicate::Simple(p) => p.boost,
            Predicate::Range(p) => p.boost,
            Predicate::Logical(p) => p.boost,
        }
    }

    pub fn with_boost(mut self, boost: Option<f32>) -> Self {
        match &mut self {
            Predicate::Simple(p) => p.boost = boost,
            Predicate::Range(p) => p.boost = boost,
            Predicate::Logical(p) => p.boost = boost,
        }
        self
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Predicate::Simple(p)
            if p.field == ANY_FIELD && p.value.as_str() == Some(ANY_VALUE))
    }

    /// Field names referenced anywhere in the tree, in visiting order.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Simple(p) => out.push(&p.field),
            Predicate::Range(p) => out.push(&p.field),
            Predicate::Logical(p) => {
                for clause in &p.clauses {
                    clause.predicate.collect_fields(out);
                }
            }
        }
    }
}

impl LogicalPredicate {
    pub fn new() -> Self {
        LogicalPredicate::default()
    }

    pub fn with(mut self, predicate: Predicate, occurrence: Occurrence) -> Self {
        self.clauses.push(LogicalClause { predicate, occurrence });
        self
    }

    pub fn with_must(self, predicate: Predicate) -> Self {
        self.with(predicate, Occurrence::Must)
    }

    pub fn with_should(self, predicate: Predicate) -> Self {
        self.with(predicate, Occurrence::Should)
    }

    pub fn with_must_not(self, predicate: Predicate) -> Self {
        self.with(predicate, Occurrence::MustNot)
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl From<LogicalPredicate> for Predicate {
    fn from(logical: LogicalPredicate) -> Self {
        Predicate::Logical(logical)
    }
}

const RESERVED: &[char] = &['(', ')', '[', ']', '{', '}', ':', '"', '^', '~', '\\'];
const KEYWORDS: &[&str] = &["AND", "OR", "NOT", "TO", "&&", "||"];

/// Write a value so the lexer reads it back as one term. `in_range` also
/// protects a literal `*` from being read as an open bound.
fn write_value(f: &mut fmt::Formatter<'_>, value: &IndexValue, in_range: bool) -> fmt::Result {
    let text = match value {
        IndexValue::String(s) => s,
        other => return write!(f, "{}", other),
    };
    let needs_quotes = text.is_empty()
        || text.chars().any(|c| c.is_whitespace() || RESERVED.contains(&c))
        || text.starts_with(['+', '-'])
        || KEYWORDS.contains(&text.as_str())
        || (in_range && text == "*");
    if !needs_quotes {
        return write!(f, "{}", text);
    }
    write!(f, "\"")?;
    for c in text.chars() {
        if c == '"' || c == '\\' {
            write!(f, "\\")?;
        }
        write!(f, "{}", c)?;
    }
    write!(f, "\"")
}

fn write_boost(f: &mut fmt::Formatter<'_>, boost: Option<f32>) -> fmt::Result {
    match boost {
        Some(b) => write!(f, "^{}", b),
        None => Ok(()),
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Simple(p) => {
                write!(f, "{}:", p.field)?;
                if self.is_match_all() {
                    write!(f, "{}", ANY_VALUE)?;
                } else {
                    write_value(f, &p.value, false)?;
                }
                if let Some(similarity) = p.fuzzy {
                    write!(f, "~{}", similarity)?;
                }
                write_boost(f, p.boost)
            }
            Predicate::Range(p) => {
                write!(f, "{}:{}", p.field, if p.min_exclusive { '{' } else { '[' })?;
                match &p.min {
                    Some(v) => write_value(f, v, true)?,
                    None => write!(f, "*")?,
                }
                write!(f, " TO ")?;
                match &p.max {
                    Some(v) => write_value(f, v, true)?,
                    None => write!(f, "*")?,
                }
                write!(f, "{}", if p.max_exclusive { '}' } else { ']' })?;
                write_boost(f, p.boost)
            }
            Predicate::Logical(p) => {
                write!(f, "(")?;
                for (i, clause) in p.clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    match clause.occurrence {
                        Occurrence::Must => write!(f, "+")?,
                        Occurrence::MustNot => write!(f, "-")?,
                        Occurrence::Default | Occurrence::Should => {}
                    }
                    write!(f, "{}", clause.predicate)?;
                }
                write!(f, ")")?;
                write_boost(f, p.boost)
            }
        }
    }
}
