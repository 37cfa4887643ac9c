use std::fmt;
use std::ops::Bound;
use crate::core::types::IndexValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

/// Engine-native query tree produced by the compiler
#[derive(Debug, Clone, PartialEq)]
pub enum EngineQuery {
    MatchAll,
    MatchNone,
    Term {
        field: String,
        value: IndexValue,
        boost: f32,
    },
    Fuzzy {
        field: String,
        term: String,
        max_edits: u8,
        boost: f32,
    },
    Range {
        field: String,
        lower: Bound<IndexValue>,
        upper: Bound<IndexValue>,
        boost: f32,
    },
    Bool {
        clauses: Vec<(Occur, EngineQuery)>,
        boost: f32,
    },
}

impl EngineQuery {
    pub fn term(field: &str, value: impl Into<IndexValue>) -> Self {
        EngineQuery::Term {
            field: field.to_string(),
            value: value.into(),
            boost: 1.0,
        }
    }

    pub fn bool(clauses: Vec<(Occur, EngineQuery)>) -> Self {
        EngineQuery::Bool { clauses, boost: 1.0 }
    }

    pub fn boost(&self) -> f32 {
        match self {
            EngineQuery::MatchAll | EngineQuery::MatchNone => 1.0,
            EngineQuery::Term { boost, .. }
            | EngineQuery::Fuzzy { boost, .. }
            | EngineQuery::Range { boost, .. }
            | EngineQuery::Bool { boost, .. } => *boost,
        }
    }

    /// Fields the query reads, used for diagnostics.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            EngineQuery::MatchAll | EngineQuery::MatchNone => Vec::new(),
            EngineQuery::Term { field, .. }
            | EngineQuery::Fuzzy { field, .. }
            | EngineQuery::Range { field, .. } => vec![field.as_str()],
            EngineQuery::Bool { clauses, .. } => clauses.iter().flat_map(|(_, q)| q.fields()).collect(),
        }
    }
}

fn write_bound(f: &mut fmt::Formatter<'_>, bound: &Bound<IndexValue>) -> fmt::Result {
    match bound {
        Bound::Included(v) | Bound::Excluded(v) => write!(f, "{}", v),
        Bound::Unbounded => write!(f, "*"),
    }
}

impl fmt::Display for EngineQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineQuery::MatchAll => write!(f, "*:*"),
            EngineQuery::MatchNone => write!(f, "<none>"),
            EngineQuery::Term { field, value, .. } => write!(f, "{}:{}", field, value),
            EngineQuery::Fuzzy { field, term, max_edits, .. } => write!(f, "{}:{}~{}", field, term, max_edits),
            EngineQuery::Range { field, lower, upper, .. } => {
                let open = if matches!(lower, Bound::Excluded(_)) { '{' } else { '[' };
                let close = if matches!(upper, Bound::Excluded(_)) { '}' } else { ']' };
                write!(f, "{}:{}", field, open)?;
                write_bound(f, lower)?;
                write!(f, " TO ")?;
                write_bound(f, upper)?;
                write!(f, "{}", close)
            }
            EngineQuery::Bool { clauses, .. } => {
                write!(f, "(")?;
                for (i, (occur, query)) in clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    match occur {
                        Occur::Must => write!(f, "+")?,
                        Occur::MustNot => write!(f, "-")?,
                        Occur::Should => {}
                    }
                    write!(f, "{}", query)?;
                }
                write!(f, ")")
            }
        }
    }
}
