use std::ops::Bound;
use chrono::{DateTime, Utc};
use crate::analysis::tokenizer::StandardTokenizer;
use crate::core::config::EngineConfig;
use crate::core::context::{ExecutionMode, QueryContext, SortField};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{IndexValue, IndexValueType};
use crate::index::query::{EngineQuery, Occur};
use crate::query::ast::{LogicalPredicate, Occurrence, Predicate, RangePredicate, SimplePredicate, ANY_FIELD, ANY_VALUE};
use crate::query::types::QueryValidator;
use crate::schema::schema::{FieldInfo, QueryFieldLevel};

/// Engine query plus the directives the executor needs
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub query: EngineQuery,
    pub sort: Vec<SortField>,
    pub top: usize,                     // usize::MAX when unbounded
    pub skip: usize,
    pub mode: ExecutionMode,
    pub all_versions: bool,
    pub count_only: bool,
    pub fields: Vec<String>,
    pub field_level: QueryFieldLevel,   // most revealing field referenced
}

/// Lowers predicate trees into engine queries
pub struct QueryCompiler {
    pub config: EngineConfig,
    pub tokenizer: StandardTokenizer,
}

impl QueryCompiler {
    pub fn new(config: EngineConfig) -> Self {
        QueryCompiler {
            config,
            tokenizer: StandardTokenizer::default(),
        }
    }

    pub fn compile(&self, predicate: &Predicate, context: &dyn QueryContext) -> Result<CompiledQuery> {
        QueryValidator::new(self.config.validation.clone()).validate(predicate)?;

        let settings = context.settings();
        let mut level = QueryFieldLevel::NotDefined;

        let mut query = match predicate {
            Predicate::Logical(logical) if logical.is_empty() => EngineQuery::MatchNone,
            _ => self.lower(predicate, context, &mut level)?,
        };

        for sort in &settings.sort {
            let info = self.field(context, &sort.field)?;
            level = level.max(info.level);
        }

        if settings.enable_autofilters && query != EngineQuery::MatchNone {
            query = self.apply_autofilters(query, context);
        }

        Ok(CompiledQuery {
            query,
            sort: settings.sort.clone(),
            top: settings.effective_top(),
            skip: settings.skip,
            mode: settings.mode,
            all_versions: settings.all_versions,
            count_only: settings.count_only,
            fields: settings.fields.clone(),
            field_level: level,
        })
    }

    fn field(&self, context: &dyn QueryContext, name: &str) -> Result<FieldInfo> {
        context.field_info(name).ok_or_else(|| Error::unknown_field(name))
    }

    fn lower(&self, predicate: &Predicate, context: &dyn QueryContext, level: &mut QueryFieldLevel) -> Result<EngineQuery> {
        match predicate {
            Predicate::Simple(simple) => self.lower_simple(simple, context, level),
            Predicate::Range(range) => self.lower_range(range, context, level),
            Predicate::Logical(logical) => self.lower_logical(logical, context, level),
        }
    }

    fn lower_simple(&self, simple: &SimplePredicate, context: &dyn QueryContext, level: &mut QueryFieldLevel) -> Result<EngineQuery> {
        if simple.field == ANY_FIELD && simple.value.as_str() == Some(ANY_VALUE) {
            return Ok(EngineQuery::MatchAll);
        }
        let info = self.field(context, &simple.field)?;
        *level = (*level).max(info.level);
        let boost = simple.boost.unwrap_or(1.0);

        // field:* matches every document that has a value in the field
        if simple.value.as_str() == Some(ANY_VALUE) {
            return Ok(EngineQuery::Range {
                field: info.name,
                lower: Bound::Unbounded,
                upper: Bound::Unbounded,
                boost,
            });
        }

        let value = coerce(&simple.value, &info)?;
        let text = match value {
            IndexValue::String(text) => text,
            other => return Ok(EngineQuery::Term { field: info.name, value: other, boost }),
        };

        if let Some(similarity) = simple.fuzzy {
            let term = if info.analyzed { self.tokenizer.normalize(&text) } else { text };
            let max_edits = self.max_edits(similarity, term.chars().count());
            return Ok(EngineQuery::Fuzzy { field: info.name, term, max_edits, boost });
        }

        if !info.analyzed {
            return Ok(EngineQuery::Term { field: info.name, value: IndexValue::String(text), boost });
        }

        let mut words = self.tokenizer.tokenize(&text);
        match words.len() {
            0 => Ok(EngineQuery::MatchNone),
            1 => Ok(EngineQuery::Term {
                field: info.name,
                value: IndexValue::String(words.remove(0)),
                boost,
            }),
            _ => Ok(EngineQuery::Bool {
                clauses: words
                    .into_iter()
                    .map(|word| (Occur::Must, EngineQuery::term(&info.name, word)))
                    .collect(),
                boost,
            }),
        }
    }

    /// Similarity `s` over a term of `len` characters allows
    /// `floor((1 - s) * len)` edits, capped by configuration.
    fn max_edits(&self, similarity: f32, len: usize) -> u8 {
        let edits = ((1.0 - similarity) * len as f32).floor().max(0.0) as usize;
        edits.min(self.config.max_fuzzy_edits as usize) as u8
    }

    fn lower_range(&self, range: &RangePredicate, context: &dyn QueryContext, level: &mut QueryFieldLevel) -> Result<EngineQuery> {
        let info = self.field(context, &range.field)?;
        *level = (*level).max(info.level);

        let bound = |value: &Option<IndexValue>, exclusive: bool| -> Result<Bound<IndexValue>> {
            Ok(match value {
                None => Bound::Unbounded,
                Some(v) if exclusive => Bound::Excluded(coerce(v, &info)?),
                Some(v) => Bound::Included(coerce(v, &info)?),
            })
        };
        let lower = bound(&range.min, range.min_exclusive)?;
        let upper = bound(&range.max, range.max_exclusive)?;

        Ok(EngineQuery::Range {
            field: info.name.clone(),
            lower,
            upper,
            boost: range.boost.unwrap_or(1.0),
        })
    }

    fn lower_logical(&self, logical: &LogicalPredicate, context: &dyn QueryContext, level: &mut QueryFieldLevel) -> Result<EngineQuery> {
        let mut clauses = Vec::with_capacity(logical.clauses.len() + 1);
        let only_exclusions = !logical.clauses.is_empty()
            && logical.clauses.iter().all(|c| c.occurrence == Occurrence::MustNot);
        if only_exclusions {
            clauses.push((Occur::Must, EngineQuery::MatchAll));
        }

        for clause in &logical.clauses {
            let occur = match clause.occurrence {
                Occurrence::Must => Occur::Must,
                Occurrence::MustNot => Occur::MustNot,
                Occurrence::Default | Occurrence::Should => Occur::Should,
            };
            let query = match &clause.predicate {
                // empty group: MatchNone when required, MatchAll when optional
                Predicate::Logical(inner) if inner.is_empty() => match occur {
                    Occur::Must => EngineQuery::MatchNone,
                    Occur::Should => EngineQuery::MatchAll,
                    Occur::MustNot => continue,
                },
                other => self.lower(other, context, level)?,
            };
            clauses.push((occur, query));
        }

        Ok(EngineQuery::Bool {
            clauses,
            boost: logical.boost.unwrap_or(1.0),
        })
    }

    fn apply_autofilters(&self, query: EngineQuery, context: &dyn QueryContext) -> EngineQuery {
        let names = &self.config.autofilter;
        let mut clauses = vec![(Occur::Must, query)];

        if let Some(info) = context.field_info(&names.system_field) {
            if let Some(yes) = IndexValue::Bool(true).coerce(info.value_type) {
                clauses.push((Occur::MustNot, EngineQuery::term(&info.name, yes)));
            }
        }

        if context.settings().enable_lifespan_filter {
            if let Some(filter) = self.lifespan_filter(context) {
                clauses.push((Occur::Must, filter));
            }
        }

        if clauses.len() == 1 {
            return clauses.remove(0).1;
        }
        EngineQuery::bool(clauses)
    }

    /// `EnableLifespan:no (+ValidFrom:[* TO now] +ValidTill:[now TO *])`
    fn lifespan_filter(&self, context: &dyn QueryContext) -> Option<EngineQuery> {
        let names = &self.config.autofilter;
        let enabled = context.field_info(&names.lifespan_enabled_field)?;
        let from = context.field_info(&names.valid_from_field)?;
        let till = context.field_info(&names.valid_till_field)?;
        let now = context.now();

        let disabled = IndexValue::Bool(false).coerce(enabled.value_type)?;
        let from_now = now_value(from.value_type, now)?;
        let till_now = now_value(till.value_type, now)?;

        let window = EngineQuery::bool(vec![
            (Occur::Must, EngineQuery::Range {
                field: from.name,
                lower: Bound::Unbounded,
                upper: Bound::Included(from_now),
                boost: 1.0,
            }),
            (Occur::Must, EngineQuery::Range {
                field: till.name,
                lower: Bound::Included(till_now),
                upper: Bound::Unbounded,
                boost: 1.0,
            }),
        ]);
        Some(EngineQuery::bool(vec![
            (Occur::Should, EngineQuery::term(&enabled.name, disabled)),
            (Occur::Should, window),
        ]))
    }
}

fn coerce(value: &IndexValue, info: &FieldInfo) -> Result<IndexValue> {
    value.coerce(info.value_type).ok_or_else(|| {
        Error::new(
            ErrorKind::QuerySyntax,
            format!("'{}' is not a valid {:?} value for field '{}'", value, info.value_type, info.name),
        )
    })
}

/// The clock value in the representation a date field is indexed with
fn now_value(value_type: IndexValueType, now: DateTime<Utc>) -> Option<IndexValue> {
    match value_type {
        IndexValueType::Long => Some(IndexValue::Long(now.timestamp_millis())),
        IndexValueType::Double => Some(IndexValue::Double(now.timestamp_millis() as f64)),
        IndexValueType::String => Some(IndexValue::String(now.format("%Y-%m-%d %H:%M:%S").to_string())),
        _ => None,
    }
}
