use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use fst::Set;
use parking_lot::RwLock;
use roaring::RoaringBitmap;
use tracing::debug;
use crate::analysis::tokenizer::StandardTokenizer;
use crate::core::error::{Error, Result};
use crate::core::types::{DocumentHandle, IndexValue, NodeId};
use crate::index::collector::{TopDocs, TopDocsCollector};
use crate::index::fuzzy::FuzzyAutomaton;
use crate::index::query::{EngineQuery, Occur};
use crate::index::searcher::{DocAddress, IndexSearcher, SearchRequest, SnapshotSource};
use crate::schema::schema::FieldRegistry;

/// Document as handed to the index: one content version
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocument {
    pub node_id: NodeId,
    pub is_last_public: bool,
    pub is_last_draft: bool,
    pub fields: BTreeMap<String, IndexValue>,
}

impl IndexDocument {
    pub fn new(node_id: i32, is_last_public: bool, is_last_draft: bool) -> Self {
        IndexDocument {
            node_id: NodeId(node_id),
            is_last_public,
            is_last_draft,
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<IndexValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }
}

/// Documents containing one term, with frequencies above 1
#[derive(Debug, Clone, Default)]
struct TermPostings {
    docs: RoaringBitmap,
    freqs: HashMap<DocAddress, u32>,
}

impl TermPostings {
    fn tf(&self, doc: DocAddress) -> u32 {
        self.freqs.get(&doc).copied().unwrap_or(1)
    }
}

#[derive(Debug, Clone, Default)]
struct IndexData {
    docs: Vec<IndexDocument>,                                   // address = position
    postings: HashMap<String, BTreeMap<String, TermPostings>>,  // field -> term -> docs
    deleted: RoaringBitmap,
}

impl IndexData {
    fn live(&self) -> RoaringBitmap {
        let mut live = RoaringBitmap::new();
        live.insert_range(0..self.docs.len() as u32);
        live -= &self.deleted;
        live
    }
}

/// Key a non-analyzed value is indexed and looked up under
fn term_key(value: &IndexValue) -> String {
    value.to_string()
}

/// Matching documents plus per-document scores; documents without an entry
/// score `constant`
struct Scored {
    docs: RoaringBitmap,
    scores: HashMap<DocAddress, f32>,
    constant: f32,
}

impl Scored {
    fn constant(docs: RoaringBitmap, constant: f32) -> Self {
        Scored { docs, scores: HashMap::new(), constant }
    }

    fn empty() -> Self {
        Scored::constant(RoaringBitmap::new(), 0.0)
    }

    fn score(&self, doc: DocAddress) -> f32 {
        self.scores.get(&doc).copied().unwrap_or(self.constant)
    }
}

/// Immutable, versioned view of a `MemoryIndex`
pub struct IndexSnapshot {
    pub version: u64,
    data: Arc<IndexData>,
    live: RoaringBitmap,
    dictionaries: HashMap<String, Set<Vec<u8>>>,  // sorted terms per field
    columns: HashMap<String, Vec<(IndexValue, DocAddress)>>,  // live values per field, in total order
    schema: Arc<FieldRegistry>,
}

impl IndexSnapshot {
    fn open(version: u64, data: Arc<IndexData>, schema: Arc<FieldRegistry>) -> Result<Self> {
        let mut dictionaries = HashMap::new();
        for (field, terms) in &data.postings {
            dictionaries.insert(field.clone(), Set::from_iter(terms.keys())?);
        }

        let live = data.live();
        let mut columns: HashMap<String, Vec<(IndexValue, DocAddress)>> = HashMap::new();
        for doc in live.iter() {
            for (field, value) in &data.docs[doc as usize].fields {
                columns.entry(field.clone()).or_default().push((value.clone(), doc));
            }
        }
        for column in columns.values_mut() {
            column.sort_by(|(a, _), (b, _)| a.total_cmp(b));
        }

        Ok(IndexSnapshot {
            version,
            live,
            data,
            dictionaries,
            columns,
            schema,
        })
    }

    fn postings(&self, field: &str, term: &str) -> Option<&TermPostings> {
        self.data.postings.get(field).and_then(|terms| terms.get(term))
    }

    fn evaluate(&self, query: &EngineQuery) -> Result<Scored> {
        match query {
            EngineQuery::MatchAll => Ok(Scored::constant(self.live.clone(), 1.0)),
            EngineQuery::MatchNone => Ok(Scored::empty()),
            EngineQuery::Term { field, value, boost } => {
                let Some(postings) = self.postings(field, &term_key(value)) else {
                    return Ok(Scored::empty());
                };
                let scores = postings
                    .freqs
                    .iter()
                    .map(|(&doc, &tf)| (doc, boost * tf as f32))
                    .collect();
                Ok(Scored { docs: postings.docs.clone(), scores, constant: *boost })
            }
            EngineQuery::Fuzzy { field, term, max_edits, boost } => self.evaluate_fuzzy(field, term, *max_edits, *boost),
            EngineQuery::Range { field, lower, upper, boost } => {
                Ok(Scored::constant(self.range_docs(field, lower, upper), *boost))
            }
            EngineQuery::Bool { clauses, boost } => self.evaluate_bool(clauses, *boost),
        }
    }

    /// Binary search the field's column for the bounds; values of another
    /// type than a bound can sit inside the slice and are dropped by `in_range`.
    fn range_docs(&self, field: &str, lower: &Bound<IndexValue>, upper: &Bound<IndexValue>) -> RoaringBitmap {
        let Some(column) = self.columns.get(field) else {
            return RoaringBitmap::new();
        };
        let start = match lower {
            Bound::Unbounded => 0,
            Bound::Included(min) => column.partition_point(|(v, _)| v.total_cmp(min).is_lt()),
            Bound::Excluded(min) => column.partition_point(|(v, _)| v.total_cmp(min).is_le()),
        };
        let end = match upper {
            Bound::Unbounded => column.len(),
            Bound::Included(max) => column.partition_point(|(v, _)| v.total_cmp(max).is_le()),
            Bound::Excluded(max) => column.partition_point(|(v, _)| v.total_cmp(max).is_lt()),
        };

        let mut docs = RoaringBitmap::new();
        if start < end {
            for (value, doc) in &column[start..end] {
                if in_range(value, lower, upper) {
                    docs.insert(*doc);
                }
            }
        }
        docs
    }

    fn evaluate_fuzzy(&self, field: &str, term: &str, max_edits: u8, boost: f32) -> Result<Scored> {
        let Some(dictionary) = self.dictionaries.get(field) else {
            return Ok(Scored::empty());
        };
        let automaton = FuzzyAutomaton::new(term, max_edits);
        let len = term.chars().count() as f32;

        let mut scored = Scored::empty();
        for (candidate, distance) in automaton.expand(dictionary)? {
            let Some(postings) = self.postings(field, &candidate) else { continue };
            let similarity = 1.0 - distance as f32 / (len + 1.0);
            for doc in postings.docs.iter() {
                *scored.scores.entry(doc).or_insert(0.0) += boost * similarity * postings.tf(doc) as f32;
            }
            scored.docs |= &postings.docs;
        }
        Ok(scored)
    }

    fn evaluate_bool(&self, clauses: &[(Occur, EngineQuery)], boost: f32) -> Result<Scored> {
        let mut must = Vec::new();
        let mut should = Vec::new();
        let mut excluded = RoaringBitmap::new();
        for (occur, clause) in clauses {
            let scored = self.evaluate(clause)?;
            match occur {
                Occur::Must => must.push(scored),
                Occur::Should => should.push(scored),
                Occur::MustNot => excluded |= scored.docs,
            }
        }

        let mut docs = match must.split_first() {
            Some((first, rest)) => rest.iter().fold(first.docs.clone(), |acc, s| acc & &s.docs),
            None => should.iter().fold(RoaringBitmap::new(), |acc, s| acc | &s.docs),
        };
        docs -= excluded;

        let mut scores = HashMap::with_capacity(docs.len() as usize);
        for doc in docs.iter() {
            let total: f32 = must
                .iter()
                .chain(&should)
                .filter(|s| s.docs.contains(doc))
                .map(|s| s.score(doc))
                .sum();
            scores.insert(doc, boost * total);
        }
        Ok(Scored { docs, scores, constant: 0.0 })
    }

    fn matching(&self, query: &EngineQuery) -> Result<Scored> {
        let mut scored = self.evaluate(query)?;
        scored.docs &= &self.live;
        Ok(scored)
    }

    fn is_stored(&self, field: &str) -> bool {
        self.schema.get(field).map(|info| info.stored).unwrap_or(true)
    }
}

fn in_range(value: &IndexValue, lower: &Bound<IndexValue>, upper: &Bound<IndexValue>) -> bool {
    let above = match lower {
        Bound::Unbounded => true,
        Bound::Included(min) => value.partial_cmp(min).is_some_and(|o| o.is_ge()),
        Bound::Excluded(min) => value.partial_cmp(min).is_some_and(|o| o.is_gt()),
    };
    let below = match upper {
        Bound::Unbounded => true,
        Bound::Included(max) => value.partial_cmp(max).is_some_and(|o| o.is_le()),
        Bound::Excluded(max) => value.partial_cmp(max).is_some_and(|o| o.is_lt()),
    };
    above && below
}

impl IndexSearcher for IndexSnapshot {
    fn num_docs(&self) -> usize {
        self.live.len() as usize
    }

    fn search(&self, query: &EngineQuery, request: &SearchRequest<'_>) -> Result<TopDocs> {
        let scored = self.matching(query)?;
        let mut collector = TopDocsCollector::new(request.collector_size(), request.sort);
        for doc in scored.docs.iter() {
            let fields = &self.data.docs[doc as usize].fields;
            let sort_values = request.sort.iter().map(|s| fields.get(&s.field).cloned()).collect();
            collector.collect(doc, scored.score(doc), sort_values);
        }
        Ok(collector.into_top_docs(request.skip))
    }

    fn visit(&self, query: &EngineQuery, visitor: &mut dyn FnMut(DocAddress) -> Result<bool>) -> Result<usize> {
        let scored = self.matching(query)?;
        let mut visited = 0;
        for doc in scored.docs.iter() {
            visited += 1;
            if !visitor(doc)? {
                break;
            }
        }
        Ok(visited)
    }

    fn handle(&self, doc: DocAddress, fields: &[String]) -> Result<DocumentHandle> {
        let stored = self
            .data
            .docs
            .get(doc as usize)
            .filter(|_| self.live.contains(doc))
            .ok_or_else(|| Error::not_found(format!("document {} is not in snapshot {}", doc, self.version)))?;

        let mut handle = DocumentHandle::new(stored.node_id, stored.is_last_public, stored.is_last_draft);
        for name in fields {
            if let Some(value) = stored.fields.get(name).filter(|_| self.is_stored(name)) {
                handle.fields.insert(name.clone(), value.clone());
            }
        }
        Ok(handle)
    }

    fn version(&self) -> u64 {
        self.version
    }
}

struct Writer {
    data: Arc<IndexData>,
    version: u64,
    dirty: bool,
}

/// In-process inverted index. Writes go to a copy-on-write working set;
/// readers only see what `commit` published.
pub struct MemoryIndex {
    pub schema: Arc<FieldRegistry>,
    pub tokenizer: StandardTokenizer,
    writer: RwLock<Writer>,
    published: RwLock<Arc<IndexSnapshot>>,
}

impl MemoryIndex {
    pub fn new(schema: Arc<FieldRegistry>) -> Result<Self> {
        let data = Arc::new(IndexData::default());
        let snapshot = IndexSnapshot::open(0, data.clone(), schema.clone())?;
        Ok(MemoryIndex {
            schema,
            tokenizer: StandardTokenizer::default(),
            writer: RwLock::new(Writer { data, version: 0, dirty: false }),
            published: RwLock::new(Arc::new(snapshot)),
        })
    }

    pub fn add(&self, document: IndexDocument) -> DocAddress {
        let mut writer = self.writer.write();
        let data = Arc::make_mut(&mut writer.data);
        let doc = data.docs.len() as DocAddress;

        for (field, value) in &document.fields {
            let analyzed = self.schema.get(field).map(|f| f.analyzed).unwrap_or(false);
            let terms = match value {
                IndexValue::String(text) if analyzed => self.tokenizer.tokenize(text),
                other => vec![term_key(other)],
            };
            let field_postings = data.postings.entry(field.clone()).or_default();
            for term in terms {
                let postings = field_postings.entry(term).or_default();
                if !postings.docs.insert(doc) {
                    *postings.freqs.entry(doc).or_insert(1) += 1;
                }
            }
        }

        data.docs.push(document);
        writer.dirty = true;
        doc
    }

    /// Mark every version of `node_id` deleted. Returns how many were live.
    pub fn delete_node(&self, node_id: NodeId) -> usize {
        let mut writer = self.writer.write();
        let data = Arc::make_mut(&mut writer.data);
        let mut removed = 0;
        for (doc, stored) in data.docs.iter().enumerate() {
            if stored.node_id == node_id && data.deleted.insert(doc as u32) {
                removed += 1;
            }
        }
        if removed > 0 {
            writer.dirty = true;
        }
        removed
    }

    /// Publish the working set as a new snapshot and return its version.
    pub fn commit(&self) -> Result<u64> {
        let mut writer = self.writer.write();
        if !writer.dirty {
            return Ok(writer.version);
        }
        writer.version += 1;
        let snapshot = IndexSnapshot::open(writer.version, writer.data.clone(), self.schema.clone())?;
        debug!(version = writer.version, docs = snapshot.num_docs(), "published index snapshot");
        *self.published.write() = Arc::new(snapshot);
        writer.dirty = false;
        Ok(writer.version)
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.published.read().clone()
    }
}

impl SnapshotSource for MemoryIndex {
    fn snapshot(&self, refresh: bool) -> Result<Arc<dyn IndexSearcher>> {
        if refresh {
            self.commit()?;
        }
        let snapshot: Arc<dyn IndexSearcher> = self.published.read().clone();
        Ok(snapshot)
    }
}
