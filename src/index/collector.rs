use std::cmp::Ordering;
use std::collections::BinaryHeap;
use crate::core::context::SortField;
use crate::core::types::IndexValue;
use crate::index::searcher::DocAddress;

/// Ranked hit returned by a scoring round
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDoc {
    pub doc: DocAddress,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct TopDocs {
    pub hits: Vec<ScoreDoc>,
    pub total_hits: usize,
}

#[derive(Debug, Clone)]
struct SortKey {
    value: Option<IndexValue>,
    reverse: bool,
}

impl SortKey {
    // missing values sort last in either direction
    fn compare(&self, other: &SortKey) -> Ordering {
        match (&self.value, &other.value) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => {
                let order = a.total_cmp(b);
                if self.reverse { order.reverse() } else { order }
            }
        }
    }
}

/// Candidate ordered so that `Less` ranks first
#[derive(Debug, Clone)]
struct Ranked {
    keys: Vec<SortKey>,
    score: f32,
    doc: DocAddress,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.keys.iter().zip(&other.keys) {
            match a.compare(b) {
                Ordering::Equal => continue,
                order => return order,
            }
        }
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc.cmp(&other.doc))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

/// Bounded top-k collector. The heap keeps the worst retained hit on top so
/// it can be evicted; ties fall back to document address.
pub struct TopDocsCollector {
    heap: BinaryHeap<Ranked>,
    pub k: usize,
    pub sort: Vec<SortField>,
    pub total_hits: usize,  // every collected match, retained or not
}

impl TopDocsCollector {
    pub fn new(k: usize, sort: &[SortField]) -> Self {
        TopDocsCollector {
            heap: BinaryHeap::with_capacity(k.min(1024) + 1),
            k,
            sort: sort.to_vec(),
            total_hits: 0,
        }
    }

    /// `sort_values` holds one entry per sort field, in order.
    pub fn collect(&mut self, doc: DocAddress, score: f32, sort_values: Vec<Option<IndexValue>>) {
        self.total_hits += 1;
        if self.k == 0 {
            return;
        }

        let keys = sort_values
            .into_iter()
            .zip(&self.sort)
            .map(|(value, field)| SortKey { value, reverse: field.reverse })
            .collect();
        let candidate = Ranked { keys, score, doc };

        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(worst) = self.heap.peek() {
            if candidate < *worst {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }

    /// Ranked hits after dropping the first `skip`.
    pub fn into_top_docs(self, skip: usize) -> TopDocs {
        let hits = self
            .heap
            .into_sorted_vec()
            .into_iter()
            .skip(skip)
            .map(|r| ScoreDoc { doc: r.doc, score: r.score })
            .collect();
        TopDocs {
            hits,
            total_hits: self.total_hits,
        }
    }
}
