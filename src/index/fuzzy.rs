use fst::{Automaton, IntoStreamer, Set, Streamer};
use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder, DFA, SINK_STATE};
use crate::core::error::Result;

/// Levenshtein DFA for one term, usable directly or as an FST automaton
pub struct FuzzyAutomaton {
    pub term: String,
    pub max_edits: u8,
    dfa: DFA,
}

impl FuzzyAutomaton {
    /// Transpositions count as a single edit (`teh` -> `the`).
    pub fn new(term: &str, max_edits: u8) -> Self {
        let builder = LevenshteinAutomatonBuilder::new(max_edits, true);
        FuzzyAutomaton {
            term: term.to_string(),
            max_edits,
            dfa: builder.build_dfa(term),
        }
    }

    /// Edit distance to `candidate`, `None` when it exceeds `max_edits`.
    pub fn distance(&self, candidate: &str) -> Option<u8> {
        let mut state = self.dfa.initial_state();
        for &byte in candidate.as_bytes() {
            state = self.dfa.transition(state, byte);
        }
        match self.dfa.distance(state) {
            Distance::Exact(d) if d <= self.max_edits => Some(d),
            _ => None,
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.distance(candidate).is_some()
    }

    /// Walk a sorted term dictionary and return every term within reach,
    /// with its distance.
    pub fn expand(&self, dictionary: &Set<Vec<u8>>) -> Result<Vec<(String, u8)>> {
        let mut stream = dictionary.search(self).into_stream();
        let mut out = Vec::new();
        while let Some(bytes) = stream.next() {
            let term = String::from_utf8_lossy(bytes).into_owned();
            if let Some(d) = self.distance(&term) {
                out.push((term, d));
            }
        }
        Ok(out)
    }
}

impl Automaton for FuzzyAutomaton {
    type State = u32;

    fn start(&self) -> u32 {
        self.dfa.initial_state()
    }

    fn is_match(&self, state: &u32) -> bool {
        matches!(self.dfa.distance(*state), Distance::Exact(_))
    }

    fn can_match(&self, state: &u32) -> bool {
        *state != SINK_STATE
    }

    fn accept(&self, state: &u32, byte: u8) -> u32 {
        self.dfa.transition(*state, byte)
    }
}
