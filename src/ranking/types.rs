use std::cmp::Ordering;

use serde::Serialize;

use crate::candidate::{Candidate, MethodPattern};

#[derive(Debug, Clone, Serialize)]
/// A candidate with its embedding distance to the query (lower is closer).
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub distance: f64,
    /// Insertion sequence; breaks distance ties in favour of the first seen.
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl ScoredCandidate {
    pub(crate) fn new(candidate: Candidate, distance: f64, seq: u64) -> Self {
        Self {
            candidate,
            distance,
            seq,
        }
    }
}

impl PartialEq for ScoredCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredCandidate {}

impl PartialOrd for ScoredCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.seq.cmp(&other.seq))
    }
}

#[derive(Debug, Clone, Default)]
/// The frozen result of the scan pass.
///
/// `entries[i]` and `patterns[i]` describe the same candidate; both are ordered by
/// ascending distance.
pub struct TopK {
    entries: Vec<ScoredCandidate>,
    patterns: Vec<MethodPattern>,
}

impl TopK {
    pub(crate) fn from_ranked(entries: Vec<ScoredCandidate>) -> Self {
        let patterns = entries
            .iter()
            .map(|e| MethodPattern::materialize(&e.candidate.pattern))
            .collect();
        Self { entries, patterns }
    }

    pub fn entries(&self) -> &[ScoredCandidate] {
        &self.entries
    }

    pub fn patterns(&self) -> &[MethodPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best_distance(&self) -> Option<f64> {
        self.entries.first().map(|e| e.distance)
    }

    /// First (closest) Top-K pattern an occurrence reported under `pattern` falls under.
    pub fn matching(&self, pattern: &str) -> Option<&MethodPattern> {
        self.patterns.iter().find(|p| p.matches(pattern))
    }
}
