//! Scan-pass candidate collection and the Top-K freeze.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::types::{ScoredCandidate, TopK};
use crate::candidate::Candidate;
use crate::embedding::{EmbeddingResult, EmbeddingService};

/// Collects every distinct candidate of a run, scored against the query.
///
/// All distinct candidates are scored; `k` only bounds what
/// [`populate_top_k`](Self::populate_top_k) materializes. Once frozen, further
/// adds are ignored.
pub struct TopKAccumulator {
    query: String,
    k: usize,
    embeddings: Arc<EmbeddingService>,
    queue: BinaryHeap<Reverse<ScoredCandidate>>,
    seen: HashSet<String>,
    next_seq: u64,
    frozen: Option<Arc<TopK>>,
}

impl TopKAccumulator {
    pub fn new(query: impl Into<String>, k: usize, embeddings: Arc<EmbeddingService>) -> Self {
        Self {
            query: query.into(),
            k,
            embeddings,
            queue: BinaryHeap::new(),
            seen: HashSet::new(),
            next_seq: 0,
            frozen: None,
        }
    }

    /// Scores and queues a candidate unless its pattern was already added.
    ///
    /// Returns `Ok(true)` when the candidate was queued. Embedding failures are
    /// returned as-is; a partial Top-K must not be mistaken for a complete one.
    #[instrument(skip(self, signature, pattern), fields(pattern = %pattern))]
    pub async fn add(&mut self, signature: &str, pattern: &str) -> EmbeddingResult<bool> {
        if self.frozen.is_some() {
            warn!("Candidate added after Top-K was populated, ignoring");
            return Ok(false);
        }
        if self.seen.contains(pattern) {
            return Ok(false);
        }

        let distance = self.embeddings.distance(&self.query, signature).await?;
        debug!(distance, "Scored candidate");

        self.seen.insert(pattern.to_string());
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(ScoredCandidate::new(
            Candidate::new(signature, pattern),
            distance,
            seq,
        )));
        Ok(true)
    }

    pub async fn add_candidate(&mut self, candidate: &Candidate) -> EmbeddingResult<bool> {
        self.add(&candidate.signature, &candidate.pattern).await
    }

    /// Freezes the closest `k` candidates. Idempotent: later calls return the same set.
    pub fn populate_top_k(&mut self) -> Arc<TopK> {
        if let Some(top) = &self.frozen {
            return Arc::clone(top);
        }

        let mut ranked = Vec::with_capacity(self.k.min(self.queue.len()));
        while ranked.len() < self.k {
            match self.queue.pop() {
                Some(Reverse(scored)) => ranked.push(scored),
                None => break,
            }
        }

        let top = Arc::new(TopK::from_ranked(ranked));
        info!(
            retained = top.len(),
            scored = self.seen.len(),
            best_distance = ?top.best_distance(),
            "Populated Top-K"
        );
        self.frozen = Some(Arc::clone(&top));
        top
    }

    pub fn top_k(&self) -> Option<Arc<TopK>> {
        self.frozen.clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Candidates still queued (not yet materialized).
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Distinct patterns scored so far.
    pub fn scored_len(&self) -> usize {
        self.seen.len()
    }
}

impl std::fmt::Debug for TopKAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopKAccumulator")
            .field("k", &self.k)
            .field("queued", &self.queue.len())
            .field("frozen", &self.frozen.is_some())
            .finish()
    }
}
