use std::sync::Arc;

use serde::Serialize;

use crate::classifier::{Classification, DecisionRule};
use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_TOP_K, DEFAULT_UNIT_CONCURRENCY, DEFAULT_YES_THRESHOLD,
};
use crate::gateway::{
    EmbeddingBackend, GenerativeBackend, RelatednessBackend, RelatednessThresholds, SamplingParams,
};
use crate::ranking::TopK;

#[derive(Debug, Clone)]
/// Per-run parameters.
pub struct PipelineSettings {
    pub query: String,
    pub top_k: usize,
    /// Capacity of each per-run cache (embeddings, verdicts, probabilities).
    pub cache_capacity: usize,
    /// Corpus units classified at once in the second pass.
    pub unit_concurrency: usize,
    pub rule: DecisionRule,
    pub yes_threshold: f64,
    pub sampling: SamplingParams,
}

impl PipelineSettings {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            unit_concurrency: DEFAULT_UNIT_CONCURRENCY,
            rule: DecisionRule::Ternary {
                thresholds: RelatednessThresholds::default(),
            },
            yes_threshold: DEFAULT_YES_THRESHOLD,
            sampling: SamplingParams::single_token(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_rule(mut self, rule: DecisionRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_yes_threshold(mut self, threshold: f64) -> Self {
        self.yes_threshold = threshold;
        self
    }

    pub fn with_unit_concurrency(mut self, concurrency: usize) -> Self {
        self.unit_concurrency = concurrency;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

#[derive(Clone)]
/// The three model backends a run talks to.
pub struct ModelBackends {
    pub embedding: Arc<dyn EmbeddingBackend>,
    pub relatedness: Arc<dyn RelatednessBackend>,
    pub generative: Arc<dyn GenerativeBackend>,
}

impl std::fmt::Debug for ModelBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBackends").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
/// Final outcome for one classified occurrence.
pub struct OccurrenceDecision {
    pub source: String,
    pub occurrence: String,
    /// The Top-K pattern that admitted the occurrence.
    pub pattern: String,
    #[serde(flatten)]
    pub classification: Classification,
}

#[derive(Debug, Clone, Serialize)]
/// An occurrence whose classification failed without aborting the run.
pub struct OccurrenceFailure {
    pub source: String,
    pub occurrence: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UnitSummary {
    pub source: String,
    pub classified: usize,
    /// Occurrences whose pattern is not in the Top-K.
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
/// Everything a run produced, units in corpus order.
pub struct PipelineOutcome {
    pub top_k: Arc<TopK>,
    pub decisions: Vec<OccurrenceDecision>,
    pub failures: Vec<OccurrenceFailure>,
    pub units: Vec<UnitSummary>,
}

impl PipelineOutcome {
    pub fn matches(&self) -> impl Iterator<Item = &OccurrenceDecision> {
        self.decisions
            .iter()
            .filter(|d| d.classification.decision.is_match())
    }

    pub fn escalations(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.classification.escalated)
            .count()
    }
}
