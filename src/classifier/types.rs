use std::time::Duration;

use serde::Serialize;

use crate::gateway::RelatednessThresholds;
use crate::verdict::{Decision, Verdict};

#[derive(Debug, Clone, PartialEq)]
/// How the embedding tier turns (query, occurrence) into a ternary verdict.
pub enum DecisionRule {
    /// Euclidean distance between embeddings against `[low, high]`.
    DistanceThreshold { low: f64, high: f64 },
    /// The relatedness service decides, using its own named threshold pairs.
    Ternary { thresholds: RelatednessThresholds },
}

impl DecisionRule {
    pub fn name(&self) -> &'static str {
        match self {
            DecisionRule::DistanceThreshold { .. } => "distance",
            DecisionRule::Ternary { .. } => "ternary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// What the embedding tier said about one occurrence.
pub struct EmbeddingAssessment {
    pub verdict: Verdict,
    /// Only known under [`DecisionRule::DistanceThreshold`].
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
/// Full trace of one cascade run.
pub struct Classification {
    pub embedding_verdict: Verdict,
    pub distance: Option<f64>,
    pub escalated: bool,
    pub generative_verdict: Option<bool>,
    pub yes_probability: Option<f64>,
    pub decision: Decision,
    #[serde(skip)]
    pub embedding_latency: Duration,
    #[serde(skip)]
    pub generative_latency: Option<Duration>,
}
