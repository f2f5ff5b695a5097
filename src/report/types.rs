use serde::Serialize;

use crate::perf::Tier;
use crate::verdict::{Decision, Verdict};

#[derive(Debug, Clone, PartialEq, Serialize)]
/// One classified occurrence. Emitted for every outcome, NO_MATCH included.
pub struct CodeSearchRow {
    pub source: String,
    pub occurrence: String,
    pub query: String,
    pub embedding_verdict: Verdict,
    pub escalated: bool,
    /// Only set when the generative tier was consulted.
    pub generative_verdict: Option<bool>,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Per corpus unit, per tier latency summary.
pub struct PerformanceRow {
    pub source: String,
    pub tier: Tier,
    pub count: u32,
    /// Non-cumulative bucket counts; `None` if no sample was in range.
    pub histogram: Option<Vec<u32>>,
    pub max_latency_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A candidate retained by the Top-K freeze.
pub struct TopKRow {
    pub pattern: String,
    pub signature: String,
    pub distance: f64,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// An occurrence that matched, with the Top-K pattern that admitted it.
pub struct SuggestedPatternRow {
    pub occurrence: String,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// An occurrence whose classification failed.
pub struct FailureRow {
    pub source: String,
    pub occurrence: String,
    pub error: String,
}
