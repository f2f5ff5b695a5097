//! Two-tier match decision: cheap embedding tier first, generative tier on doubt.

use std::time::Instant;

use tracing::{info, instrument};

use super::embedding_tier::EmbeddingTier;
use super::error::ClassifyResult;
use super::generative_tier::GenerativeTier;
use super::types::Classification;
use crate::verdict::{Decision, Verdict};

/// Decides match/no-match for (query, occurrence) pairs.
///
/// `POSITIVE` and `NEGATIVE` from the embedding tier are terminal; only `UNCERTAIN`
/// reaches the generative tier, whose answer is terminal too. Errors from either
/// tier are returned, never folded into `NO_MATCH`.
#[derive(Debug)]
pub struct CascadeClassifier {
    embedding: EmbeddingTier,
    generative: GenerativeTier,
}

impl CascadeClassifier {
    pub fn new(embedding: EmbeddingTier, generative: GenerativeTier) -> Self {
        Self {
            embedding,
            generative,
        }
    }

    pub fn embedding_tier(&self) -> &EmbeddingTier {
        &self.embedding
    }

    pub fn generative_tier(&self) -> &GenerativeTier {
        &self.generative
    }

    #[instrument(skip(self, query, occurrence), fields(rule = self.embedding.rule_name()))]
    pub async fn classify(&self, query: &str, occurrence: &str) -> ClassifyResult<Classification> {
        let started = Instant::now();
        let assessment = self.embedding.assess(query, occurrence).await?;
        let embedding_latency = started.elapsed();

        let terminal = |decision| Classification {
            embedding_verdict: assessment.verdict,
            distance: assessment.distance,
            escalated: false,
            generative_verdict: None,
            yes_probability: None,
            decision,
            embedding_latency,
            generative_latency: None,
        };

        match assessment.verdict {
            Verdict::Positive => Ok(terminal(Decision::Match)),
            Verdict::Negative => Ok(terminal(Decision::NoMatch)),
            Verdict::Uncertain => {
                info!(distance = ?assessment.distance, "Escalating to generative tier");
                let started = Instant::now();
                let (related, probability) = self.generative.decide(query, occurrence).await?;
                let generative_latency = started.elapsed();

                Ok(Classification {
                    escalated: true,
                    generative_verdict: Some(related),
                    yes_probability: Some(probability),
                    generative_latency: Some(generative_latency),
                    ..terminal(Decision::from_bool(related))
                })
            }
        }
    }
}
