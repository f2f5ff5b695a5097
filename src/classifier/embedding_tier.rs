//! The cheap tier: a ternary verdict from embeddings or the relatedness model.

use std::sync::Arc;

use tracing::debug;

use super::error::ClassifyResult;
use super::types::{DecisionRule, EmbeddingAssessment};
use crate::cache::ComputeCache;
use crate::embedding::EmbeddingService;
use crate::gateway::{GatewayError, GatewayResult, RelatednessBackend, RelatednessThresholds};
use crate::hashing::{CacheKey, KeyBuilder, strip_newlines};
use crate::verdict::Verdict;

const RELATED_NAMESPACE: &str = "related";

/// Relatedness backend with a per-run verdict cache.
///
/// The key is `(text1, text2 without newlines, thresholds)`, so an occurrence that
/// only differs in line breaks is not sent twice.
pub struct RelatednessService {
    backend: Arc<dyn RelatednessBackend>,
    thresholds: RelatednessThresholds,
    cache: ComputeCache<Verdict, GatewayError>,
}

impl RelatednessService {
    pub fn new(
        backend: Arc<dyn RelatednessBackend>,
        thresholds: RelatednessThresholds,
        cache_capacity: usize,
    ) -> Self {
        Self {
            backend,
            thresholds,
            cache: ComputeCache::with_capacity(cache_capacity),
        }
    }

    pub async fn verdict(&self, text1: &str, text2: &str) -> GatewayResult<Verdict> {
        let key = self.key(text1, text2);
        let backend = Arc::clone(&self.backend);
        let thresholds = &self.thresholds;
        self.cache
            .get_or_try_compute(key, || async move {
                backend.classify(text1, text2, thresholds).await
            })
            .await
    }

    pub fn thresholds(&self) -> &RelatednessThresholds {
        &self.thresholds
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn key(&self, text1: &str, text2: &str) -> CacheKey {
        let mut builder = KeyBuilder::new(RELATED_NAMESPACE)
            .text(text1)
            .stripped_text(text2);
        for (name, [low, high]) in self.thresholds.iter() {
            builder = builder.text(name).float(low).float(high);
        }
        builder.finish()
    }
}

/// First tier of the cascade.
pub enum EmbeddingTier {
    Distance {
        embeddings: Arc<EmbeddingService>,
        low: f64,
        high: f64,
    },
    Ternary(RelatednessService),
}

impl EmbeddingTier {
    /// Builds the tier for `rule`. The relatedness backend is only used by
    /// [`DecisionRule::Ternary`].
    pub fn from_rule(
        rule: &DecisionRule,
        embeddings: Arc<EmbeddingService>,
        relatedness: Arc<dyn RelatednessBackend>,
        cache_capacity: usize,
    ) -> Self {
        match rule {
            DecisionRule::DistanceThreshold { low, high } => EmbeddingTier::Distance {
                embeddings,
                low: *low,
                high: *high,
            },
            DecisionRule::Ternary { thresholds } => EmbeddingTier::Ternary(
                RelatednessService::new(relatedness, thresholds.clone(), cache_capacity),
            ),
        }
    }

    pub async fn assess(&self, query: &str, occurrence: &str) -> ClassifyResult<EmbeddingAssessment> {
        match self {
            EmbeddingTier::Distance {
                embeddings,
                low,
                high,
            } => {
                let text = strip_newlines(occurrence);
                let distance = embeddings.distance(query, &text).await?;
                let verdict = Verdict::from_distance(distance, *low, *high);
                debug!(distance, %verdict, "Distance verdict");
                Ok(EmbeddingAssessment {
                    verdict,
                    distance: Some(distance),
                })
            }
            EmbeddingTier::Ternary(service) => {
                let verdict = service.verdict(query, occurrence).await?;
                debug!(%verdict, "Relatedness verdict");
                Ok(EmbeddingAssessment {
                    verdict,
                    distance: None,
                })
            }
        }
    }

    pub fn rule_name(&self) -> &'static str {
        match self {
            EmbeddingTier::Distance { .. } => "distance",
            EmbeddingTier::Ternary(_) => "ternary",
        }
    }
}

impl std::fmt::Debug for EmbeddingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingTier::Distance { low, high, .. } => f
                .debug_struct("EmbeddingTier::Distance")
                .field("low", low)
                .field("high", high)
                .finish(),
            EmbeddingTier::Ternary(service) => f
                .debug_struct("EmbeddingTier::Ternary")
                .field("thresholds", service.thresholds())
                .finish(),
        }
    }
}
