use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::ModelGateway;
use super::config::ModelKind;
use super::error::GatewayResult;
use crate::verdict::Verdict;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
/// Named `[low, high]` threshold pairs the relatedness model applies internally.
///
/// Ordered, so iteration (and therefore the cache key) is deterministic.
pub struct RelatednessThresholds(BTreeMap<String, [f64; 2]>);

impl RelatednessThresholds {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.0.insert(name.into(), [low, high]);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, [f64; 2])> {
        self.0.iter().map(|(name, pair)| (name.as_str(), *pair))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RelatednessThresholds {
    fn default() -> Self {
        Self::new()
            .with("HF", 1.0 - 0.3815, 1.0 - 0.1624)
            .with("Distance", 1.0 - 0.84894, 1.0 - 0.84572)
    }
}

#[async_trait]
/// (text1, text2, thresholds) → ternary verdict.
pub trait RelatednessBackend: Send + Sync {
    async fn classify(
        &self,
        text1: &str,
        text2: &str,
        thresholds: &RelatednessThresholds,
    ) -> GatewayResult<Verdict>;
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text1: &'a str,
    text2: &'a str,
    thresholds: &'a RelatednessThresholds,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    verdict: Verdict,
}

/// HTTP client for `POST /classify {text1, text2, thresholds} -> {verdict}`.
#[derive(Debug, Clone)]
pub struct RelatednessClient {
    gateway: Arc<ModelGateway>,
}

impl RelatednessClient {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        debug_assert_eq!(gateway.kind(), ModelKind::Relatedness);
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<ModelGateway> {
        &self.gateway
    }
}

#[async_trait]
impl RelatednessBackend for RelatednessClient {
    async fn classify(
        &self,
        text1: &str,
        text2: &str,
        thresholds: &RelatednessThresholds,
    ) -> GatewayResult<Verdict> {
        let resp: ClassifyResponse = self
            .gateway
            .call(&ClassifyRequest {
                text1,
                text2,
                thresholds,
            })
            .await?;
        Ok(resp.verdict)
    }
}
