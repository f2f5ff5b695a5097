use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::ModelGateway;
use super::config::ModelKind;
use super::error::{GatewayError, GatewayResult};

#[async_trait]
/// Text → vector.
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, text: &str) -> GatewayResult<Vec<f32>>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    vector: Vec<f32>,
}

/// HTTP client for `POST /embed {text} -> {vector}`.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    gateway: Arc<ModelGateway>,
}

impl EmbeddingClient {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        debug_assert_eq!(gateway.kind(), ModelKind::Embedding);
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<ModelGateway> {
        &self.gateway
    }
}

#[async_trait]
impl EmbeddingBackend for EmbeddingClient {
    async fn embed(&self, text: &str) -> GatewayResult<Vec<f32>> {
        let resp: EmbedResponse = self.gateway.call(&EmbedRequest { text }).await?;
        if resp.vector.is_empty() {
            return Err(GatewayError::DecodeFailed {
                kind: ModelKind::Embedding,
                reason: "embedding vector is empty".to_string(),
            });
        }
        Ok(resp.vector)
    }
}
