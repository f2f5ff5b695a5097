use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::ModelGateway;
use super::config::ModelKind;
use super::error::GatewayResult;

/// Token whose probability decides the generative tier.
pub const YES_TOKEN: &str = "Yes";

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Body of `POST /completion`.
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f64,
    pub n_predict: u32,
    pub n_probs: u32,
    pub stream: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Sampling parameters for a completion.
pub struct SamplingParams {
    pub temperature: f64,
    pub n_predict: u32,
    pub n_probs: u32,
}

impl SamplingParams {
    /// Greedy single-token prediction with the top five alternatives.
    pub fn single_token() -> Self {
        Self {
            temperature: 0.0,
            n_predict: 1,
            n_probs: 5,
        }
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self::single_token()
    }
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, params: SamplingParams) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: params.temperature,
            n_predict: params.n_predict,
            n_probs: params.n_probs,
            stream: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenProbability {
    #[serde(alias = "tok_str")]
    pub tok: String,
    pub prob: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// Alternatives considered at one generated position.
pub struct CompletionProbability {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub probs: Vec<TokenProbability>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub completion_probabilities: Vec<CompletionProbability>,
}

impl CompletionResponse {
    /// Probability mass on the `Yes` token at the first generated position.
    ///
    /// Tokenizers emit both `"Yes"` and `" Yes"`; their probabilities are summed. No
    /// candidate means probability zero. The free-text `content` is never inspected.
    pub fn yes_probability(&self) -> f64 {
        self.completion_probabilities
            .first()
            .map(|position| {
                position
                    .probs
                    .iter()
                    .filter(|p| p.tok.trim() == YES_TOKEN)
                    .map(|p| p.prob)
                    .sum::<f64>()
                    .min(1.0)
            })
            .unwrap_or(0.0)
    }
}

#[async_trait]
/// Prompt → completion with token probabilities.
pub trait GenerativeBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> GatewayResult<CompletionResponse>;

    /// Free-text generation; returns the completion content only.
    async fn generate(&self, prompt: &str, params: SamplingParams) -> GatewayResult<String> {
        let request = CompletionRequest::new(prompt, params);
        Ok(self.complete(&request).await?.content)
    }
}

/// HTTP client for `POST /completion`.
#[derive(Debug, Clone)]
pub struct GenerativeClient {
    gateway: Arc<ModelGateway>,
}

impl GenerativeClient {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        debug_assert_eq!(gateway.kind(), ModelKind::Generative);
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<ModelGateway> {
        &self.gateway
    }
}

#[async_trait]
impl GenerativeBackend for GenerativeClient {
    async fn complete(&self, request: &CompletionRequest) -> GatewayResult<CompletionResponse> {
        self.gateway.call(request).await
    }
}
