//! The expensive tier: a single-token Yes/No prediction.

use std::sync::Arc;

use tracing::debug;

use crate::cache::ComputeCache;
use crate::gateway::{
    CompletionRequest, GatewayError, GatewayResult, GenerativeBackend, SamplingParams,
};
use crate::hashing::KeyBuilder;

const PROMPT_NAMESPACE: &str = "prompt";

/// Chat-formatted prompt asking whether `code` matches `query`, ending in `ANS:`.
pub fn build_prompt(query: &str, code: &str) -> String {
    format!(
        "<|im_start|>system\n\
         You are tasked with predicting whether a certain code snippet matches the search query. \
         Answer as 'ANS: Yes' or 'ANS: No'<|im_end|>\n\
         <|im_start|>user\n\
         Code: '{code}'\n\
         Query: {query}\n\
         <|im_end|>\n\
         <|im_start|>assistant\n\
         ANS:"
    )
}

/// Generative backend, Yes-probability threshold and a per-run probability cache.
pub struct GenerativeTier {
    backend: Arc<dyn GenerativeBackend>,
    threshold: f64,
    params: SamplingParams,
    cache: ComputeCache<f64, GatewayError>,
}

impl GenerativeTier {
    pub fn new(backend: Arc<dyn GenerativeBackend>, threshold: f64, cache_capacity: usize) -> Self {
        Self {
            backend,
            threshold,
            params: SamplingParams::single_token(),
            cache: ComputeCache::with_capacity(cache_capacity),
        }
    }

    pub fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Probability mass the model puts on `Yes` for this pair.
    pub async fn yes_probability(&self, query: &str, code: &str) -> GatewayResult<f64> {
        let prompt = build_prompt(query, code);
        let key = KeyBuilder::new(PROMPT_NAMESPACE).text(&prompt).finish();
        let backend = Arc::clone(&self.backend);
        let params = self.params;
        self.cache
            .get_or_try_compute(key, || async move {
                let request = CompletionRequest::new(prompt, params);
                let response = backend.complete(&request).await?;
                Ok::<_, GatewayError>(response.yes_probability())
            })
            .await
    }

    /// `(is_related, yes_probability)`; related when the probability reaches the threshold.
    pub async fn decide(&self, query: &str, code: &str) -> GatewayResult<(bool, f64)> {
        let probability = self.yes_probability(query, code).await?;
        let related = probability >= self.threshold;
        debug!(probability, threshold = self.threshold, related, "Generative verdict");
        Ok((related, probability))
    }
}

impl std::fmt::Debug for GenerativeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeTier")
            .field("threshold", &self.threshold)
            .field("params", &self.params)
            .finish()
    }
}
