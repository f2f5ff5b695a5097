//! In-memory backends for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::config::ModelKind;
use super::embedding::EmbeddingBackend;
use super::error::{GatewayError, GatewayResult};
use super::generative::{
    CompletionProbability, CompletionRequest, CompletionResponse, GenerativeBackend,
    TokenProbability,
};
use super::relatedness::{RelatednessBackend, RelatednessThresholds};
use crate::verdict::Verdict;

fn mock_failure(kind: ModelKind) -> GatewayError {
    GatewayError::RequestFailed {
        kind,
        url: "mock://".to_string(),
        status: 500,
        body: "mock failure".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Failure a mock backend should report.
pub enum MockFailure {
    /// HTTP 500 from the service.
    Request,
    /// The service never came up.
    Unavailable,
}

impl MockFailure {
    fn to_error(self, kind: ModelKind) -> GatewayError {
        match self {
            MockFailure::Request => mock_failure(kind),
            MockFailure::Unavailable => GatewayError::ServiceUnavailable {
                kind,
                url: "mock://".to_string(),
                attempts: 0,
                output: String::new(),
            },
        }
    }
}

/// Embeds known texts to fixed vectors; unknown texts get `fallback`.
#[derive(Default)]
pub struct MockEmbeddingBackend {
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    failures: Mutex<HashMap<String, MockFailure>>,
    fallback: Option<Vec<f32>>,
    calls: AtomicUsize,
}

impl MockEmbeddingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: Vec<f32>) -> Self {
        Self {
            fallback: Some(fallback),
            ..Self::default()
        }
    }

    pub fn insert(&self, text: &str, vector: Vec<f32>) {
        self.vectors.lock().insert(text.to_string(), vector);
    }

    /// Embedding `text` fails with `failure`.
    pub fn fail_on(&self, text: &str, failure: MockFailure) {
        self.failures.lock().insert(text.to_string(), failure);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed(&self, text: &str) -> GatewayResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.failures.lock().get(text) {
            return Err(failure.to_error(ModelKind::Embedding));
        }
        self.vectors
            .lock()
            .get(text)
            .cloned()
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| mock_failure(ModelKind::Embedding))
    }
}

/// Returns a fixed verdict per occurrence text (`text2`).
pub struct MockRelatednessBackend {
    verdicts: Mutex<HashMap<String, Verdict>>,
    default: Verdict,
    calls: AtomicUsize,
}

impl MockRelatednessBackend {
    pub fn new(default: Verdict) -> Self {
        Self {
            verdicts: Mutex::new(HashMap::new()),
            default,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, text2: &str, verdict: Verdict) {
        self.verdicts.lock().insert(text2.to_string(), verdict);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelatednessBackend for MockRelatednessBackend {
    async fn classify(
        &self,
        _text1: &str,
        text2: &str,
        _thresholds: &RelatednessThresholds,
    ) -> GatewayResult<Verdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .verdicts
            .lock()
            .get(text2)
            .copied()
            .unwrap_or(self.default))
    }
}

/// Answers every completion with a fixed `Yes` probability, optionally failing.
pub struct MockGenerativeBackend {
    yes_probability: f64,
    fail: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerativeBackend {
    pub fn new(yes_probability: f64) -> Self {
        Self {
            yes_probability,
            fail: false,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0.0)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl GenerativeBackend for MockGenerativeBackend {
    async fn complete(&self, request: &CompletionRequest) -> GatewayResult<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(request.prompt.clone());
        if self.fail {
            return Err(mock_failure(ModelKind::Generative));
        }

        let yes = self.yes_probability;
        let content = if yes >= 0.5 { " Yes" } else { " No" };
        Ok(CompletionResponse {
            content: content.to_string(),
            completion_probabilities: vec![CompletionProbability {
                content: content.to_string(),
                probs: vec![
                    TokenProbability {
                        tok: " Yes".to_string(),
                        prob: yes,
                    },
                    TokenProbability {
                        tok: " No".to_string(),
                        prob: 1.0 - yes,
                    },
                ],
            }],
        })
    }
}
