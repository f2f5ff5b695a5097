use thiserror::Error;

use crate::classifier::ClassifyError;
use crate::embedding::EmbeddingError;
use crate::gateway::GatewayError;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The scan pass could not score a candidate; a partial Top-K is never used.
    #[error("candidate ranking failed: {0}")]
    Ranking(#[source] EmbeddingError),

    /// A model service could not be reached or started.
    #[error("model service unavailable: {0}")]
    ServiceUnavailable(#[source] GatewayError),

    /// A classification error that cannot be attributed to one occurrence.
    #[error("classification failed: {0}")]
    Classify(#[source] ClassifyError),
}

impl From<EmbeddingError> for PipelineError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Gateway(e) if e.is_service_unavailable() => {
                PipelineError::ServiceUnavailable(e)
            }
            other => PipelineError::Ranking(other),
        }
    }
}

impl From<ClassifyError> for PipelineError {
    fn from(err: ClassifyError) -> Self {
        if !err.is_service_unavailable() {
            return PipelineError::Classify(err);
        }
        match err.into_gateway() {
            Ok(gateway) => PipelineError::ServiceUnavailable(gateway),
            Err(err) => PipelineError::Classify(err),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
