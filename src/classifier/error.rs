use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::gateway::GatewayError;

/// Failure classifying one occurrence.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("embedding tier failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("model call failed: {0}")]
    Gateway(#[from] GatewayError),
}

impl ClassifyError {
    /// `true` if the failure means a model service is gone, not just one bad call.
    pub fn is_service_unavailable(&self) -> bool {
        match self {
            ClassifyError::Embedding(e) => e.is_service_unavailable(),
            ClassifyError::Gateway(e) => e.is_service_unavailable(),
        }
    }

    /// The underlying gateway error, or `self` if there is none.
    pub fn into_gateway(self) -> Result<GatewayError, Self> {
        match self {
            ClassifyError::Embedding(EmbeddingError::Gateway(e)) | ClassifyError::Gateway(e) => Ok(e),
            other => Err(other),
        }
    }
}

pub type ClassifyResult<T> = Result<T, ClassifyError>;
