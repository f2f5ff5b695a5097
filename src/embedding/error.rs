use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Mismatched or empty vectors. A programming error, never retried.
    #[error("invalid embedding input: {reason}")]
    InvalidInput { reason: String },
}

impl EmbeddingError {
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, EmbeddingError::Gateway(e) if e.is_service_unavailable())
    }
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;
