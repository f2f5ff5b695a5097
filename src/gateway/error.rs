use thiserror::Error;

use super::config::ModelKind;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Liveness never succeeded within the polling bound. Aborts the run.
    #[error("{kind} service unavailable at {url} after {attempts} probes; process output:\n{output}")]
    ServiceUnavailable {
        kind: ModelKind,
        url: String,
        attempts: u32,
        output: String,
    },

    /// The service answered with a non-success status.
    #[error("{kind} request to {url} failed with HTTP {status}: {body}")]
    RequestFailed {
        kind: ModelKind,
        url: String,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("{kind} response could not be decoded: {reason}")]
    DecodeFailed { kind: ModelKind, reason: String },

    /// Connection refused, connect timeout or read timeout.
    #[error("{kind} transport error for {url}: {reason}")]
    Transport {
        kind: ModelKind,
        url: String,
        reason: String,
    },

    /// The external launcher could not start the service.
    #[error("failed to launch {kind} service: {reason}")]
    LaunchFailed { kind: ModelKind, reason: String },
}

impl GatewayError {
    /// Returns `true` for errors that must abort the whole pipeline run.
    pub fn is_service_unavailable(&self) -> bool {
        matches!(
            self,
            GatewayError::ServiceUnavailable { .. } | GatewayError::LaunchFailed { .. }
        )
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            GatewayError::ServiceUnavailable { kind, .. }
            | GatewayError::RequestFailed { kind, .. }
            | GatewayError::DecodeFailed { kind, .. }
            | GatewayError::Transport { kind, .. }
            | GatewayError::LaunchFailed { kind, .. } => *kind,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
