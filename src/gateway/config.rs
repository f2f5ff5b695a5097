use std::time::Duration;

use serde::Serialize;

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_EMBEDDING_URL, DEFAULT_GENERATIVE_URL, DEFAULT_RELATED_URL,
    EMBEDDING_READ_TIMEOUT, GENERATIVE_READ_TIMEOUT, PROBE_ATTEMPTS, PROBE_INTERVAL,
    PROBE_TIMEOUT, RELATEDNESS_READ_TIMEOUT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
/// The external scoring services a pipeline talks to.
pub enum ModelKind {
    /// Text embedding model (`POST /embed`).
    Embedding,
    /// Ternary relatedness model (`POST /classify`).
    Relatedness,
    /// Generative model (`POST /completion`).
    Generative,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Embedding => "embedding",
            ModelKind::Relatedness => "relatedness",
            ModelKind::Generative => "generative",
        }
    }

    /// Path hit by the scoring call.
    pub fn call_path(&self) -> &'static str {
        match self {
            ModelKind::Embedding => "/embed",
            ModelKind::Relatedness => "/classify",
            ModelKind::Generative => "/completion",
        }
    }

    /// Path hit by the liveness probe.
    pub fn probe_path(&self) -> &'static str {
        match self {
            ModelKind::Embedding => "/embed",
            ModelKind::Relatedness | ModelKind::Generative => "/",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            ModelKind::Embedding => DEFAULT_EMBEDDING_URL,
            ModelKind::Relatedness => DEFAULT_RELATED_URL,
            ModelKind::Generative => DEFAULT_GENERATIVE_URL,
        }
    }

    /// Generative calls are far slower than the embedding tiers.
    pub fn default_read_timeout(&self) -> Duration {
        match self {
            ModelKind::Embedding => EMBEDDING_READ_TIMEOUT,
            ModelKind::Relatedness => RELATEDNESS_READ_TIMEOUT,
            ModelKind::Generative => GENERATIVE_READ_TIMEOUT,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
/// Addressing, timeouts and startup policy for one model service.
pub struct GatewayConfig {
    pub kind: ModelKind,
    /// Base URL without a trailing slash, e.g. `http://127.0.0.1:7860`.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Upper bound for one scoring round-trip.
    pub read_timeout: Duration,
    pub probe_timeout: Duration,
    pub probe_interval: Duration,
    pub probe_attempts: u32,
}

impl GatewayConfig {
    /// Defaults for `kind`.
    pub fn for_kind(kind: ModelKind) -> Self {
        Self {
            kind,
            base_url: kind.default_url().to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: kind.default_read_timeout(),
            probe_timeout: PROBE_TIMEOUT,
            probe_interval: PROBE_INTERVAL,
            probe_attempts: PROBE_ATTEMPTS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_probe_policy(mut self, interval: Duration, attempts: u32) -> Self {
        self.probe_interval = interval;
        self.probe_attempts = attempts;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn call_url(&self) -> String {
        format!("{}{}", self.base_url, self.kind.call_path())
    }

    pub fn probe_url(&self) -> String {
        format!("{}{}", self.base_url, self.kind.probe_path())
    }
}
