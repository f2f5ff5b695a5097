//! Lifecycle and transport for one model service.

use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use super::config::{GatewayConfig, ModelKind};
use super::error::{GatewayError, GatewayResult};
use super::launcher::{ExternalLauncher, LaunchedService, ServiceLauncher};
use crate::constants::MAX_ERROR_BODY_CHARS;

/// Shared handle to a model service endpoint.
///
/// Build one per [`ModelKind`] at startup and share it (`Arc<ModelGateway>`) across
/// pipeline runs. Startup happens at most once per gateway; scoring calls after that
/// are independent HTTP round-trips and may be issued concurrently.
pub struct ModelGateway {
    config: GatewayConfig,
    http: HttpClient,
    launcher: Arc<dyn ServiceLauncher>,
    ready: OnceCell<()>,
    service: Mutex<Option<LaunchedService>>,
}

impl ModelGateway {
    /// Creates a gateway that waits for an externally managed service.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        Self::with_launcher(config, Arc::new(ExternalLauncher))
    }

    pub fn with_launcher(
        config: GatewayConfig,
        launcher: Arc<dyn ServiceLauncher>,
    ) -> GatewayResult<Self> {
        let http = HttpClient::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(|e| GatewayError::Transport {
                kind: config.kind,
                url: config.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config,
            http,
            launcher,
            ready: OnceCell::new(),
            service: Mutex::new(None),
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.config.kind
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns `true` once [`ensure_ready`](Self::ensure_ready) has succeeded.
    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Makes sure the service is live, starting it if needed.
    ///
    /// Idempotent. Concurrent callers share one startup attempt; a failed attempt is
    /// not remembered, so a later call probes again.
    pub async fn ensure_ready(&self) -> GatewayResult<()> {
        self.ready
            .get_or_try_init(|| self.start_if_needed())
            .await
            .map(|_| ())
    }

    /// One lightweight liveness probe (`HEAD`, expects HTTP 200).
    pub async fn is_live(&self) -> bool {
        let url = self.config.probe_url();
        match self
            .http
            .head(&url)
            .timeout(self.config.probe_timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status() == StatusCode::OK,
            Err(e) => {
                debug!(kind = %self.config.kind, url = %url, error = %e, "Liveness probe failed");
                false
            }
        }
    }

    #[instrument(skip(self), fields(kind = %self.config.kind))]
    async fn start_if_needed(&self) -> GatewayResult<()> {
        if self.is_live().await {
            debug!("Model service already live");
            return Ok(());
        }

        debug!(launcher = self.launcher.name(), "Model service not live, launching");
        let mut launched = self.launcher.launch(self.config.kind).await?;

        for attempt in 1..=self.config.probe_attempts {
            if let Some(status) = launched.failed_exit() {
                warn!(%status, "Model service process exited during startup");
                let output = launched.collect_output(self.config.probe_timeout).await;
                return Err(self.unavailable(attempt, output));
            }

            if self.is_live().await {
                info!(attempts = attempt, url = %self.config.base_url, "Model service ready");
                *self.service.lock() = Some(launched);
                return Ok(());
            }

            debug!(attempt, "Model service not live yet");
            if attempt < self.config.probe_attempts {
                tokio::time::sleep(self.config.probe_interval).await;
            }
        }

        let output = launched.captured_output();
        Err(self.unavailable(self.config.probe_attempts, output))
    }

    fn unavailable(&self, attempts: u32, output: String) -> GatewayError {
        GatewayError::ServiceUnavailable {
            kind: self.config.kind,
            url: self.config.base_url.clone(),
            attempts,
            output,
        }
    }

    /// Stops a service this gateway launched. No-op for external services.
    pub fn shutdown(&self) {
        if self.service.lock().take().is_some() {
            info!(kind = %self.config.kind, "Stopped launched model service");
        }
    }

    /// Posts `body` to the scoring endpoint and decodes the JSON response.
    ///
    /// Never retries; callers decide whether to retry or escalate.
    pub async fn call<Req, Resp>(&self, body: &Req) -> GatewayResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        self.ensure_ready().await?;

        let kind = self.config.kind;
        let url = self.config.call_url();

        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                kind,
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| GatewayError::Transport {
            kind,
            url: url.clone(),
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(GatewayError::RequestFailed {
                kind,
                url,
                status: status.as_u16(),
                body: truncate_body(&String::from_utf8_lossy(&bytes)),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| GatewayError::DecodeFailed {
            kind,
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("kind", &self.config.kind)
            .field("base_url", &self.config.base_url)
            .field("ready", &self.is_ready())
            .finish()
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    cut.push_str("...");
    cut
}
