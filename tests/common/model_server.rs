//! In-process stand-ins for the three model services.
//!
//! Each server speaks the same wire format as the real service (`/embed`,
//! `/classify`, `/completion`), answers the liveness probe and records what it was
//! sent, so tests can drive the HTTP clients end to end.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{any, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use resemble::gateway::{GatewayConfig, ModelKind};

#[derive(Default)]
pub struct ServiceState {
    calls: AtomicUsize,
    bodies: Mutex<Vec<Value>>,
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    verdicts: Mutex<HashMap<String, i8>>,
    default_verdict: i8,
    yes_probability: f64,
}

impl ServiceState {
    pub fn with_yes_probability(yes_probability: f64) -> Self {
        Self {
            yes_probability,
            ..Self::default()
        }
    }

    pub fn with_default_verdict(default_verdict: i8) -> Self {
        Self {
            default_verdict,
            ..Self::default()
        }
    }

    pub fn vector(self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.lock().insert(text.to_string(), vector);
        self
    }

    pub fn verdict(self, text2: &str, verdict: i8) -> Self {
        self.verdicts.lock().insert(text2.to_string(), verdict);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().clone()
    }

    fn record(&self, body: &Value) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies.lock().push(body.clone());
    }
}

pub struct MockModelServer {
    pub addr: SocketAddr,
    pub state: Arc<ServiceState>,
    _handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockModelServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Gateway config for `kind` pointed at this server, with a fast probe policy.
    pub fn gateway_config(&self, kind: ModelKind) -> GatewayConfig {
        fast_config(kind, &self.url())
    }
}

impl Drop for MockModelServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub fn fast_config(kind: ModelKind, url: &str) -> GatewayConfig {
    GatewayConfig::for_kind(kind)
        .with_base_url(url)
        .with_probe_policy(std::time::Duration::from_millis(20), 10)
}

pub async fn find_available_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    Ok(addr.port())
}

async fn probe_ok() -> StatusCode {
    StatusCode::OK
}

async fn embed(State(state): State<Arc<ServiceState>>, Json(body): Json<Value>) -> Json<Value> {
    state.record(&body);
    let text = body["text"].as_str().unwrap_or_default();
    let vector = state
        .vectors
        .lock()
        .get(text)
        .cloned()
        .unwrap_or_else(|| vec![0.0, 0.0]);
    Json(json!({ "vector": vector }))
}

async fn classify(State(state): State<Arc<ServiceState>>, Json(body): Json<Value>) -> Json<Value> {
    state.record(&body);
    let text2 = body["text2"].as_str().unwrap_or_default();
    let verdict = state
        .verdicts
        .lock()
        .get(text2)
        .copied()
        .unwrap_or(state.default_verdict);
    Json(json!({ "verdict": verdict }))
}

async fn completion(
    State(state): State<Arc<ServiceState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.record(&body);
    let yes = state.yes_probability;
    let content = if yes >= 0.5 { " Yes" } else { " No" };
    Json(json!({
        "content": content,
        "completion_probabilities": [{
            "content": content,
            "probs": [
                { "tok_str": " Yes", "prob": yes },
                { "tok_str": " No", "prob": 1.0 - yes }
            ]
        }]
    }))
}

/// Router speaking the wire format of `kind`.
pub fn model_router(kind: ModelKind, state: Arc<ServiceState>) -> Router {
    let router = match kind {
        ModelKind::Embedding => Router::new().route("/embed", post(embed).head(probe_ok)),
        ModelKind::Relatedness => Router::new()
            .route("/", any(probe_ok))
            .route("/classify", post(classify)),
        ModelKind::Generative => Router::new()
            .route("/", any(probe_ok))
            .route("/completion", post(completion)),
    };
    router.with_state(state)
}

/// Router whose scoring endpoint always answers `status` with `body`.
pub fn failing_router(kind: ModelKind, status: StatusCode, body: String) -> Router {
    let respond = move || {
        let body = body.clone();
        async move { (status, body).into_response() }
    };
    Router::new()
        .route("/", any(probe_ok))
        .route(kind.call_path(), post(respond).head(probe_ok))
}

pub async fn spawn_router(router: Router) -> std::io::Result<(SocketAddr, JoinHandle<()>, oneshot::Sender<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    serve_on(listener, router)
}

pub fn serve_on(
    listener: TcpListener,
    router: Router,
) -> std::io::Result<(SocketAddr, JoinHandle<()>, oneshot::Sender<()>)> {
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await;
    });
    Ok((addr, handle, tx))
}

pub async fn spawn_model_server(
    kind: ModelKind,
    state: ServiceState,
) -> std::io::Result<MockModelServer> {
    let state = Arc::new(state);
    let (addr, handle, tx) = spawn_router(model_router(kind, Arc::clone(&state))).await?;
    Ok(MockModelServer {
        addr,
        state,
        _handle: handle,
        shutdown_tx: Some(tx),
    })
}

pub async fn spawn_failing_server(
    kind: ModelKind,
    status: StatusCode,
    body: impl Into<String>,
) -> std::io::Result<MockModelServer> {
    let (addr, handle, tx) = spawn_router(failing_router(kind, status, body.into())).await?;
    Ok(MockModelServer {
        addr,
        state: Arc::new(ServiceState::default()),
        _handle: handle,
        shutdown_tx: Some(tx),
    })
}
