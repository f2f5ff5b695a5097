//! HTTP gateways to the external model services.
//!
//! Three services sit behind the same lifecycle: an embedding model, a ternary
//! relatedness model and a generative model. [`ModelGateway`] owns startup and
//! transport; the typed clients ([`EmbeddingClient`], [`RelatednessClient`],
//! [`GenerativeClient`]) implement the backend traits the classifier depends on.

pub mod client;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generative;
pub mod launcher;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod relatedness;


pub use client::ModelGateway;
pub use config::{GatewayConfig, ModelKind};
pub use embedding::{EmbeddingBackend, EmbeddingClient};
pub use error::{GatewayError, GatewayResult};
pub use generative::{
    CompletionProbability, CompletionRequest, CompletionResponse, GenerativeBackend,
    GenerativeClient, SamplingParams, TokenProbability, YES_TOKEN,
};
pub use launcher::{
    CommandLauncher, ExternalLauncher, LaunchedService, ServiceLauncher, launcher_for,
};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockEmbeddingBackend, MockFailure, MockGenerativeBackend, MockRelatednessBackend};
pub use relatedness::{RelatednessBackend, RelatednessClient, RelatednessThresholds};
