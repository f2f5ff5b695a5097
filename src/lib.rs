//! Resemble library crate (used by the `resemble` binary and integration tests).
//!
//! Finds code in a corpus that is *related* to a natural-language or code query.
//!
//! # Public API Surface
//!
//! ## Pipeline
//! - [`Pipeline`], [`PipelineSettings`], [`ModelBackends`] - Two-pass search driver
//! - [`ScanPass`], [`ClassifyPass`], [`UnitSession`] - Manual session control
//! - [`CorpusUnit`], [`Occurrence`] - Input handed over by a syntax-tree walker
//!
//! ## Classification
//! - [`CascadeClassifier`], [`EmbeddingTier`], [`GenerativeTier`] - Two-tier cascade
//! - [`DecisionRule`], [`Verdict`], [`Decision`] - Verdict vocabulary
//! - [`TopKAccumulator`], [`TopK`] - Candidate ranking
//!
//! ## Model Services
//! - [`ModelGateway`], [`GatewayConfig`], [`ModelKind`] - Lazy-start HTTP gateways
//! - [`EmbeddingClient`], [`RelatednessClient`], [`GenerativeClient`] - Typed clients
//!
//! ## Reporting
//! - [`ReportSink`], [`InMemoryReport`] - Row destinations
//! - [`UnitPerformance`], [`LatencyHistogram`] - Per-unit latency instrumentation
//!
//! ## Test/Mock Support
//! Mock backends are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod candidate;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod corpus;
pub mod embedding;
pub mod gateway;
pub mod hashing;
pub mod perf;
pub mod pipeline;
pub mod ranking;
pub mod report;
pub mod verdict;

pub use cache::ComputeCache;
pub use candidate::{Candidate, MethodPattern, MethodShape, Parameter};
pub use classifier::{
    CascadeClassifier, Classification, ClassifyError, DecisionRule, EmbeddingTier,
    GenerativeTier, RelatednessService,
};
pub use config::{Config, ConfigError, DecisionRuleKind};
pub use corpus::{CorpusError, CorpusUnit, Occurrence};
pub use embedding::{EmbeddingError, EmbeddingService};
pub use gateway::{
    EmbeddingBackend, EmbeddingClient, GatewayConfig, GatewayError, GenerativeBackend,
    GenerativeClient, ModelGateway, ModelKind, RelatednessBackend, RelatednessClient,
    RelatednessThresholds, ServiceLauncher,
};
#[cfg(any(test, feature = "mock"))]
pub use gateway::{
    MockEmbeddingBackend, MockFailure, MockGenerativeBackend, MockRelatednessBackend,
};
pub use hashing::{CacheKey, KeyBuilder, hash_text};
pub use perf::{LatencyHistogram, Tier, UnitPerformance};
pub use pipeline::{
    ClassifyPass, ModelBackends, Pipeline, PipelineError, PipelineOutcome, PipelineSettings,
    ScanPass, UnitSession,
};
pub use ranking::{TopK, TopKAccumulator};
pub use report::{InMemoryReport, ReportSink, ReportSnapshot};
pub use verdict::{Decision, Verdict};
