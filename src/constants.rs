//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary constants from primary ones to avoid drift.
//!
//! # Histogram ranges
//!
//! Both latency histograms use [`HISTOGRAM_BUCKETS`] buckets. The embedding tier
//! covers one second (10ms per bucket) and the generative tier covers one hundred
//! seconds (1s per bucket).

use std::time::Duration;

/// Default number of candidates kept after the scan pass.
pub const DEFAULT_TOP_K: usize = 1000;

/// Default per-run cache capacity (entries, FIFO-evicted).
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Default number of corpus units classified concurrently.
pub const DEFAULT_UNIT_CONCURRENCY: usize = 4;

pub const DEFAULT_DISTANCE_LOW: f64 = 0.2;
pub const DEFAULT_DISTANCE_HIGH: f64 = 0.8;

/// Minimum Yes-probability for the generative tier to report a match.
pub const DEFAULT_YES_THRESHOLD: f64 = 0.5932;

pub const HISTOGRAM_BUCKETS: usize = 100;
pub const EMBEDDING_HISTOGRAM_MAX: Duration = Duration::from_secs(1);
pub const GENERATIVE_HISTOGRAM_MAX: Duration = Duration::from_secs(100);

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
pub const EMBEDDING_READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const RELATEDNESS_READ_TIMEOUT: Duration = Duration::from_secs(60);
pub const GENERATIVE_READ_TIMEOUT: Duration = Duration::from_secs(120);

pub const PROBE_INTERVAL: Duration = Duration::from_secs(1);
pub const PROBE_ATTEMPTS: u32 = 60;
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub const DEFAULT_EMBEDDING_URL: &str = "http://127.0.0.1:7860";
pub const DEFAULT_RELATED_URL: &str = "http://127.0.0.1:7871";
pub const DEFAULT_GENERATIVE_URL: &str = "http://127.0.0.1:7878";

/// Error bodies are cut to this many characters before landing in an error.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

/// Launched-service stdout/stderr kept for diagnostics; older output is dropped.
pub const MAX_LAUNCH_OUTPUT_BYTES: usize = 16 * 1024;
