//! Per-unit latency instrumentation for the classifier tiers.

pub mod histogram;
pub mod recorder;


pub use histogram::LatencyHistogram;
pub use recorder::{Tier, TierRecorder, UnitPerformance};
