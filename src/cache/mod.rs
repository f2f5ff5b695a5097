//! Per-run result caches.

pub mod compute;


pub use compute::ComputeCache;
