use std::time::Duration;

use crate::constants::{EMBEDDING_HISTOGRAM_MAX, GENERATIVE_HISTOGRAM_MAX, HISTOGRAM_BUCKETS};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Fixed-width, non-cumulative latency distribution over `[0, max)`.
///
/// Buckets are allocated on the first in-range sample. Samples at or beyond `max`
/// are dropped rather than clamped into the last bucket, so a saturated tier shows
/// up as a count/histogram mismatch instead of a spike in the tail.
pub struct LatencyHistogram {
    max: Duration,
    bucket_count: usize,
    buckets: Option<Vec<u32>>,
}

impl LatencyHistogram {
    pub fn new(max: Duration, bucket_count: usize) -> Self {
        Self {
            max,
            bucket_count: bucket_count.max(1),
            buckets: None,
        }
    }

    /// 100 buckets of 10ms.
    pub fn embedding() -> Self {
        Self::new(EMBEDDING_HISTOGRAM_MAX, HISTOGRAM_BUCKETS)
    }

    /// 100 buckets of 1s.
    pub fn generative() -> Self {
        Self::new(GENERATIVE_HISTOGRAM_MAX, HISTOGRAM_BUCKETS)
    }

    /// Records one sample; returns `false` if it fell outside the range.
    pub fn add(&mut self, latency: Duration) -> bool {
        let width = self.bucket_width_nanos();
        let index = latency.as_nanos() / width;
        if index >= self.bucket_count as u128 {
            return false;
        }

        let count = self.bucket_count;
        let buckets = self.buckets.get_or_insert_with(|| vec![0; count]);
        buckets[index as usize] += 1;
        true
    }

    /// Bucket counts, or `None` if nothing in range was recorded.
    pub fn buckets(&self) -> Option<&[u32]> {
        self.buckets.as_deref()
    }

    /// Samples that landed in a bucket.
    pub fn total(&self) -> u64 {
        self.buckets
            .as_ref()
            .map(|b| b.iter().map(|c| u64::from(*c)).sum())
            .unwrap_or(0)
    }

    pub fn bucket_width(&self) -> Duration {
        Duration::from_nanos(self.bucket_width_nanos() as u64)
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    fn bucket_width_nanos(&self) -> u128 {
        (self.max.as_nanos() / self.bucket_count as u128).max(1)
    }
}
