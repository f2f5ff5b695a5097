use std::time::Duration;

use serde::Serialize;

use super::histogram::LatencyHistogram;
use crate::report::PerformanceRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
/// Classifier tier a latency sample belongs to.
pub enum Tier {
    Embedding,
    Generative,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Embedding => "embedding",
            Tier::Generative => "generative",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
/// Request count, histogram and max latency for one tier.
pub struct TierRecorder {
    count: u32,
    histogram: LatencyHistogram,
    max: Duration,
}

impl TierRecorder {
    pub fn new(histogram: LatencyHistogram) -> Self {
        Self {
            count: 0,
            histogram,
            max: Duration::ZERO,
        }
    }

    /// Counts the request even if the histogram drops the sample.
    pub fn record(&mut self, latency: Duration) {
        self.count += 1;
        self.histogram.add(latency);
        self.max = self.max.max(latency);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn histogram(&self) -> &LatencyHistogram {
        &self.histogram
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

#[derive(Debug, Clone)]
/// Latency bookkeeping for one corpus unit.
pub struct UnitPerformance {
    embedding: TierRecorder,
    generative: TierRecorder,
}

impl UnitPerformance {
    pub fn new() -> Self {
        Self {
            embedding: TierRecorder::new(LatencyHistogram::embedding()),
            generative: TierRecorder::new(LatencyHistogram::generative()),
        }
    }

    pub fn record(&mut self, tier: Tier, latency: Duration) {
        self.tier_mut(tier).record(latency);
    }

    pub fn tier(&self, tier: Tier) -> &TierRecorder {
        match tier {
            Tier::Embedding => &self.embedding,
            Tier::Generative => &self.generative,
        }
    }

    fn tier_mut(&mut self, tier: Tier) -> &mut TierRecorder {
        match tier {
            Tier::Embedding => &mut self.embedding,
            Tier::Generative => &mut self.generative,
        }
    }

    /// One row per tier that saw at least one request.
    pub fn rows(&self, source: &str) -> Vec<PerformanceRow> {
        [Tier::Embedding, Tier::Generative]
            .into_iter()
            .filter(|tier| self.tier(*tier).count() > 0)
            .map(|tier| {
                let recorder = self.tier(tier);
                PerformanceRow {
                    source: source.to_string(),
                    tier,
                    count: recorder.count(),
                    histogram: recorder.histogram().buckets().map(<[u32]>::to_vec),
                    max_latency_ms: recorder.max().as_secs_f64() * 1000.0,
                }
            })
            .collect()
    }
}

impl Default for UnitPerformance {
    fn default() -> Self {
        Self::new()
    }
}
