use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use super::types::{CodeSearchRow, FailureRow, PerformanceRow, SuggestedPatternRow, TopKRow};

/// Receives report rows as the pipeline produces them.
///
/// Rows arrive from concurrently classified units, so implementations must be
/// thread-safe; no ordering across units is implied.
pub trait ReportSink: Send + Sync {
    fn code_search(&self, row: CodeSearchRow);
    fn performance(&self, row: PerformanceRow);
    fn top_k(&self, row: TopKRow);
    fn suggested_pattern(&self, row: SuggestedPatternRow);
    fn failure(&self, row: FailureRow);
}

#[derive(Debug, Default)]
struct Tables {
    code_search: Vec<CodeSearchRow>,
    performance: Vec<PerformanceRow>,
    top_k: Vec<TopKRow>,
    suggested_patterns: Vec<SuggestedPatternRow>,
    failures: Vec<FailureRow>,
}

/// Collects every row in memory.
pub struct InMemoryReport {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    tables: Mutex<Tables>,
}

impl InMemoryReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            tables: Mutex::new(Tables::default()),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn snapshot(&self) -> ReportSnapshot {
        let tables = self.tables.lock();
        ReportSnapshot {
            run_id: self.run_id,
            started_at: self.started_at,
            code_search: tables.code_search.clone(),
            performance: tables.performance.clone(),
            top_k: tables.top_k.clone(),
            suggested_patterns: tables.suggested_patterns.clone(),
            failures: tables.failures.clone(),
        }
    }
}

impl Default for InMemoryReport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.lock();
        f.debug_struct("InMemoryReport")
            .field("run_id", &self.run_id)
            .field("code_search", &tables.code_search.len())
            .field("top_k", &tables.top_k.len())
            .finish()
    }
}

impl ReportSink for InMemoryReport {
    fn code_search(&self, row: CodeSearchRow) {
        self.tables.lock().code_search.push(row);
    }

    fn performance(&self, row: PerformanceRow) {
        self.tables.lock().performance.push(row);
    }

    fn top_k(&self, row: TopKRow) {
        self.tables.lock().top_k.push(row);
    }

    fn suggested_pattern(&self, row: SuggestedPatternRow) {
        self.tables.lock().suggested_patterns.push(row);
    }

    fn failure(&self, row: FailureRow) {
        self.tables.lock().failures.push(row);
    }
}

#[derive(Debug, Clone, Serialize)]
/// Point-in-time copy of every table.
pub struct ReportSnapshot {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub code_search: Vec<CodeSearchRow>,
    pub performance: Vec<PerformanceRow>,
    pub top_k: Vec<TopKRow>,
    pub suggested_patterns: Vec<SuggestedPatternRow>,
    pub failures: Vec<FailureRow>,
}
