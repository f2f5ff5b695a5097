//! Reporting boundary: the rows a run produces and where they go.

pub mod sink;
pub mod types;


pub use sink::{InMemoryReport, ReportSink, ReportSnapshot};
pub use types::{CodeSearchRow, FailureRow, PerformanceRow, SuggestedPatternRow, TopKRow};
