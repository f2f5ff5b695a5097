//! Two-pass search driver.
//!
//! Pass 1 (scan) scores every distinct candidate against the query and freezes the
//! Top-K. Pass 2 (classify) runs the cascade on each occurrence whose pattern is in
//! the Top-K, recording report rows and per-unit latencies.

pub mod error;
pub mod runner;
pub mod session;
pub mod types;


pub use error::{PipelineError, PipelineResult};
pub use runner::Pipeline;
pub use session::{ClassifyPass, ScanPass, UnitSession};
pub use types::{
    ModelBackends, OccurrenceDecision, OccurrenceFailure, PipelineOutcome, PipelineSettings,
    UnitSummary,
};
