//! Candidate ranking by embedding distance to the query.

pub mod accumulator;
pub mod types;


pub use accumulator::TopKAccumulator;
pub use types::{ScoredCandidate, TopK};
