//! Cascading relatedness classifier.
//!
//! ```text
//! START -> EMBEDDING_TIER -> MATCH | NO_MATCH | GENERATIVE_TIER -> MATCH | NO_MATCH
//! ```

pub mod cascade;
pub mod embedding_tier;
pub mod error;
pub mod generative_tier;
pub mod types;


pub use cascade::CascadeClassifier;
pub use embedding_tier::{EmbeddingTier, RelatednessService};
pub use error::{ClassifyError, ClassifyResult};
pub use generative_tier::{GenerativeTier, build_prompt};
pub use types::{Classification, DecisionRule, EmbeddingAssessment};
