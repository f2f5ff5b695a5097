//! Embedding vectors via the embedding gateway.
//!
//! [`EmbeddingService`] is the only place vectors are fetched; both the ranking pass
//! (signatures) and the distance decision rule (occurrences) go through it.

mod error;
pub mod service;

#[cfg(test)]
mod tests;

pub use error::{EmbeddingError, EmbeddingResult};
pub use service::{EmbeddingService, euclidean_distance};
