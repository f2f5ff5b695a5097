//! Cached embeddings and the distances derived from them.

use std::sync::Arc;

use tracing::debug;

use super::error::{EmbeddingError, EmbeddingResult};
use crate::cache::ComputeCache;
use crate::gateway::EmbeddingBackend;
use crate::hashing::KeyBuilder;

const EMBED_NAMESPACE: &str = "embed";

/// Embedding backend fronted by a per-run [`ComputeCache`].
///
/// Texts are cached verbatim: callers normalize (e.g. strip newlines) before asking.
pub struct EmbeddingService {
    backend: Arc<dyn EmbeddingBackend>,
    cache: ComputeCache<Arc<[f32]>, EmbeddingError>,
}

impl EmbeddingService {
    pub fn new(backend: Arc<dyn EmbeddingBackend>, cache_capacity: usize) -> Self {
        Self {
            backend,
            cache: ComputeCache::with_capacity(cache_capacity),
        }
    }

    /// Embeds `text`, computing each distinct text at most once while cached.
    pub async fn embed(&self, text: &str) -> EmbeddingResult<Arc<[f32]>> {
        let key = KeyBuilder::new(EMBED_NAMESPACE).text(text).finish();
        let backend = Arc::clone(&self.backend);
        self.cache
            .get_or_try_compute(key, || async move {
                let vector = backend.embed(text).await?;
                debug!(dim = vector.len(), "Computed embedding");
                Ok::<_, EmbeddingError>(Arc::from(vector))
            })
            .await
    }

    /// Euclidean distance between the embeddings of `a` and `b`.
    pub async fn distance(&self, a: &str, b: &str) -> EmbeddingResult<f64> {
        let left = self.embed(a).await?;
        let right = self.embed(b).await?;
        euclidean_distance(&left, &right)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("cache", &self.cache)
            .finish()
    }
}

/// Euclidean (L2) distance, accumulated in `f64`.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> EmbeddingResult<f64> {
    if a.is_empty() || b.is_empty() {
        return Err(EmbeddingError::InvalidInput {
            reason: "cannot measure distance of an empty vector".to_string(),
        });
    }
    if a.len() != b.len() {
        return Err(EmbeddingError::InvalidInput {
            reason: format!("dimension mismatch: {} vs {}", a.len(), b.len()),
        });
    }

    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum();
    Ok(sum.sqrt())
}
