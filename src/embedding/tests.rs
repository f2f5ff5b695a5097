use std::sync::Arc;

use super::*;
use crate::gateway::{MockEmbeddingBackend, MockFailure};

fn service_with(backend: &Arc<MockEmbeddingBackend>, capacity: usize) -> EmbeddingService {
    EmbeddingService::new(Arc::clone(backend) as _, capacity)
}

#[test]
fn test_euclidean_distance() {
    let d = euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
    assert!((d - 5.0).abs() < 1e-9);

    let same = euclidean_distance(&[1.5, -2.0, 0.25], &[1.5, -2.0, 0.25]).unwrap();
    assert_eq!(same, 0.0);
}

#[test]
fn test_euclidean_distance_rejects_bad_input() {
    let mismatch = euclidean_distance(&[1.0, 2.0], &[1.0]);
    assert!(matches!(mismatch, Err(EmbeddingError::InvalidInput { .. })));

    let empty = euclidean_distance(&[], &[]);
    assert!(matches!(empty, Err(EmbeddingError::InvalidInput { .. })));
}

#[tokio::test]
async fn test_embed_is_cached_per_text() {
    let backend = Arc::new(MockEmbeddingBackend::new());
    backend.insert("query", vec![0.0, 1.0]);
    backend.insert("int size()", vec![0.0, 0.0]);
    let service = service_with(&backend, 10);

    let d1 = service.distance("query", "int size()").await.unwrap();
    let d2 = service.distance("query", "int size()").await.unwrap();

    assert!((d1 - 1.0).abs() < 1e-9);
    assert_eq!(d1, d2);
    assert_eq!(backend.calls(), 2);
    assert_eq!(service.cached_len(), 2);
}

#[tokio::test]
async fn test_embed_propagates_gateway_errors() {
    let backend = Arc::new(MockEmbeddingBackend::with_fallback(vec![1.0]));
    backend.fail_on("down", MockFailure::Unavailable);
    backend.fail_on("broken", MockFailure::Request);
    let service = service_with(&backend, 10);

    let err = service.embed("down").await.unwrap_err();
    assert!(err.is_service_unavailable());

    let err = service.embed("broken").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Gateway(_)));
    assert!(!err.is_service_unavailable());

    // Errors are not cached: a retry calls the backend again.
    let _ = service.embed("broken").await;
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn test_distance_dimension_mismatch() {
    let backend = Arc::new(MockEmbeddingBackend::new());
    backend.insert("a", vec![1.0, 2.0]);
    backend.insert("b", vec![1.0, 2.0, 3.0]);
    let service = service_with(&backend, 10);

    let err = service.distance("a", "b").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::InvalidInput { .. }));
}
