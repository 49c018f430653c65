//! Bounded in-memory cache of query embeddings

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::embeddings::QueryEmbedder;
use crate::errors::Result;

/// Wraps an embedder and remembers vectors for recently seen query text.
///
/// Keys are the exact text handed to the inner embedder, so a cache hit
/// returns the same vector a fresh call would have.
pub struct CachedEmbedder {
    inner: Arc<dyn QueryEmbedder>,
    entries: DashMap<String, Arc<Vec<f32>>>,
    capacity: usize,
}

impl CachedEmbedder {
    #[must_use]
    pub fn new(inner: Arc<dyn QueryEmbedder>, capacity: usize) -> Self {
        Self {
            inner,
            entries: DashMap::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn make_room(&self) {
        while self.entries.len() >= self.capacity {
            // DashMap has no recency order; drop an arbitrary entry.
            let victim = self.entries.iter().next().map(|e| e.key().clone());
            match victim {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl QueryEmbedder for CachedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(hit) = self.entries.get(text) {
            debug!("Query embedding cache hit");
            return Ok(hit.value().as_ref().clone());
        }

        let embedding = self.inner.embed(text).await?;
        self.make_room();
        self.entries
            .insert(text.to_string(), Arc::new(embedding.clone()));
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::KbRagError;

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QueryEmbedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text == "fail" {
                return Err(KbRagError::EmbeddingError("down".to_string()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn counting() -> Arc<CountingEmbedder> {
        Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_repeated_query_hits_cache() {
        let inner = counting();
        let cache = CachedEmbedder::new(inner.clone(), 8);

        let first = cache.embed("refund policy").await.unwrap();
        let second = cache.embed("refund policy").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_text_is_not_conflated() {
        let inner = counting();
        let cache = CachedEmbedder::new(inner.clone(), 8);

        cache.embed("Refund policy").await.unwrap();
        cache.embed("refund policy").await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let inner = counting();
        let cache = CachedEmbedder::new(inner, 2);

        for q in ["a", "bb", "ccc", "dddd"] {
            cache.embed(q).await.unwrap();
        }
        assert!(cache.len() <= 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let inner = counting();
        let cache = CachedEmbedder::new(inner.clone(), 4);

        assert!(cache.embed("fail").await.is_err());
        assert!(cache.embed("fail").await.is_err());
        assert!(cache.is_empty());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
