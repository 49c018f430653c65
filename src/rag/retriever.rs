//! Similarity-ranked chunk retrieval

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::RetrievalConfig;
use crate::errors::KbRagError;
use crate::errors::Result;
use crate::models::SearchResult;
use crate::models::TruthPriority;

/// Hard cap on results for a bare search call
pub const SEARCH_MAX_LIMIT: usize = 50;

/// Hard cap on chunks handed to answer synthesis
pub const ANSWER_MAX_LIMIT: usize = 15;

/// Indexed chunk store queried by embedding.
///
/// Implementations return matches with `similarity >= threshold`, sorted by
/// descending similarity, restricted to `priority_filter` when set.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn search(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
        priority_filter: Option<TruthPriority>,
    ) -> Result<Vec<SearchResult>>;
}

/// Limit and threshold policy for one kind of call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalProfile {
    pub default_limit: usize,
    pub max_limit: usize,
    pub default_threshold: f32,
}

impl RetrievalProfile {
    /// Precision-biased profile for results shown directly to the caller
    #[must_use]
    pub fn search(config: &RetrievalConfig) -> Self {
        Self {
            default_limit: config.search_default_limit.clamp(1, SEARCH_MAX_LIMIT),
            max_limit: SEARCH_MAX_LIMIT,
            default_threshold: config.search_default_threshold,
        }
    }

    /// Recall-biased profile; the synthesis step judges relevance downstream
    #[must_use]
    pub fn answer(config: &RetrievalConfig) -> Self {
        Self {
            default_limit: config.answer_default_limit.clamp(1, ANSWER_MAX_LIMIT),
            max_limit: ANSWER_MAX_LIMIT,
            default_threshold: config.answer_default_threshold,
        }
    }

    /// Clamp a caller-supplied limit into `[1, max_limit]`
    #[must_use]
    pub fn limit(&self, requested: Option<i64>) -> usize {
        match requested {
            None => self.default_limit,
            Some(n) if n < 1 => 1,
            Some(n) => usize::try_from(n).map_or(self.max_limit, |n| n.min(self.max_limit)),
        }
    }

    /// Clamp a caller-supplied threshold into `[0, 1]`
    #[must_use]
    pub fn threshold(&self, requested: Option<f32>) -> f32 {
        match requested {
            Some(t) if t.is_finite() => t.clamp(0.0, 1.0),
            _ => self.default_threshold,
        }
    }
}

/// Runs similarity searches against a [`VectorStore`]
pub struct ChunkRetriever {
    store: Arc<dyn VectorStore>,
    timeout: Duration,
}

impl ChunkRetriever {
    pub fn new(store: Arc<dyn VectorStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Ranked matches for `embedding`, best first.
    ///
    /// The store's output is re-checked: anything under `threshold`, outside
    /// `priority_filter` or past `limit` is discarded.
    pub async fn retrieve(
        &self,
        embedding: &[f32],
        limit: usize,
        threshold: f32,
        priority_filter: Option<TruthPriority>,
    ) -> Result<Vec<SearchResult>> {
        debug!(
            "Retrieving up to {} chunks (threshold {:.2}, filter {:?})",
            limit, threshold, priority_filter
        );

        let mut results = tokio::time::timeout(
            self.timeout,
            self.store.search(embedding, threshold, limit, priority_filter),
        )
        .await
        .map_err(|_| {
            KbRagError::Timeout(format!(
                "vector search exceeded {}s",
                self.timeout.as_secs()
            ))
        })??;

        let returned = results.len();
        results.retain(|r| {
            r.similarity >= threshold
                && priority_filter.map_or(true, |p| r.chunk.truth_priority == p)
        });
        if results.len() != returned {
            tracing::warn!(
                "Vector store returned {} rows violating threshold or filter",
                returned - results.len()
            );
        }
        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(limit);

        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::Chunk;
    use crate::models::DocumentRef;

    fn result(similarity: f32, priority: TruthPriority) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: Uuid::new_v4(),
                document_id: Uuid::new_v4(),
                content: "content".to_string(),
                chunk_index: 0,
                section_title: None,
                truth_priority: priority,
                token_count: 10,
            },
            document: DocumentRef {
                file_name: "doc.md".to_string(),
                ..DocumentRef::default()
            },
            similarity,
        }
    }

    /// Returns a fixed list regardless of the arguments
    struct SloppyStore(Vec<SearchResult>);

    #[async_trait]
    impl VectorStore for SloppyStore {
        async fn search(
            &self,
            _embedding: &[f32],
            _threshold: f32,
            _limit: usize,
            _priority_filter: Option<TruthPriority>,
        ) -> Result<Vec<SearchResult>> {
            Ok(self.0.clone())
        }
    }

    struct SlowStore;

    #[async_trait]
    impl VectorStore for SlowStore {
        async fn search(
            &self,
            _embedding: &[f32],
            _threshold: f32,
            _limit: usize,
            _priority_filter: Option<TruthPriority>,
        ) -> Result<Vec<SearchResult>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_search_profile_clamps_limit() {
        let profile = RetrievalProfile::search(&RetrievalConfig::default());
        assert_eq!(profile.limit(None), 10);
        assert_eq!(profile.limit(Some(1000)), SEARCH_MAX_LIMIT);
        assert_eq!(profile.limit(Some(0)), 1);
        assert_eq!(profile.limit(Some(-7)), 1);
        assert_eq!(profile.limit(Some(25)), 25);
    }

    #[test]
    fn test_answer_profile_clamps_limit() {
        let profile = RetrievalProfile::answer(&RetrievalConfig::default());
        assert_eq!(profile.limit(None), 8);
        assert_eq!(profile.limit(Some(1000)), ANSWER_MAX_LIMIT);
        assert_eq!(profile.limit(Some(i64::MAX)), ANSWER_MAX_LIMIT);
    }

    #[test]
    fn test_threshold_defaults_and_clamps() {
        let search = RetrievalProfile::search(&RetrievalConfig::default());
        let answer = RetrievalProfile::answer(&RetrievalConfig::default());
        assert!((search.threshold(None) - 0.7).abs() < f32::EPSILON);
        assert!((answer.threshold(None) - 0.3).abs() < f32::EPSILON);
        assert!((search.threshold(Some(1.7)) - 1.0).abs() < f32::EPSILON);
        assert!(search.threshold(Some(-0.2)).abs() < f32::EPSILON);
        assert!((search.threshold(Some(f32::NAN)) - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_results_below_threshold_are_dropped() {
        let store = SloppyStore(vec![
            result(0.9, TruthPriority::Standard),
            result(0.5, TruthPriority::Standard),
            result(0.71, TruthPriority::High),
        ]);
        let retriever = ChunkRetriever::new(Arc::new(store), Duration::from_secs(1));

        let results = retriever.retrieve(&[0.0], 10, 0.7, None).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.similarity >= 0.7));
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn test_priority_filter_is_hard() {
        let store = SloppyStore(vec![
            result(0.95, TruthPriority::Standard),
            result(0.8, TruthPriority::Authoritative),
        ]);
        let retriever = ChunkRetriever::new(Arc::new(store), Duration::from_secs(1));

        let results = retriever
            .retrieve(&[0.0], 10, 0.0, Some(TruthPriority::Authoritative))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.truth_priority, TruthPriority::Authoritative);
    }

    #[tokio::test]
    async fn test_limit_is_enforced() {
        let store = SloppyStore(
            (0..30)
                .map(|i| result(0.99 - i as f32 * 0.01, TruthPriority::Standard))
                .collect(),
        );
        let retriever = ChunkRetriever::new(Arc::new(store), Duration::from_secs(1));

        let results = retriever.retrieve(&[0.0], 15, 0.0, None).await.unwrap();
        assert_eq!(results.len(), 15);
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let retriever = ChunkRetriever::new(Arc::new(SlowStore), Duration::from_millis(20));
        let err = retriever.retrieve(&[0.0], 5, 0.3, None).await.unwrap_err();
        assert!(matches!(err, KbRagError::Timeout(_)));
    }
}
