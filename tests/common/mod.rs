//! In-memory collaborators for pipeline and API tests

#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use kbrag::config::AppConfig;
use kbrag::embeddings::QueryEmbedder;
use kbrag::llm::AnswerProvider;
use kbrag::models::Chunk;
use kbrag::models::DocumentRef;
use kbrag::models::SearchQueryLog;
use kbrag::models::SearchResult;
use kbrag::models::TruthPriority;
use kbrag::rag::Collaborators;
use kbrag::rag::DriveUrlResolver;
use kbrag::rag::KnowledgeService;
use kbrag::rag::SearchLogSink;
use kbrag::rag::VectorStore;
use kbrag::KbRagError;
use kbrag::Result;
use uuid::Uuid;

pub fn chunk(file_name: &str, similarity: f32, priority: TruthPriority) -> SearchResult {
    SearchResult {
        chunk: Chunk {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            content: format!("Excerpt from {file_name}."),
            chunk_index: 0,
            section_title: Some("Overview".to_string()),
            truth_priority: priority,
            token_count: 12,
        },
        document: DocumentRef {
            file_name: file_name.to_string(),
            drive_file_id: Some(format!("drive-{file_name}")),
            ..Default::default()
        },
        similarity,
    }
}

/// `count` standard chunks with similarities stepping down from 0.99
pub fn corpus(count: usize) -> Vec<SearchResult> {
    (0..count)
        .map(|i| chunk(&format!("doc-{i}.md"), 0.99 - i as f32 * 0.001, TruthPriority::Standard))
        .collect()
}

#[derive(Default)]
pub struct FakeEmbedder {
    pub calls: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl QueryEmbedder for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(KbRagError::EmbeddingError("embedding service down".to_string()));
        }
        Ok(vec![0.1, 0.2, 0.3])
    }
}

/// Applies threshold, filter and limit to a fixed corpus
#[derive(Default)]
pub struct FakeStore {
    pub corpus: Vec<SearchResult>,
    pub calls: AtomicUsize,
}

impl FakeStore {
    pub fn with(corpus: Vec<SearchResult>) -> Self {
        Self {
            corpus,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn search(
        &self,
        _embedding: &[f32],
        threshold: f32,
        limit: usize,
        priority_filter: Option<TruthPriority>,
    ) -> Result<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut hits: Vec<SearchResult> = self
            .corpus
            .iter()
            .filter(|r| r.similarity >= threshold)
            .filter(|r| priority_filter.map_or(true, |p| r.chunk.truth_priority == p))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(limit);
        Ok(hits)
    }
}

/// Returns a canned completion and records the prompts it was given
pub struct FakeProvider {
    pub reply: std::result::Result<String, u16>,
    pub calls: AtomicUsize,
    pub user_prompts: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            user_prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            calls: AtomicUsize::new(0),
            user_prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AnswerProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.user_prompts.lock().unwrap().push(user_prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(KbRagError::Provider {
                provider: "fake".to_string(),
                status: *status,
                body: "upstream exploded".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub records: Mutex<Vec<SearchQueryLog>>,
    pub fail: bool,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Wait for the detached log writes to land
    pub async fn wait_for(&self, count: usize) -> Vec<SearchQueryLog> {
        for _ in 0..100 {
            {
                let records = self.records.lock().unwrap();
                if records.len() >= count {
                    return records.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchLogSink for MemorySink {
    async fn write(&self, record: &SearchQueryLog) -> Result<()> {
        if self.fail {
            return Err(KbRagError::HttpError("search_queries insert failed".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

pub struct Harness {
    pub embedder: Arc<FakeEmbedder>,
    pub store: Arc<FakeStore>,
    pub provider: Arc<FakeProvider>,
    pub sink: Arc<MemorySink>,
    pub service: KnowledgeService,
}

/// Search-only service: no answer provider configured
pub fn without_provider(corpus: Vec<SearchResult>) -> KnowledgeService {
    kbrag::logging::init_simple_logging().unwrap();
    KnowledgeService::from_collaborators(
        Collaborators {
            embedder: Arc::new(FakeEmbedder::default()),
            store: Arc::new(FakeStore::with(corpus)),
            provider: None,
            log_sink: Arc::new(MemorySink::default()),
            url_resolver: Arc::new(DriveUrlResolver),
        },
        &AppConfig::default(),
    )
}

impl Harness {
    pub fn new(corpus: Vec<SearchResult>, provider: FakeProvider) -> Self {
        Self::build(FakeEmbedder::default(), corpus, provider, MemorySink::default())
    }

    pub fn build(
        embedder: FakeEmbedder,
        corpus: Vec<SearchResult>,
        provider: FakeProvider,
        sink: MemorySink,
    ) -> Self {
        kbrag::logging::init_simple_logging().unwrap();
        let embedder = Arc::new(embedder);
        let store = Arc::new(FakeStore::with(corpus));
        let provider = Arc::new(provider);
        let sink = Arc::new(sink);
        let service = KnowledgeService::from_collaborators(
            Collaborators {
                embedder: embedder.clone(),
                store: store.clone(),
                provider: Some(provider.clone() as Arc<dyn AnswerProvider>),
                log_sink: sink.clone(),
                url_resolver: Arc::new(DriveUrlResolver),
            },
            &AppConfig::default(),
        );
        Self {
            embedder,
            store,
            provider,
            sink,
            service,
        }
    }

    pub fn provider_calls(&self) -> usize {
        self.provider.calls.load(Ordering::SeqCst)
    }
}
