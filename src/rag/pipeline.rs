//! Search and answer pipelines: embed -> retrieve -> (prompt -> generate -> parse -> cite) -> log

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::create_query_embedder;
use crate::embeddings::QueryEmbedder;
use crate::errors::KbRagError;
use crate::errors::Result;
use crate::llm::create_optional_provider;
use crate::llm::AnswerProvider;
use crate::models::Citation;
use crate::models::Confidence;
use crate::models::DocumentRef;
use crate::models::SearchQueryLog;
use crate::models::SearchResult;
use crate::models::TruthPriority;
use crate::rag::CitationResolver;
use crate::rag::ChunkRetriever;
use crate::rag::DriveUrlResolver;
use crate::rag::PromptBuilder;
use crate::rag::ResponseParser;
use crate::rag::RetrievalProfile;
use crate::rag::SearchLogSink;
use crate::rag::SearchLogger;
use crate::rag::SourceUrlResolver;
use crate::rag::VectorStore;

/// Shortest accepted query, counted in characters after trimming
pub const MIN_QUERY_CHARS: usize = 3;

/// Answer returned when retrieval finds nothing
pub const NO_INFORMATION_ANSWER: &str = "I couldn't find any relevant information in the knowledge base to answer this question.";

/// Gap reported alongside [`NO_INFORMATION_ANSWER`]
pub const NO_MATCHES_GAP: &str = "No matching documents found in knowledge base";

const ANSWER_CONTEXT: &str = "answer";

/// Trim `query` and reject it when shorter than [`MIN_QUERY_CHARS`]
pub fn validate_query(query: &str) -> Result<String> {
    let trimmed = query.trim();
    if trimmed.chars().count() < MIN_QUERY_CHARS {
        return Err(KbRagError::InvalidRequest(format!(
            "Query must be at least {MIN_QUERY_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Optional per-call knobs; `None` means the configured default
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub limit: Option<i64>,
    pub threshold: Option<f32>,
    pub truth_priority: Option<TruthPriority>,
    pub context_type: Option<String>,
}

/// External services the pipeline depends on
#[derive(Clone)]
pub struct Collaborators {
    pub embedder: Arc<dyn QueryEmbedder>,
    pub store: Arc<dyn VectorStore>,
    /// `None` serves search only; answers that need generation fail
    pub provider: Option<Arc<dyn AnswerProvider>>,
    pub log_sink: Arc<dyn SearchLogSink>,
    pub url_resolver: Arc<dyn SourceUrlResolver>,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub search_duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub query: String,
    pub answer: String,
    pub confidence: Confidence,
    pub citations: Vec<Citation>,
    pub key_points: Vec<String>,
    pub gaps: Vec<String>,
    pub chunks_used: usize,
    pub total_chunks_searched: usize,
    pub search_duration_ms: u64,
    pub answer_duration_ms: u64,
}

impl AnswerOutcome {
    fn no_matches(query: String, search_duration_ms: u64, answer_duration_ms: u64) -> Self {
        Self {
            query,
            answer: NO_INFORMATION_ANSWER.to_string(),
            confidence: Confidence::Low,
            citations: Vec::new(),
            key_points: Vec::new(),
            gaps: vec![NO_MATCHES_GAP.to_string()],
            chunks_used: 0,
            total_chunks_searched: 0,
            search_duration_ms,
            answer_duration_ms,
        }
    }
}

/// Request-scoped retrieval and grounded answer synthesis.
///
/// Holds no per-request state; one instance serves concurrent callers.
pub struct KnowledgeService {
    embedder: Arc<dyn QueryEmbedder>,
    retriever: ChunkRetriever,
    provider: Option<Arc<dyn AnswerProvider>>,
    prompts: PromptBuilder,
    parser: ResponseParser,
    citations: CitationResolver,
    logger: SearchLogger,
    search_profile: RetrievalProfile,
    answer_profile: RetrievalProfile,
}

impl KnowledgeService {
    /// Connect to Postgres and build the configured embedding and answer backends
    ///
    /// # Errors
    /// - Database connection errors
    /// - Backend configuration errors (unknown provider, missing embedding key)
    ///
    /// Without `llm.api_key` the service still searches; see [`create_optional_provider`].
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let database = Arc::new(Database::from_config(config).await?);
        database.verify_schema_or_error().await?;

        let collaborators = Collaborators {
            embedder: create_query_embedder(config)?,
            store: database.clone(),
            provider: create_optional_provider(config)?,
            log_sink: database,
            url_resolver: Arc::new(DriveUrlResolver),
        };
        Ok(Self::from_collaborators(collaborators, config))
    }

    /// Assemble from already-constructed collaborators
    #[must_use]
    pub fn from_collaborators(collaborators: Collaborators, config: &AppConfig) -> Self {
        let timeouts = &config.timeouts;
        Self {
            embedder: collaborators.embedder,
            retriever: ChunkRetriever::new(
                collaborators.store,
                Duration::from_secs(timeouts.retrieval_secs),
            ),
            provider: collaborators.provider,
            prompts: PromptBuilder::new(),
            parser: ResponseParser::new(),
            citations: CitationResolver::new(collaborators.url_resolver),
            logger: SearchLogger::new(
                collaborators.log_sink,
                Duration::from_secs(timeouts.search_log_secs),
            ),
            search_profile: RetrievalProfile::search(&config.retrieval),
            answer_profile: RetrievalProfile::answer(&config.retrieval),
        }
    }

    /// Ranked chunks for `query`
    ///
    /// # Errors
    /// - `InvalidRequest` for a query shorter than [`MIN_QUERY_CHARS`]
    /// - Embedding or vector store failures
    pub async fn search(&self, query: &str, options: QueryOptions) -> Result<SearchOutcome> {
        let query = validate_query(query)?;
        let limit = self.search_profile.limit(options.limit);
        let threshold = self.search_profile.threshold(options.threshold);
        info!("Search: {:?} (limit {}, threshold {:.2})", query, limit, threshold);

        let started = Instant::now();
        let (embedding, results) = self
            .embed_and_retrieve(&query, limit, threshold, options.truth_priority)
            .await?;
        let search_duration_ms = elapsed_ms(started);

        self.logger.log(SearchQueryLog::from_results(
            &query,
            embedding,
            &results,
            search_duration_ms,
            options.context_type,
        ));

        Ok(SearchOutcome {
            query,
            results,
            search_duration_ms,
        })
    }

    /// Grounded answer for `query` with citations into the retrieved chunks
    ///
    /// The provider is not called when retrieval finds nothing.
    ///
    /// # Errors
    /// - `InvalidRequest` for a query shorter than [`MIN_QUERY_CHARS`]
    /// - Embedding or vector store failures
    /// - Provider transport or HTTP status failures
    /// - `ConfigError` when chunks matched but no provider is configured
    pub async fn answer(&self, query: &str, options: QueryOptions) -> Result<AnswerOutcome> {
        let query = validate_query(query)?;
        let limit = self.answer_profile.limit(options.limit);
        let threshold = self.answer_profile.threshold(options.threshold);
        info!("Answer: {:?} (limit {}, threshold {:.2})", query, limit, threshold);

        let started = Instant::now();
        let (embedding, results) = self
            .embed_and_retrieve(&query, limit, threshold, options.truth_priority)
            .await?;
        let search_duration_ms = elapsed_ms(started);

        self.logger.log(SearchQueryLog::from_results(
            &query,
            embedding,
            &results,
            search_duration_ms,
            Some(
                options
                    .context_type
                    .unwrap_or_else(|| ANSWER_CONTEXT.to_string()),
            ),
        ));

        let answer_started = Instant::now();
        if results.is_empty() {
            debug!("No chunks matched; skipping answer provider");
            return Ok(AnswerOutcome::no_matches(
                query,
                search_duration_ms,
                elapsed_ms(answer_started),
            ));
        }

        let provider = self.provider.as_ref().ok_or_else(|| {
            KbRagError::ConfigError(
                "Answer synthesis is unavailable: llm.api_key is not configured".to_string(),
            )
        })?;

        let user_prompt = self.prompts.user_prompt(&query, &results);
        debug!(
            "Calling {} with {} chunks ({} prompt chars)",
            provider.name(),
            results.len(),
            user_prompt.len()
        );
        let raw = provider
            .complete(self.prompts.system_prompt(), &user_prompt)
            .await?;

        let parsed = self.parser.parse(&raw);
        let citations = self.citations.resolve(&results, &parsed.sources_used);
        let answer_duration_ms = elapsed_ms(answer_started);

        info!(
            "Answered with {} confidence, {} citations of {} chunks",
            parsed.confidence,
            citations.len(),
            results.len()
        );

        Ok(AnswerOutcome {
            query,
            answer: parsed.answer,
            confidence: parsed.confidence,
            chunks_used: citations.len(),
            total_chunks_searched: results.len(),
            citations,
            key_points: parsed.key_points,
            gaps: parsed.gaps,
            search_duration_ms,
            answer_duration_ms,
        })
    }

    /// Link shown to callers for a retrieved document
    #[must_use]
    pub fn source_url(&self, document: &DocumentRef) -> Option<String> {
        self.citations.source_url(document)
    }

    async fn embed_and_retrieve(
        &self,
        query: &str,
        limit: usize,
        threshold: f32,
        priority_filter: Option<TruthPriority>,
    ) -> Result<(Vec<f32>, Vec<SearchResult>)> {
        let embedding = self.embedder.embed(query).await?;
        let results = self
            .retriever
            .retrieve(&embedding, limit, threshold, priority_filter)
            .await?;
        Ok((embedding, results))
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
