//! API request and response types

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::Citation;
use crate::models::Confidence;
use crate::models::SearchResult;
use crate::models::TruthPriority;
use crate::rag::AnswerOutcome;
use crate::rag::QueryOptions;
use crate::rag::SearchOutcome;

/// Body of `POST /api/search` and `POST /api/answer`
///
/// A missing `query` deserializes to an empty string so it is rejected by
/// query validation with a descriptive message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub truth_priority_filter: Option<String>,
    #[serde(default)]
    pub context_type: Option<String>,
}

pub type SearchRequest = QueryRequest;
pub type AnswerRequest = QueryRequest;

impl QueryRequest {
    /// Pipeline options; an unknown priority name is a client error
    pub fn options(&self) -> Result<QueryOptions> {
        let truth_priority = self
            .truth_priority_filter
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::parse::<TruthPriority>)
            .transpose()?;

        Ok(QueryOptions {
            limit: self.limit,
            threshold: self.threshold,
            truth_priority,
            context_type: self.context_type.clone(),
        })
    }
}

/// Caller-facing shape of one retrieved chunk
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    pub chunk_index: i32,
    pub section_title: Option<String>,
    pub similarity: f32,
    pub truth_priority: TruthPriority,
    pub file_name: String,
    pub file_path: Option<String>,
    pub source_url: Option<String>,
    pub summary: Option<String>,
}

impl SearchResultResponse {
    pub fn new(result: SearchResult, source_url: Option<String>) -> Self {
        let SearchResult {
            chunk,
            document,
            similarity,
        } = result;
        Self {
            id: chunk.id,
            document_id: chunk.document_id,
            content: chunk.content,
            chunk_index: chunk.chunk_index,
            section_title: chunk.section_title,
            similarity,
            truth_priority: chunk.truth_priority,
            file_name: document.file_name,
            file_path: document.file_path,
            source_url,
            summary: document.summary,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<SearchResultResponse>,
    pub total_results: usize,
    pub search_duration_ms: u64,
}

impl SearchResponse {
    pub fn new(outcome: SearchOutcome, results: Vec<SearchResultResponse>) -> Self {
        Self {
            success: true,
            query: outcome.query,
            total_results: results.len(),
            results,
            search_duration_ms: outcome.search_duration_ms,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub success: bool,
    pub query: String,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub confidence: Confidence,
    pub chunks_used: usize,
    pub total_chunks_searched: usize,
    pub key_points: Vec<String>,
    pub gaps: Vec<String>,
    pub search_duration_ms: u64,
    pub answer_duration_ms: u64,
}

impl From<AnswerOutcome> for AnswerResponse {
    fn from(outcome: AnswerOutcome) -> Self {
        Self {
            success: true,
            query: outcome.query,
            answer: outcome.answer,
            citations: outcome.citations,
            confidence: outcome.confidence,
            chunks_used: outcome.chunks_used,
            total_chunks_searched: outcome.total_chunks_searched,
            key_points: outcome.key_points,
            gaps: outcome.gaps,
            search_duration_ms: outcome.search_duration_ms,
            answer_duration_ms: outcome.answer_duration_ms,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
