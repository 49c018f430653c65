//! Core data types shared by retrieval, synthesis and the API layer

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::KbRagError;

/// Corpus tier indicating how trusted a source is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruthPriority {
    #[default]
    Standard,
    High,
    Authoritative,
}

impl TruthPriority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::High => "high",
            Self::Authoritative => "authoritative",
        }
    }
}

impl fmt::Display for TruthPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TruthPriority {
    type Err = KbRagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "high" => Ok(Self::High),
            "authoritative" => Ok(Self::Authoritative),
            other => Err(KbRagError::InvalidRequest(format!(
                "Unknown truth priority '{other}' (expected standard, high or authoritative)"
            ))),
        }
    }
}

/// A stored unit of document text.
///
/// The embedding lives only in the store; retrieval never ships it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    pub chunk_index: i32,
    pub section_title: Option<String>,
    pub truth_priority: TruthPriority,
    pub token_count: i32,
}

/// Denormalized fields of the document a chunk belongs to
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentRef {
    pub file_name: String,
    pub file_path: Option<String>,
    pub drive_file_id: Option<String>,
    pub source_url: Option<String>,
    pub summary: Option<String>,
}

/// A chunk matched by a similarity search.
///
/// Computed per query and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub document: DocumentRef,
    /// Cosine similarity in [0, 1]
    pub similarity: f32,
}

/// How well the retrieved context supports a synthesized answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

impl Confidence {
    /// Lenient parse used when coercing provider output
    #[must_use]
    pub fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated answer extracted from provider output.
///
/// `sources_used` holds positional indices into the result list the prompt
/// was built from, not chunk ids.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub confidence: Confidence,
    pub key_points: Vec<String>,
    pub gaps: Vec<String>,
    pub sources_used: Vec<usize>,
}

/// Caller-facing pointer from an answer back to a retrieved chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Position of the originating result in the retrieval set
    pub source_index: usize,
    pub file_name: String,
    pub section_title: Option<String>,
    pub source_url: Option<String>,
    pub excerpt: String,
    pub similarity: f32,
    pub truth_priority: TruthPriority,
}

/// Append-only telemetry row written after each query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQueryLog {
    pub query: String,
    pub query_embedding: Vec<f32>,
    pub result_count: i32,
    /// At most five ids, best match first
    pub top_chunk_ids: Vec<Uuid>,
    pub search_duration_ms: i64,
    pub context_type: Option<String>,
    /// When the query ran; the detached write may land later
    pub created_at: DateTime<Utc>,
}

/// Maximum number of chunk ids kept on a query log row
pub const LOGGED_TOP_CHUNKS: usize = 5;

impl SearchQueryLog {
    /// Build a log record from a finished retrieval
    #[must_use]
    pub fn from_results(
        query: &str,
        query_embedding: Vec<f32>,
        results: &[SearchResult],
        search_duration_ms: u64,
        context_type: Option<String>,
    ) -> Self {
        Self {
            query: query.to_string(),
            query_embedding,
            result_count: i32::try_from(results.len()).unwrap_or(i32::MAX),
            top_chunk_ids: results
                .iter()
                .take(LOGGED_TOP_CHUNKS)
                .map(|r| r.chunk.id)
                .collect(),
            search_duration_ms: i64::try_from(search_duration_ms).unwrap_or(i64::MAX),
            context_type,
            created_at: Utc::now(),
        }
    }
}
