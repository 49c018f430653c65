use async_trait::async_trait;
use pgvector::Vector;
use uuid::Uuid;

use super::Database;
use crate::models::Chunk;
use crate::models::DocumentRef;
use crate::models::SearchResult;
use crate::models::TruthPriority;
use crate::rag::VectorStore;
use crate::Result;

#[derive(sqlx::FromRow)]
struct RawChunkMatch {
    id: Uuid,
    document_id: Uuid,
    content: String,
    chunk_index: i32,
    section_title: Option<String>,
    truth_priority: String,
    token_count: i32,
    file_name: String,
    file_path: Option<String>,
    drive_file_id: Option<String>,
    source_url: Option<String>,
    summary: Option<String>,
    similarity: f64, // PostgreSQL returns FLOAT8 (f64) from distance operator
}

impl From<RawChunkMatch> for SearchResult {
    fn from(raw: RawChunkMatch) -> Self {
        let truth_priority = raw.truth_priority.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "Chunk {} has unknown truth priority '{}', treating as standard",
                raw.id,
                raw.truth_priority
            );
            TruthPriority::Standard
        });

        Self {
            chunk: Chunk {
                id: raw.id,
                document_id: raw.document_id,
                content: raw.content,
                chunk_index: raw.chunk_index,
                section_title: raw.section_title,
                truth_priority,
                token_count: raw.token_count,
            },
            document: DocumentRef {
                file_name: raw.file_name,
                file_path: raw.file_path,
                drive_file_id: raw.drive_file_id,
                source_url: raw.source_url,
                summary: raw.summary,
            },
            similarity: raw.similarity as f32,
        }
    }
}

impl Database {
    /// Cosine-similarity search over document chunks.
    ///
    /// `similarity = 1 - cosine_distance`; rows below `threshold` are excluded
    /// and `priority_filter` restricts candidates before ranking.
    pub async fn semantic_search_chunks(
        &self,
        query_embedding: Vec<f32>,
        limit: i64,
        threshold: f32,
        priority_filter: Option<TruthPriority>,
    ) -> Result<Vec<SearchResult>> {
        let rows = sqlx::query_as::<_, RawChunkMatch>(
            r"
            SELECT
                c.id,
                c.document_id,
                c.content,
                c.chunk_index,
                c.section_title,
                c.truth_priority,
                c.token_count,
                d.file_name,
                d.file_path,
                d.drive_file_id,
                d.source_url,
                d.summary,
                1 - (c.embedding <=> $1) AS similarity
            FROM document_chunks c
            INNER JOIN documents d ON d.id = c.document_id
            WHERE 1 - (c.embedding <=> $1) >= $2
              AND ($3::text IS NULL OR c.truth_priority = $3)
            ORDER BY c.embedding <=> $1
            LIMIT $4
            ",
        )
        .bind(Vector::from(query_embedding))
        .bind(f64::from(threshold))
        .bind(priority_filter.map(TruthPriority::as_str))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SearchResult::from).collect())
    }
}

#[async_trait]
impl VectorStore for Database {
    async fn search(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
        priority_filter: Option<TruthPriority>,
    ) -> Result<Vec<SearchResult>> {
        self.semantic_search_chunks(
            embedding.to_vec(),
            i64::try_from(limit).unwrap_or(i64::MAX),
            threshold,
            priority_filter,
        )
        .await
    }
}
