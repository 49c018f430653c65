use async_trait::async_trait;
use pgvector::Vector;

use super::Database;
use crate::models::SearchQueryLog;
use crate::rag::SearchLogSink;
use crate::Result;

impl Database {
    /// Append a query telemetry row
    pub async fn insert_search_log(&self, record: &SearchQueryLog) -> Result<()> {
        let embedding =
            (!record.query_embedding.is_empty()).then(|| Vector::from(record.query_embedding.clone()));

        sqlx::query(
            r"
            INSERT INTO search_queries (
                query, query_embedding, result_count, top_chunk_ids,
                search_duration_ms, context_type, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&record.query)
        .bind(embedding)
        .bind(record.result_count)
        .bind(&record.top_chunk_ids)
        .bind(record.search_duration_ms)
        .bind(&record.context_type)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SearchLogSink for Database {
    async fn write(&self, record: &SearchQueryLog) -> Result<()> {
        self.insert_search_log(record).await
    }
}
