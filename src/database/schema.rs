use super::Database;
use crate::KbRagError;
use crate::Result;

const REQUIRED_TABLES: [&str; 3] = ["documents", "document_chunks", "search_queries"];

impl Database {
    /// Check if database schema is initialized
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        for table_name in REQUIRED_TABLES {
            let exists = sqlx::query_scalar::<_, bool>(
                r"
                SELECT EXISTS (
                    SELECT FROM information_schema.tables
                    WHERE table_schema = 'public'
                    AND table_name = $1
                )
                ",
            )
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

            if !exists {
                tracing::debug!("Missing required table: {}", table_name);
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Verify database schema or return helpful error
    pub async fn verify_schema_or_error(&self) -> Result<()> {
        if !self.is_schema_initialized().await? {
            return Err(KbRagError::ConfigError(
                "Database schema not initialized. Run `kbrag init` first.".to_string(),
            ));
        }
        Ok(())
    }

    /// Initialize database schema
    ///
    /// Chunks of one document are replaced as a set by the indexer, so there
    /// is no per-chunk update path here.
    pub async fn init_schema(&self, embedding_dimension: usize) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS documents (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                file_name TEXT NOT NULL,
                file_path TEXT,
                drive_file_id TEXT,
                source_url TEXT,
                summary TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // The vector dimension cannot be a bind parameter.
        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS document_chunks (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                document_id UUID NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                section_title TEXT,
                embedding vector({embedding_dimension}) NOT NULL,
                truth_priority TEXT NOT NULL DEFAULT 'standard'
                    CHECK (truth_priority IN ('standard', 'high', 'authoritative')),
                token_count INTEGER NOT NULL DEFAULT 0,
                UNIQUE (document_id, chunk_index)
            )
            "
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS search_queries (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                query TEXT NOT NULL,
                query_embedding vector({embedding_dimension}),
                result_count INTEGER NOT NULL,
                top_chunk_ids UUID[] NOT NULL DEFAULT '{{}}',
                search_duration_ms BIGINT NOT NULL,
                context_type TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "
        ))
        .execute(&self.pool)
        .await?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_document_chunks_embedding \
             ON document_chunks USING hnsw (embedding vector_cosine_ops)",
            "CREATE INDEX IF NOT EXISTS idx_document_chunks_priority \
             ON document_chunks (truth_priority)",
            "CREATE INDEX IF NOT EXISTS idx_search_queries_created_at \
             ON search_queries (created_at DESC)",
        ];
        for statement in indexes {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        tracing::info!("Schema initialized (embedding dimension {embedding_dimension})");
        Ok(())
    }
}
