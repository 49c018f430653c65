//! CLI command handlers

use std::sync::Arc;

use tracing::info;

use crate::api::serve_api;
use crate::api::types::AnswerResponse;
use crate::api::types::SearchResponse;
use crate::api::types::SearchResultResponse;
use crate::cli::commands::QueryArgs;
use crate::cli::output::*;
use crate::database::Database;
use crate::rag::KnowledgeService;
use crate::rag::QueryOptions;
use crate::AppConfig;
use crate::Result;

impl From<&QueryArgs> for QueryOptions {
    fn from(args: &QueryArgs) -> Self {
        Self {
            limit: args.limit,
            threshold: args.threshold,
            truth_priority: args.priority,
            context_type: Some("cli".to_string()),
        }
    }
}

/// Handle init command
pub async fn handle_init(config: &AppConfig) -> Result<()> {
    let database = Database::from_config(config).await?;
    if database.is_schema_initialized().await? {
        info!("Schema already present; ensuring indexes");
    }
    database.init_schema(config.embedding_dimension()).await?;
    println!("✅ Database schema initialized");
    Ok(())
}

/// Handle serve command
pub async fn handle_serve(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
    cors: bool,
) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    serve_api(config, host, port, cors || config.server.enable_cors).await
}

/// Handle search command
pub async fn handle_search(config: &AppConfig, query: &str, args: &QueryArgs) -> Result<()> {
    let service = Arc::new(KnowledgeService::new(config).await?);
    let mut outcome = service.search(query, QueryOptions::from(args)).await?;

    let results = std::mem::take(&mut outcome.results)
        .into_iter()
        .map(|result| {
            let url = service.source_url(&result.document);
            SearchResultResponse::new(result, url)
        })
        .collect();
    let response = SearchResponse::new(outcome, results);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_search_results(&response);
    }
    Ok(())
}

/// Handle ask command
pub async fn handle_ask(config: &AppConfig, query: &str, args: &QueryArgs) -> Result<()> {
    let service = KnowledgeService::new(config).await?;
    let outcome = service.answer(query, QueryOptions::from(args)).await?;
    let response = AnswerResponse::from(outcome);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_answer(&response);
    }
    Ok(())
}

/// Handle config command
pub fn handle_config(config: &AppConfig) {
    print_config(config);
}
