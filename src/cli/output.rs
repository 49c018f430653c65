//! CLI output formatting utilities

use crate::api::types::AnswerResponse;
use crate::api::types::SearchResponse;
use crate::rag::citations::truncate_str;
use crate::AppConfig;

const PREVIEW_CHARS: usize = 160;

/// Print search results as a ranked list
pub fn print_search_results(response: &SearchResponse) {
    println!(
        "🔍 {} results for {:?} ({}ms)",
        response.total_results, response.query, response.search_duration_ms
    );
    if response.results.is_empty() {
        println!("  No chunks matched.");
        return;
    }

    for (idx, result) in response.results.iter().enumerate() {
        println!();
        let section = result
            .section_title
            .as_deref()
            .map(|s| format!(" > {s}"))
            .unwrap_or_default();
        println!(
            "{}. {}{} [{}] ({:.1}%)",
            idx + 1,
            result.file_name,
            section,
            result.truth_priority,
            result.similarity * 100.0
        );
        println!("   {}", truncate_str(&one_line(&result.content), PREVIEW_CHARS));
        if let Some(url) = &result.source_url {
            println!("   {url}");
        }
    }
}

/// Print a synthesized answer with its citations
pub fn print_answer(response: &AnswerResponse) {
    println!("💬 {}", response.answer);
    println!();
    println!(
        "Confidence: {} | chunks used {}/{} | search {}ms, answer {}ms",
        response.confidence,
        response.chunks_used,
        response.total_chunks_searched,
        response.search_duration_ms,
        response.answer_duration_ms
    );

    if !response.key_points.is_empty() {
        println!();
        println!("Key points:");
        for point in &response.key_points {
            println!("  - {point}");
        }
    }

    if !response.gaps.is_empty() {
        println!();
        println!("Gaps:");
        for gap in &response.gaps {
            println!("  - {gap}");
        }
    }

    if !response.citations.is_empty() {
        println!();
        println!("Sources:");
        for citation in &response.citations {
            let section = citation
                .section_title
                .as_deref()
                .map(|s| format!(" > {s}"))
                .unwrap_or_default();
            println!(
                "  [{}] {}{} ({:.1}%)",
                citation.source_index,
                citation.file_name,
                section,
                citation.similarity * 100.0
            );
            if let Some(url) = &citation.source_url {
                println!("      {url}");
            }
        }
    }
}

/// Print configuration with secrets masked
pub fn print_config(config: &AppConfig) {
    let config = config.redacted();
    println!("📋 kbrag Configuration:");
    println!();

    println!("🗄️  Database:");
    println!("  URL: {}", config.database_url());
    println!("  Max connections: {}", config.max_connections());
    println!("  Min connections: {}", config.min_connections());
    println!("  Connection timeout: {}s", config.connection_timeout());
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
    println!();

    println!("🧠 Embeddings:");
    println!("  Provider: {:?}", config.embeddings.provider);
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!("  Model: {}", config.embedding_model());
    println!("  Dimension: {}", config.embedding_dimension());
    println!("  Cache capacity: {}", config.embeddings.cache_capacity);
    if let Some(key) = &config.embeddings.api_key {
        println!("  API key: {key}");
    }
    println!();

    println!("🤖 LLM:");
    println!("  Provider: {:?}", config.llm.provider);
    println!("  Endpoint: {}", config.llm.endpoint);
    println!("  Model: {}", config.llm_model());
    println!("  Temperature: {}", config.llm.temperature);
    println!("  Max tokens: {}", config.llm.max_tokens);
    println!("  API key: {}", config.llm.api_key);
    println!();

    println!("🎯 Retrieval:");
    println!(
        "  Search: limit {}, threshold {}",
        config.retrieval.search_default_limit, config.retrieval.search_default_threshold
    );
    println!(
        "  Answer: limit {}, threshold {}",
        config.retrieval.answer_default_limit, config.retrieval.answer_default_threshold
    );
    println!();

    println!("⏱️  Timeouts:");
    println!("  Embedding: {}s", config.timeouts.embedding_secs);
    println!("  Retrieval: {}s", config.timeouts.retrieval_secs);
    println!("  Provider: {}s", config.timeouts.provider_secs);
    println!("  Search log: {}s", config.timeouts.search_log_secs);
    println!();

    println!("🌐 Server:");
    println!("  Address: {}:{}", config.server.host, config.server.port);
    println!("  CORS: {}", config.server.enable_cors);
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_collapses_whitespace() {
        assert_eq!(one_line("  a\n\nb\t c "), "a b c");
    }
}
