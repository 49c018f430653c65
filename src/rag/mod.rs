//! Knowledge-base retrieval and grounded answer synthesis
//!
//! Query flow:
//! - embed the query ([`crate::embeddings::QueryEmbedder`])
//! - similarity search over indexed chunks ([`ChunkRetriever`])
//! - build a grounding prompt ([`PromptBuilder`])
//! - ask the configured text-generation backend ([`crate::llm::AnswerProvider`])
//! - validate its output ([`ResponseParser`])
//! - map claimed sources back onto the retrieval set ([`CitationResolver`])
//! - record telemetry without blocking the caller ([`SearchLogger`])
//!
//! # Examples
//!
//! ```rust,no_run
//! use kbrag::config::AppConfig;
//! use kbrag::rag::KnowledgeService;
//! use kbrag::rag::QueryOptions;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = KnowledgeService::new(&config).await?;
//!
//!     let outcome = service.answer("What is the refund policy?", QueryOptions::default()).await?;
//!     println!("Answer ({}): {}", outcome.confidence, outcome.answer);
//!     println!("Citations: {}", outcome.citations.len());
//!
//!     Ok(())
//! }
//! ```

pub mod citations;
pub mod logger;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod retriever;

pub use citations::CitationResolver;
pub use citations::DriveUrlResolver;
pub use citations::SourceUrlResolver;
pub use logger::SearchLogSink;
pub use logger::SearchLogger;
pub use parser::ResponseParser;
pub use pipeline::AnswerOutcome;
pub use pipeline::Collaborators;
pub use pipeline::KnowledgeService;
pub use pipeline::QueryOptions;
pub use pipeline::SearchOutcome;
pub use prompts::PromptBuilder;
pub use retriever::ChunkRetriever;
pub use retriever::RetrievalProfile;
pub use retriever::VectorStore;
