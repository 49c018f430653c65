//! CLI command definitions and argument parsing

use clap::Parser;
use clap::Subcommand;

use crate::models::TruthPriority;

#[derive(Parser)]
#[command(name = "kbrag")]
#[command(about = "Knowledge-base search and grounded answers over indexed documents")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: configured level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database schema and indexes
    Init,
    /// Start the HTTP API server
    Serve {
        /// Bind address (default: server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port (default: server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Allow cross-origin requests from any origin
        #[arg(long)]
        cors: bool,
    },
    /// Search the knowledge base and list matching chunks
    Search {
        /// Search text
        query: String,
        #[command(flatten)]
        filters: QueryArgs,
    },
    /// Ask a question and get a grounded answer with citations
    Ask {
        /// Question text
        query: String,
        #[command(flatten)]
        filters: QueryArgs,
    },
    /// Show current configuration (secrets masked)
    Config,
}

/// Retrieval knobs shared by `search` and `ask`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Maximum number of chunks
    #[arg(short, long)]
    pub limit: Option<i64>,
    /// Minimum cosine similarity in [0, 1]
    #[arg(short, long)]
    pub threshold: Option<f32>,
    /// Only consider chunks of this truth priority (standard, high, authoritative)
    #[arg(long)]
    pub priority: Option<TruthPriority>,
    /// Print the JSON response instead of formatted text
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_filters() {
        let cli = Cli::parse_from([
            "kbrag",
            "ask",
            "what is the refund policy?",
            "--limit",
            "4",
            "--priority",
            "authoritative",
            "--json",
        ]);
        match cli.command {
            Commands::Ask { query, filters } => {
                assert_eq!(query, "what is the refund policy?");
                assert_eq!(filters.limit, Some(4));
                assert_eq!(filters.priority, Some(TruthPriority::Authoritative));
                assert!(filters.json);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_rejects_unknown_priority() {
        let result = Cli::try_parse_from(["kbrag", "search", "refunds", "--priority", "gospel"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::parse_from(["kbrag", "serve", "--port", "8080", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Serve { port: Some(8080), .. }));
    }
}
