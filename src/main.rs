use clap::Parser;
use kbrag::cli::Cli;
use kbrag::cli::Commands;
use kbrag::config::AppConfig;
use kbrag::Result;
use tracing::error;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;

    if cli.verbose {
        kbrag::logging::init_logging_with_level("debug")?;
    } else {
        kbrag::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    let result = match cli.command {
        Commands::Init => kbrag::cli::handle_init(&config).await,
        Commands::Serve { host, port, cors } => {
            kbrag::cli::handle_serve(&config, host, port, cors).await
        }
        Commands::Search { query, filters } => {
            kbrag::cli::handle_search(&config, &query, &filters).await
        }
        Commands::Ask { query, filters } => kbrag::cli::handle_ask(&config, &query, &filters).await,
        Commands::Config => {
            kbrag::cli::handle_config(&config);
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("Command failed: {}", e);
    }
    result
}
