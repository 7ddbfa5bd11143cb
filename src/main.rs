mod cli;
mod ingest;

use clap::Parser;
use cli::{Cli, Commands};
use logledger::config::Config;
use tracing_subscriber::EnvFilter;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest(args) => ingest::run(args).await?,
        Commands::CheckConfig(args) => {
            let config = load_config(args.config)?;
            let rendered = if args.json {
                serde_json::to_string_pretty(&config)?
            } else {
                toml::to_string_pretty(&config)?
            };
            println!("{rendered}");
        }
    }

    Ok(())
}

fn load_config(path: Option<std::path::PathBuf>) -> Result<Config, AnyError> {
    let config = match path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    Ok(config)
}
