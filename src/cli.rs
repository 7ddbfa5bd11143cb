use clap::{Parser, Subcommand};
use logledger::MsgKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "logledger")]
#[command(about = "Bounded log ledger with rotating file backup", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Append every line read from stdin as a log message
    Ingest(IngestArgs),
    /// Load and validate the configuration, then print it
    CheckConfig(CheckConfigArgs),
}

#[derive(clap::Args, Debug)]
pub struct IngestArgs {
    /// Kind recorded for each line (normal, info, warning, critical)
    #[arg(long, default_value_t = MsgKind::Normal)]
    pub kind: MsgKind,

    /// Configuration file, overrides LOGLEDGER_CONFIG
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print each accepted message as it would appear in the log file
    #[arg(long)]
    pub echo: bool,
}

#[derive(clap::Args, Debug)]
pub struct CheckConfigArgs {
    /// Configuration file, overrides LOGLEDGER_CONFIG
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print as JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}
