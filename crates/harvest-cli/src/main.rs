mod consent;
mod credentials;
mod logging;
mod scrape;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::credentials::CredentialCommands;

#[derive(Debug, Parser)]
#[command(name = "harvest")]
#[command(about = "Incremental profile and post harvester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every target in the input file that is not stored yet
    Run(RunArgs),
    /// Show what the result store currently holds
    Status,
    /// Manage stored session credentials
    Credentials {
        #[command(subcommand)]
        command: CredentialCommands,
    },
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// Target file to read instead of `HARVEST_INPUT_PATH`
    #[arg(long)]
    input: Option<PathBuf>,

    /// Rotate through every stored credential set while scraping
    #[arg(long)]
    rotate: bool,

    /// Import browser cookies without asking when no credentials are stored
    #[arg(long, conflicts_with = "no_import")]
    yes: bool,

    /// Never import browser cookies
    #[arg(long)]
    no_import: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = harvest_core::load_app_config()?;
    let _log_guard = logging::init_tracing(&config)?;

    match cli.command {
        Commands::Run(args) => scrape::run_scrape(&config, &args).await?,
        Commands::Status => scrape::show_status(&config),
        Commands::Credentials { command } => {
            credentials::run_credentials_command(&config, command).await?;
        }
    }

    Ok(())
}
