mod commands;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tcflow")]
#[command(about = "Declarative TeamCity triggers, build features and SSH keys", long_about = None)]
struct Cli {
    /// Manifest to use instead of searching for one
    #[arg(short, long, global = true, env = "TCFLOW_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Directory holding the state file and lock
    #[arg(long, global = true, env = "TCFLOW_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what apply would change
    Plan,
    /// Bring TeamCity in line with the manifest
    Apply {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Re-read every managed resource and forget the ones deleted remotely
    Refresh,
    /// Delete managed resources
    Destroy {
        /// Resource address (`<kind>.<name>`); everything when omitted
        address: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the state
    Show {
        /// Print the raw state file
        #[arg(long)]
        json: bool,
    },
    /// Print the version
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state_store = utils::state_manager(cli.state_dir)?;

    match cli.command {
        Commands::Version => {
            println!("tcflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Show { json } => commands::show::handle(&state_store, json).await,
        Commands::Plan => {
            let manifest = utils::load_manifest(cli.config).await?;
            let client = utils::connect()?;
            commands::plan::handle(&client, &manifest, &state_store).await
        }
        Commands::Apply { yes } => {
            let manifest = utils::load_manifest(cli.config).await?;
            let client = utils::connect()?;
            commands::apply::handle(&client, &manifest, &state_store, yes).await
        }
        Commands::Refresh => {
            let client = utils::connect()?;
            commands::refresh::handle(&client, &state_store).await
        }
        Commands::Destroy { address, yes } => {
            let client = utils::connect()?;
            commands::destroy::handle(&client, &state_store, address, yes).await
        }
    }
}
