use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod session;
mod storage;

use commands::{
    ConfigCommand, SettingsCommand, StatusCommand, SyncCommand, TreeCommand, WatchCommand,
};
use config::Config;
use session::Session;

#[derive(Parser)]
#[command(name = "marksync")]
#[command(version)]
#[command(about = "Sync a bookmark tree through a GitHub Gist", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync round now
    Sync(SyncCommand),

    /// Keep syncing until interrupted
    Watch(WatchCommand),

    /// Show sync status
    Status(StatusCommand),

    /// View and edit the local bookmark tree
    Tree(TreeCommand),

    /// Manage the sync token and gist id
    Settings(SettingsCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marksync=info,marksync_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_config_path);
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Config(cmd)) => cmd.run(&config, &config_path)?,
        Some(Commands::Sync(cmd)) => cmd.run(&Session::open(&config)?).await?,
        Some(Commands::Watch(cmd)) => cmd.run(&Session::open(&config)?).await?,
        Some(Commands::Status(cmd)) => cmd.run(&Session::open(&config)?, &config).await?,
        Some(Commands::Tree(cmd)) => cmd.run(&Session::open(&config)?, &config).await?,
        Some(Commands::Settings(cmd)) => cmd.run(&Session::open(&config)?, &config).await?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
