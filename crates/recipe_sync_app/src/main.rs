mod config;
mod daemon;
mod logging;
mod persistence;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use recipe_sync_engine::{
    DirectoryContentStore, NoticeKind, ReqwestHttpClient, SyncService, SyncSettings,
};
use sync_logging::sync_info;

use config::{AppConfig, ConfigOrigin, DEFAULT_CONFIG_PATH};
use persistence::StateFile;

#[derive(Parser)]
#[command(name = "recipe-sync")]
#[command(about = "Sync recipes from an upstream API into a local content store", long_about = None)]
struct Cli {
    /// Path to the RON config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch now, then every interval until Ctrl-C
    Run,
    /// Run a single pass and print the result
    FetchNow,
    /// Show the last fetch time and the next scheduled run
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, origin) = AppConfig::load(&cli.config)?;
    logging::initialize(config.log_destination);
    match &origin {
        ConfigOrigin::File(path) => sync_info!("Loaded config from {:?}", path),
        ConfigOrigin::Defaults(path) => {
            sync_info!("No config at {:?}; using defaults", path)
        }
    }

    let state = Arc::new(
        StateFile::open(&config.data_dir)
            .with_context(|| format!("opening state in {}", config.data_dir.display()))?,
    );
    let service = build_service(&config, state.clone())?;

    match cli.command {
        Commands::Run => daemon::run(&service, &state, config.interval()).await?,
        Commands::FetchNow => {
            let notice = service.run_manual().await;
            match notice.kind {
                NoticeKind::Success => println!("{}", notice.message),
                NoticeKind::Error => anyhow::bail!(notice.message),
            }
        }
        Commands::Status => {
            let status = service.status(state.as_ref());
            println!("Last fetch: {}", status.last_fetch);
            println!("Next scheduled run: {}", status.next_run);
        }
    }

    Ok(())
}

fn build_service(config: &AppConfig, state: Arc<StateFile>) -> Result<SyncService> {
    let store = Arc::new(
        DirectoryContentStore::open(&config.data_dir)
            .with_context(|| format!("opening content store in {}", config.data_dir.display()))?,
    );
    let http = Arc::new(
        ReqwestHttpClient::new(config.fetch_settings()).context("building http client")?,
    );
    let settings = SyncSettings {
        endpoint_url: config.endpoint_url.clone(),
        clock: Arc::new(|| Utc::now().to_rfc3339()),
    };
    Ok(SyncService::new(settings, store, http, state))
}
