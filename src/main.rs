//! CLI entry point for ouralink.

mod cli;

use clap::Parser;
use ouralink::auth::{OauthClient, TokenGuard};
use ouralink::client::OuraClient;
use ouralink::cron::CommandScheduler;
use ouralink::refresh::run_refresh_sweep;
use ouralink::store::{ConfigStore, TokenPolicy};
use ouralink::wizard;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let store = match args.config {
        Some(path) => ConfigStore::new(path),
        None => match ConfigStore::at_default_path() {
            Some(store) => store,
            None => {
                eprintln!("error: unable to resolve the platform config directory");
                std::process::exit(1);
            }
        },
    };
    let store = Arc::new(store);
    let guard = TokenGuard::new(store.clone(), OauthClient::new(), TokenPolicy::default());

    let result = match args.command {
        cli::Command::Setup { no_browser } => {
            let scheduler = CommandScheduler::new(args.host_cmd);
            wizard::run_setup(&store, &OauthClient::new(), &scheduler, !no_browser).await
        }
        cli::Command::Status => {
            wizard::run_status(&store).await;
            Ok(())
        }
        cli::Command::Test => wizard::run_test(&guard, &OuraClient::new()).await,
        cli::Command::Refresh => {
            run_refresh_sweep(&guard).await;
            Ok(())
        }
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
