//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Oura Ring integration for an agent host: credentials, data tool, and
/// scheduled health summaries.
#[derive(Debug, Parser)]
#[command(name = "ouralink", version)]
pub struct Args {
    /// Path to the config record (default: ~/.config/ouralink/config.json).
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Host CLI used to register and remove scheduled jobs.
    #[arg(long = "host-cmd", default_value = "openclaw")]
    pub host_cmd: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect an Oura application and configure scheduled summaries.
    Setup {
        /// Print the authorize URL instead of opening a browser.
        #[arg(long = "no-browser")]
        no_browser: bool,
    },
    /// Show current connection and schedule state.
    Status,
    /// Fetch today's data to verify the connection.
    Test,
    /// Run one proactive refresh sweep and exit.
    Refresh,
}
