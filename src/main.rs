//! Decoy Remote - command-line remote control for the decoy service daemon
//!
//! Talks to the local daemon's HTTP API to start and stop the service,
//! and can follow its status or bridge it to another process.

use std::path::PathBuf;

use clap::Parser;
use decoy_remote::common::{config::Config, logging, Result};
use decoy_remote::{cli, commands};
use commands::Commands;

#[derive(Parser)]
#[command(name = "decoy-remote", about = "Remote control for the decoy service daemon")]
#[command(version, long_about = None)]
struct Cli {
    /// Daemon host (overrides config file)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Daemon port (overrides config file)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(host) = &self.host {
            config.daemon.host = host.clone();
        }
        if let Some(port) = self.port {
            config.daemon.port = port;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.command.is_long_running() {
        if let Some(path) = logging::init_relay() {
            tracing::debug!(path = %path.display(), "Logging to file");
        }
    } else {
        logging::init_cli();
    }

    let result = match cli.load_config() {
        Ok(config) => cli::dispatch(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
