//! CLI command definitions
//!
//! Defines the clap commands for the decoy remote.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the decoy service, retrying while the daemon boots
    Start {
        /// Keep following status updates after the service has started
        #[arg(long, short)]
        follow: bool,
    },

    /// Stop the decoy service
    Stop,

    /// Show current service status
    Status {
        /// Print the raw status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Follow status updates until interrupted
    Watch {
        /// Poll interval in milliseconds (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Print each update as a JSON line
        #[arg(long)]
        json: bool,
    },

    /// Serve JSON-line requests on stdin and write replies and status
    /// updates to stdout
    Bridge {
        /// Poll interval in milliseconds (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Check that the daemon is up and healthy
    Health,

    /// Have the daemon run a session periodically
    Schedule {
        /// Minutes between sessions
        #[arg(long, default_value = "180")]
        interval: u32,

        /// Length of each session in minutes
        #[arg(long, default_value = "15")]
        duration: u32,
    },

    /// Show the daemon's active settings
    #[command(name = "daemon-config")]
    DaemonConfig,
}

impl Commands {
    /// Commands that keep running and log to a file
    pub fn is_long_running(&self) -> bool {
        matches!(
            self,
            Commands::Watch { .. } | Commands::Bridge { .. } | Commands::Start { follow: true }
        )
    }
}
