//! Error types for the decoy remote
//!
//! Error messages are shown to the user as-is, so they say what went wrong
//! and, where possible, what to run to fix it.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the decoy remote
#[derive(Error, Debug)]
pub enum Error {
    // === Daemon Errors ===
    #[error("Daemon unreachable after {attempts} attempt(s): {cause}. Run setup-daemon.sh to fix")]
    DaemonUnreachable {
        attempts: u32,
        #[source]
        cause: TransportError,
    },

    #[error("Daemon reported failure: {0}")]
    DaemonError(String),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("Operation cancelled")]
    Cancelled,

    /// A command failure already rendered for the user
    #[error("{0}")]
    Command(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a daemon error, falling back to a generic message when the
    /// daemon did not say why it failed
    pub fn daemon_error(message: Option<String>) -> Self {
        Self::DaemonError(message.unwrap_or_else(|| "Unknown error".to_string()))
    }

    /// Whether the daemon could not be reached at all
    pub fn is_offline(&self) -> bool {
        matches!(self, Error::DaemonUnreachable { .. } | Error::Transport(_))
    }
}

/// Failure to complete one request/response round trip with the daemon.
///
/// All variants mean "daemon offline" for display purposes; they are kept
/// apart for diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("request to {url} timed out after {}ms", .after.as_millis())]
    Timeout { url: String, after: Duration },

    #[error("malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("request to {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },
}

impl TransportError {
    /// Short machine-readable name of the failure kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Connect { .. } => "connect",
            TransportError::Timeout { .. } => "timeout",
            TransportError::MalformedResponse { .. } => "malformed",
            TransportError::Status { .. } => "status",
        }
    }
}
