//! Decoy Remote - remote control for the local decoy service daemon
//!
//! This library talks to the daemon's HTTP API and relays its status to
//! any number of listeners through a polling relay.

pub mod cli;
pub mod commands;
pub mod common;
pub mod daemon;
pub mod relay;
pub mod status;

// Re-export commonly used types for tests
pub use common::{Error, Result, TransportError};
pub use daemon::{DaemonClient, StatusReport};
pub use relay::{RelayHandle, StatusRelay};
pub use status::ServiceStatus;
