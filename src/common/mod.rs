//! Common utilities shared by the client, the relay and the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result, TransportError};
