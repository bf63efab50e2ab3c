//! Communication with the decoy daemon
//!
//! The daemon is an opaque local HTTP service. This module wraps it behind
//! [`DaemonClient`], which owns the retry, timeout and error-normalization
//! policy for every call.

pub mod client;
pub mod protocol;
pub mod retry;
pub mod transport;

pub use client::DaemonClient;
pub use protocol::{CommandAck, HealthReport, SessionStats, StatusReport};
pub use retry::{Backoff, RetryPolicy};
