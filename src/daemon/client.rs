//! Client for the daemon's HTTP API
//!
//! Each operation has its own failure policy:
//! - `start` retries transport failures, since the daemon may still be booting
//! - `stop` never retries and surfaces the first failure
//! - `status` never fails; an unreachable daemon is itself a status

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::common::{config::Config, Error, Result, TransportError};

use super::protocol::{path, CommandAck, HealthReport, ScheduleRequest, StatusReport};
use super::retry::{RetryError, RetryPolicy};
use super::transport::{HttpTransport, Method, Transport};

/// Client for communicating with the decoy daemon
#[derive(Clone)]
pub struct DaemonClient {
    transport: Arc<dyn Transport>,
    start_policy: RetryPolicy,
}

impl DaemonClient {
    /// Create a client over an existing transport
    pub fn new(transport: Arc<dyn Transport>, start_policy: RetryPolicy) -> Self {
        Self {
            transport,
            start_policy,
        }
    }

    /// Create an HTTP client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(config.daemon.base_url(), config.daemon.timeout())?;
        let policy = RetryPolicy::fixed(config.retry.start_retries, config.retry.delay());
        Ok(Self::new(Arc::new(transport), policy))
    }

    /// Base URL of the daemon API
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Start the decoy service
    pub async fn start(&self) -> Result<CommandAck> {
        self.start_with_cancel(&CancellationToken::new()).await
    }

    /// Start the decoy service, giving up early if `cancel` fires
    pub async fn start_with_cancel(&self, cancel: &CancellationToken) -> Result<CommandAck> {
        let body = self
            .start_policy
            .run(cancel, |attempt| {
                tracing::debug!(attempt, "Requesting service start");
                self.transport.request(Method::Post, path::START, None)
            })
            .await
            .map_err(|e| match e {
                RetryError::Exhausted { attempts, last } => {
                    tracing::warn!(attempts, kind = last.kind(), error = %last, "Daemon unreachable");
                    Error::DaemonUnreachable {
                        attempts,
                        cause: last,
                    }
                }
                RetryError::Cancelled => Error::Cancelled,
            })?;

        let ack = CommandAck::from_body(body)?;
        tracing::info!(message = ack.message.as_deref().unwrap_or(""), "Service started");
        Ok(ack)
    }

    /// Stop the decoy service
    pub async fn stop(&self) -> Result<CommandAck> {
        let body = self
            .transport
            .request(Method::Post, path::STOP, None)
            .await
            .inspect_err(|e| tracing::warn!(kind = e.kind(), error = %e, "Stop request failed"))?;

        let ack = CommandAck::from_body(body)?;
        tracing::info!(message = ack.message.as_deref().unwrap_or(""), "Service stopped");
        Ok(ack)
    }

    /// Get current service status
    ///
    /// Never fails: when the daemon cannot be asked the result is
    /// [`StatusReport::offline`].
    pub async fn status(&self) -> StatusReport {
        match self.probe_status().await {
            Ok(report) => report,
            Err(e) => {
                tracing::debug!(kind = e.kind(), error = %e, "Daemon offline");
                StatusReport::offline()
            }
        }
    }

    /// Query status, keeping the failure reason
    pub async fn probe_status(&self) -> std::result::Result<StatusReport, TransportError> {
        let body = self.transport.request(Method::Get, path::STATUS, None).await?;
        Ok(StatusReport::from_body(&body))
    }

    /// Check daemon health
    pub async fn health(&self) -> Result<HealthReport> {
        let body = self.transport.request(Method::Get, path::HEALTH, None).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Fetch the daemon's active settings
    pub async fn daemon_config(&self) -> Result<Value> {
        let body = self.transport.request(Method::Get, path::CONFIG, None).await?;
        let mut ack = CommandAck::from_body(body)?;
        Ok(ack.data.get_mut("config").map(Value::take).unwrap_or(Value::Null))
    }

    /// Ask the daemon to run sessions periodically
    ///
    /// `interval` and `duration` are in minutes.
    pub async fn schedule(&self, interval: u32, duration: u32) -> Result<CommandAck> {
        let request = serde_json::to_value(ScheduleRequest { interval, duration })?;
        let body = self
            .transport
            .request(Method::Post, path::SCHEDULE, Some(&request))
            .await?;
        let ack = CommandAck::from_body(body)?;
        tracing::info!(interval, duration, "Service scheduled");
        Ok(ack)
    }
}
