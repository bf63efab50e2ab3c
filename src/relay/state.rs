//! Relay-owned status with out-of-order protection
//!
//! Polls overlap, so a slow response from an old poll can arrive after a
//! newer one. Every observation carries the sequence id it was issued
//! with; anything not newer than the last accepted id is dropped.

use chrono::{DateTime, Utc};

use crate::daemon::StatusReport;
use crate::status::ServiceStatus;

use super::message::StatusUpdate;

/// Something the relay learned about the service
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// A status poll completed
    Status(StatusReport),
    /// A start command was acknowledged by the daemon
    Started,
    /// A stop command was acknowledged by the daemon
    Stopped,
}

/// The relay's single copy of the service status
#[derive(Debug, Default)]
pub struct RelayState {
    status: ServiceStatus,
    accepted: Option<u64>,
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ServiceStatus {
        &self.status
    }

    /// Sequence id of the last accepted observation
    pub fn accepted(&self) -> Option<u64> {
        self.accepted
    }

    /// Fold an observation issued with `seq` into the state.
    ///
    /// Returns the update to publish, or `None` if the observation was
    /// stale.
    pub fn accept(
        &mut self,
        seq: u64,
        observation: &Observation,
        now: DateTime<Utc>,
    ) -> Option<StatusUpdate> {
        if let Some(last) = self.accepted.filter(|last| seq <= *last) {
            tracing::debug!(seq, last, "Discarding stale observation");
            return None;
        }
        self.accepted = Some(seq);

        match observation {
            Observation::Status(report) => self.status.apply_report(report, now),
            Observation::Started => self.status.mark_started(now),
            Observation::Stopped => self.status.mark_stopped(),
        }

        Some(StatusUpdate::new(seq, &self.status))
    }
}
