//! Listener-side view of the service
//!
//! Tracks what a UI shows: `Inactive`, `Starting` or `Running`. While a
//! user-initiated start is being confirmed, pushes that still say "not
//! running" are stale and must not flip the view back to `Inactive`.

use chrono::{DateTime, Utc};

use crate::daemon::StatusReport;
use crate::status::ServiceStatus;

use super::message::{CommandReply, StatusUpdate};

/// UI-observable service state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    Inactive,
    Starting,
    Running,
}

/// User-facing label. A running service is shown as `Active`, the word the
/// popup and the watch output use for a live session.
impl std::fmt::Display for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UiState::Inactive => write!(f, "Inactive"),
            UiState::Starting => write!(f, "Starting"),
            UiState::Running => write!(f, "Active"),
        }
    }
}

/// A listener's local copy of the service status
#[derive(Debug, Clone, Default)]
pub struct RemoteView {
    status: ServiceStatus,
    starting: bool,
    last_error: Option<String>,
    last_seq: Option<u64>,
}

impl RemoteView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> UiState {
        if self.starting {
            UiState::Starting
        } else if self.status.running {
            UiState::Running
        } else {
            UiState::Inactive
        }
    }

    pub fn status(&self) -> &ServiceStatus {
        &self.status
    }

    /// Last command failure, cleared by the next command
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// User asked to start. Returns `false` if a start is already in flight,
    /// in which case nothing changes and no request should be sent.
    pub fn begin_start(&mut self) -> bool {
        if self.starting {
            return false;
        }
        self.starting = true;
        self.last_error = None;
        true
    }

    /// The start request resolved
    pub fn finish_start(&mut self, reply: &CommandReply, now: DateTime<Utc>) {
        self.starting = false;
        if reply.success {
            self.last_error = None;
            // a push may already have confirmed the session and derived its start
            if !self.status.running {
                self.status.mark_started(now);
            }
        } else {
            self.last_error = Some(failure_message(reply));
        }
    }

    /// The stop request resolved
    pub fn finish_stop(&mut self, reply: &CommandReply) {
        if reply.success {
            self.last_error = None;
            self.status.mark_stopped();
        } else {
            self.last_error = Some(failure_message(reply));
        }
    }

    /// Fold a status fetched directly (a `getStatus` reply)
    pub fn apply_status(&mut self, report: &StatusReport, now: DateTime<Utc>) {
        self.fold(report, now);
    }

    /// Fold a pushed update. Returns `false` if the update was older than
    /// one already applied.
    pub fn apply_push(&mut self, update: &StatusUpdate, now: DateTime<Utc>) -> bool {
        if self.last_seq.is_some_and(|last| update.seq <= last) {
            return false;
        }
        self.last_seq = Some(update.seq);
        self.fold(&update.report(), now);
        true
    }

    fn fold(&mut self, report: &StatusReport, now: DateTime<Utc>) {
        if self.starting && !report.running {
            self.status.daemon_online = report.daemon_online;
            self.status.stats = report.stats.clone();
            return;
        }
        if report.running {
            self.starting = false;
        }
        self.status.apply_report(report, now);
    }
}

fn failure_message(reply: &CommandReply) -> String {
    reply.error.clone().unwrap_or_else(|| "Unknown error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::SessionStats;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn push(seq: u64, running: bool, minutes: f64) -> StatusUpdate {
        StatusUpdate {
            seq,
            running,
            stats: SessionStats {
                sites_visited: seq,
                session_duration_minutes: minutes,
                ..Default::default()
            },
            daemon_online: true,
        }
    }

    fn ok() -> CommandReply {
        CommandReply {
            success: true,
            data: Some(json!({ "success": true })),
            error: None,
        }
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(UiState::Inactive.to_string(), "Inactive");
        assert_eq!(UiState::Starting.to_string(), "Starting");
        assert_eq!(UiState::Running.to_string(), "Active");
    }

    #[test]
    fn test_click_start_enters_starting() {
        let mut view = RemoteView::new();
        assert_eq!(view.state(), UiState::Inactive);

        assert!(view.begin_start());
        assert_eq!(view.state(), UiState::Starting);
    }

    #[test]
    fn test_second_click_while_starting_is_noop() {
        let mut view = RemoteView::new();
        assert!(view.begin_start());
        assert!(!view.begin_start());
        assert_eq!(view.state(), UiState::Starting);
    }

    #[test]
    fn test_start_refused_returns_to_inactive_with_error() {
        let mut view = RemoteView::new();
        view.begin_start();
        view.finish_start(&CommandReply::failed("Service already running"), at(0));

        assert_eq!(view.state(), UiState::Inactive);
        assert_eq!(view.last_error(), Some("Service already running"));
    }

    #[test]
    fn test_start_success_enters_running() {
        let mut view = RemoteView::new();
        view.begin_start();
        view.finish_start(&ok(), at(0));

        assert_eq!(view.state(), UiState::Running);
        assert_eq!(view.status().session_start, Some(at(0)));
        assert!(view.status().daemon_online);
        assert_eq!(view.last_error(), None);
    }

    #[test]
    fn test_stale_stop_push_ignored_while_starting() {
        let mut view = RemoteView::new();
        view.begin_start();
        assert!(view.apply_push(&push(1, false, 0.0), at(0)));

        assert_eq!(view.state(), UiState::Starting);
        assert!(!view.status().running);
        assert_eq!(view.status().stats.sites_visited, 1);
    }

    #[test]
    fn test_running_push_confirms_start() {
        let mut view = RemoteView::new();
        view.begin_start();
        view.apply_push(&push(1, true, 1.0), at(0));
        assert_eq!(view.state(), UiState::Running);

        // the start reply arriving afterwards keeps the derived session start
        view.finish_start(&ok(), at(400));
        assert_eq!(view.state(), UiState::Running);
        assert_eq!(view.status().session_start, Some(at(-60_000)));
    }

    #[test]
    fn test_poll_reports_stopped_leaves_running() {
        let mut view = RemoteView::new();
        view.apply_push(&push(1, true, 0.0), at(0));
        view.apply_push(&push(2, false, 0.0), at(2_000));

        assert_eq!(view.state(), UiState::Inactive);
        assert_eq!(view.status().session_start, None);
    }

    #[test]
    fn test_stop_success_leaves_running() {
        let mut view = RemoteView::new();
        view.apply_push(&push(1, true, 0.0), at(0));
        view.finish_stop(&ok());
        assert_eq!(view.state(), UiState::Inactive);
    }

    #[test]
    fn test_stop_failure_keeps_running_and_records_error() {
        let mut view = RemoteView::new();
        view.apply_push(&push(1, true, 0.0), at(0));
        view.finish_stop(&CommandReply::failed("connection refused"));

        assert_eq!(view.state(), UiState::Running);
        assert_eq!(view.last_error(), Some("connection refused"));
    }

    #[test]
    fn test_running_push_from_any_state() {
        let mut view = RemoteView::new();
        view.apply_push(&push(1, true, 0.5), at(0));
        assert_eq!(view.state(), UiState::Running);
        view.apply_push(&push(2, true, 0.5), at(2_000));
        assert_eq!(view.state(), UiState::Running);
    }

    #[test]
    fn test_repeated_identical_pushes_are_idempotent() {
        let mut view = RemoteView::new();
        view.apply_status(
            &StatusReport {
                running: true,
                stats: SessionStats { session_duration_minutes: 2.0, ..Default::default() },
                daemon_online: true,
            },
            at(0),
        );
        let before = view.status().clone();

        let update = StatusUpdate {
            seq: 1,
            running: true,
            stats: before.stats.clone(),
            daemon_online: true,
        };
        view.apply_push(&update, at(1_000));
        view.apply_push(&StatusUpdate { seq: 2, ..update.clone() }, at(2_000));
        view.apply_push(&StatusUpdate { seq: 3, ..update }, at(3_000));

        assert_eq!(view.status(), &before);
        assert_eq!(view.status().session_start, Some(at(-120_000)));
    }

    #[test]
    fn test_out_of_order_push_rejected() {
        let mut view = RemoteView::new();
        assert!(view.apply_push(&push(5, true, 0.0), at(0)));
        assert!(!view.apply_push(&push(4, false, 0.0), at(10)));
        assert_eq!(view.state(), UiState::Running);
    }

    #[test]
    fn test_end_to_end_session_start() {
        let mut view = RemoteView::new();
        view.apply_push(&push(1, true, 2.0), at(0));
        assert_eq!(view.status().session_start, Some(at(-120_000)));

        view.apply_push(&push(2, true, 2.0), at(1_000));
        assert_eq!(view.status().session_start, Some(at(-120_000)));
    }
}
