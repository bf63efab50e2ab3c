//! Last-known service status
//!
//! `session_start` is derived locally from the reported session duration.
//! It is set when `running` goes from false to true and then left alone
//! while the service keeps running, so the elapsed-time display does not
//! drift with every poll.

use chrono::{DateTime, TimeDelta, Utc};

use crate::daemon::{SessionStats, StatusReport};

/// In-memory view of the remote service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceStatus {
    pub running: bool,
    pub daemon_online: bool,
    /// Set iff `running`
    pub session_start: Option<DateTime<Utc>>,
    pub stats: SessionStats,
}

impl ServiceStatus {
    /// Fold a status report observed at `now` into this status
    pub fn apply_report(&mut self, report: &StatusReport, now: DateTime<Utc>) {
        let was_running = self.running;

        self.running = report.running;
        self.daemon_online = report.daemon_online;
        self.stats = report.stats.clone();

        if !self.running {
            self.session_start = None;
        } else if !was_running || self.session_start.is_none() {
            self.session_start = Some(
                now.checked_sub_signed(session_duration(&report.stats))
                    .unwrap_or(now),
            );
        }
    }

    /// Mark the service as running from `now`, as confirmed by a start command
    pub fn mark_started(&mut self, now: DateTime<Utc>) {
        self.running = true;
        self.daemon_online = true;
        self.session_start = Some(now);
    }

    /// Mark the service as stopped, as confirmed by a stop command
    pub fn mark_stopped(&mut self) {
        self.running = false;
        self.session_start = None;
    }

    /// Time since the session started, if running
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.session_start
            .filter(|_| self.running)
            .map(|start| (now - start).max(TimeDelta::zero()))
    }
}

fn session_duration(stats: &SessionStats) -> TimeDelta {
    TimeDelta::try_milliseconds((stats.session_duration_minutes * 60_000.0).round() as i64)
        .unwrap_or_else(TimeDelta::zero)
}

/// Format an elapsed duration as `m:ss`
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn running(minutes: f64) -> StatusReport {
        StatusReport {
            running: true,
            stats: SessionStats {
                session_duration_minutes: minutes,
                ..Default::default()
            },
            daemon_online: true,
        }
    }

    #[test]
    fn test_session_start_derived_from_duration() {
        let mut status = ServiceStatus::default();
        status.apply_report(&running(2.0), at(0));

        assert!(status.running);
        assert_eq!(status.session_start, Some(at(-120_000)));
    }

    #[test]
    fn test_session_start_persists_across_running_polls() {
        let mut status = ServiceStatus::default();
        status.apply_report(&running(2.0), at(0));
        status.apply_report(&running(2.0), at(1_000));

        assert_eq!(status.session_start, Some(at(-120_000)));
    }

    #[test]
    fn test_identical_reports_are_idempotent() {
        let mut status = ServiceStatus::default();
        let report = running(3.0);
        status.apply_report(&report, at(0));
        let first = status.clone();

        status.apply_report(&report, at(500));
        status.apply_report(&report, at(900));

        assert_eq!(status, first);
    }

    #[test]
    fn test_stop_clears_session_start() {
        let mut status = ServiceStatus::default();
        status.apply_report(&running(1.0), at(0));
        status.apply_report(&StatusReport::offline(), at(1_000));

        assert!(!status.running);
        assert!(!status.daemon_online);
        assert_eq!(status.session_start, None);
    }

    #[test]
    fn test_restart_recomputes_session_start() {
        let mut status = ServiceStatus::default();
        status.apply_report(&running(5.0), at(0));
        status.apply_report(&StatusReport { running: false, daemon_online: true, ..Default::default() }, at(1_000));
        status.apply_report(&running(0.0), at(2_000));

        assert_eq!(status.session_start, Some(at(2_000)));
    }

    #[test]
    fn test_mark_started_then_poll_keeps_start() {
        let mut status = ServiceStatus::default();
        status.mark_started(at(0));
        status.apply_report(&running(0.0), at(1_500));

        assert_eq!(status.session_start, Some(at(0)));
    }

    #[test]
    fn test_elapsed_and_format() {
        let mut status = ServiceStatus::default();
        assert_eq!(status.elapsed(at(0)), None);

        status.apply_report(&running(2.0), at(0));
        let elapsed = status.elapsed(at(5_000)).unwrap();
        assert_eq!(format_elapsed(elapsed), "2:05");

        status.mark_stopped();
        assert_eq!(status.elapsed(at(6_000)), None);
    }

    #[test]
    fn test_format_elapsed_pads_seconds() {
        assert_eq!(format_elapsed(TimeDelta::seconds(9)), "0:09");
        assert_eq!(format_elapsed(TimeDelta::seconds(3_661)), "61:01");
        assert_eq!(format_elapsed(TimeDelta::seconds(-4)), "0:00");
    }
}
