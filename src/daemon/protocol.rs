//! Daemon HTTP API message types
//!
//! The daemon is not trusted to send complete documents. Missing or
//! mistyped fields decode to their defaults instead of failing, so a
//! half-written status still renders.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{Error, Result};

/// API paths, relative to the configured base URL
pub mod path {
    pub const START: &str = "/start";
    pub const STOP: &str = "/stop";
    pub const STATUS: &str = "/status";
    pub const HEALTH: &str = "/health";
    pub const CONFIG: &str = "/config";
    pub const SCHEDULE: &str = "/schedule";
}

/// Counters reported by the daemon for the current session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStats {
    pub sites_visited: u64,
    pub clicks_made: u64,
    pub searches_performed: u64,
    pub session_duration_minutes: f64,
}

impl SessionStats {
    /// Decode counters from a daemon `stats` object, zeroing anything
    /// absent or unusable
    pub fn from_value(value: &Value) -> Self {
        Self {
            sites_visited: count(value, "sitesVisited"),
            clicks_made: count(value, "clicksMade"),
            searches_performed: count(value, "searchesPerformed"),
            session_duration_minutes: value
                .get("sessionDurationMinutes")
                .and_then(Value::as_f64)
                .filter(|m| m.is_finite() && *m >= 0.0)
                .unwrap_or(0.0),
        }
    }
}

fn count(value: &Value, key: &str) -> u64 {
    value
        .get(key)
        .and_then(|n| {
            n.as_u64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
        })
        .unwrap_or(0)
}

/// Normalized answer to a status query
///
/// This is also the `getStatus` reply shape on the listener surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub running: bool,
    #[serde(default)]
    pub stats: SessionStats,
    pub daemon_online: bool,
}

impl StatusReport {
    /// The report used whenever the daemon could not be asked
    pub fn offline() -> Self {
        Self {
            running: false,
            stats: SessionStats::default(),
            daemon_online: false,
        }
    }

    /// Decode a `/status` response body
    pub fn from_body(body: &Value) -> Self {
        Self {
            running: body.get("running").and_then(Value::as_bool).unwrap_or(false),
            stats: body.get("stats").map(SessionStats::from_value).unwrap_or_default(),
            daemon_online: true,
        }
    }
}

/// Acknowledgement of a state-changing command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandAck {
    /// Human-readable message from the daemon, if any
    pub message: Option<String>,
    /// Full response body
    pub data: Value,
}

impl CommandAck {
    /// Interpret a command response body.
    ///
    /// A body without `success: true` is a daemon-side failure, carrying
    /// the daemon's `error` text when present.
    pub fn from_body(body: Value) -> Result<Self> {
        let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
        if !success {
            let error = body.get("error").and_then(Value::as_str).map(str::to_string);
            return Err(Error::daemon_error(error));
        }

        Ok(Self {
            message: body.get("message").and_then(Value::as_str).map(str::to_string),
            data: body,
        })
    }
}

/// Daemon health document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HealthReport {
    pub status: String,
    pub service: Option<String>,
    pub version: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Body of a schedule request, both values in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleRequest {
    pub interval: u32,
    pub duration: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_full_body() {
        let body = json!({
            "running": true,
            "status": "running",
            "stats": {
                "sitesVisited": 12,
                "clicksMade": 30,
                "searchesPerformed": 4,
                "sessionDurationMinutes": 2.5
            }
        });
        let report = StatusReport::from_body(&body);
        assert!(report.running);
        assert!(report.daemon_online);
        assert_eq!(report.stats.sites_visited, 12);
        assert_eq!(report.stats.clicks_made, 30);
        assert_eq!(report.stats.searches_performed, 4);
        assert_eq!(report.stats.session_duration_minutes, 2.5);
    }

    #[test]
    fn test_status_missing_fields_default() {
        let report = StatusReport::from_body(&json!({}));
        assert!(!report.running);
        assert!(report.daemon_online);
        assert_eq!(report.stats, SessionStats::default());
    }

    #[test]
    fn test_status_mistyped_fields_default() {
        let body = json!({
            "running": "yes",
            "stats": { "sitesVisited": "many", "clicksMade": -3, "searchesPerformed": 7.9 }
        });
        let report = StatusReport::from_body(&body);
        assert!(!report.running);
        assert_eq!(report.stats.sites_visited, 0);
        assert_eq!(report.stats.clicks_made, 0);
        assert_eq!(report.stats.searches_performed, 7);
        assert_eq!(report.stats.session_duration_minutes, 0.0);
    }

    #[test]
    fn test_status_null_stats() {
        let report = StatusReport::from_body(&json!({ "running": true, "stats": null }));
        assert!(report.running);
        assert_eq!(report.stats, SessionStats::default());
    }

    #[test]
    fn test_offline_report_shape() {
        let value = serde_json::to_value(StatusReport::offline()).unwrap();
        assert_eq!(value["running"], json!(false));
        assert_eq!(value["daemonOnline"], json!(false));
        assert_eq!(value["stats"]["sitesVisited"], json!(0));
    }

    #[test]
    fn test_ack_success() {
        let ack = CommandAck::from_body(json!({
            "success": true,
            "message": "Decoy service started",
            "status": "running"
        }))
        .unwrap();
        assert_eq!(ack.message.as_deref(), Some("Decoy service started"));
        assert_eq!(ack.data["status"], json!("running"));
    }

    #[test]
    fn test_ack_failure_carries_daemon_error() {
        let err = CommandAck::from_body(json!({
            "success": false,
            "error": "Service already running"
        }))
        .unwrap_err();
        match err {
            Error::DaemonError(msg) => assert_eq!(msg, "Service already running"),
            other => panic!("Expected DaemonError, got {other:?}"),
        }
    }

    #[test]
    fn test_ack_without_success_flag_is_failure() {
        let err = CommandAck::from_body(json!({ "message": "ok?" })).unwrap_err();
        assert!(matches!(err, Error::DaemonError(_)));
    }

    #[test]
    fn test_health_partial() {
        let health: HealthReport = serde_json::from_value(json!({ "status": "healthy" })).unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.version, None);
    }
}
