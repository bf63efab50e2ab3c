//! Listener message surface
//!
//! Requests and replies exchanged between a listener (a UI) and the relay,
//! plus the `statusUpdate` push. Lines are JSON objects discriminated by
//! their `action` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{Error, Result};
use crate::daemon::{CommandAck, SessionStats, StatusReport};
use crate::status::ServiceStatus;

/// Message shown when a start cannot reach the daemon
pub const DAEMON_OFFLINE_MESSAGE: &str = "Daemon offline. Run setup-daemon.sh to fix.";

/// Request from a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    StartService,
    StopService,
    GetStatus,
}

/// A request with an optional correlation id, echoed on the reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub request: Request,
}

/// Reply to a listener request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Command(CommandReply),
    Status(StatusReport),
}

/// A reply with the id of the request it answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub reply: Reply,
}

/// Outcome of a start/stop command, as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandReply {
    pub fn ok(ack: &CommandAck) -> Self {
        Self {
            success: true,
            data: Some(ack.data.clone()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Render a start result. Any failure to reach the daemon collapses to
    /// one actionable message; a daemon refusal keeps the daemon's words.
    pub fn from_start(result: &Result<CommandAck>) -> Self {
        match result {
            Ok(ack) => Self::ok(ack),
            Err(Error::DaemonError(message)) => Self::failed(message.clone()),
            Err(e) if e.is_offline() => Self::failed(DAEMON_OFFLINE_MESSAGE),
            Err(e) => Self::failed(e.to_string()),
        }
    }

    /// Render a stop result, surfacing the underlying error
    pub fn from_stop(result: &Result<CommandAck>) -> Self {
        match result {
            Ok(ack) => Self::ok(ack),
            Err(Error::DaemonError(message)) => Self::failed(message.clone()),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Push sent to every listener after each accepted observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename = "statusUpdate", rename_all = "camelCase")]
pub struct StatusUpdate {
    /// Monotonic sequence id of the observation this update reflects
    pub seq: u64,
    pub running: bool,
    pub stats: SessionStats,
    pub daemon_online: bool,
}

impl StatusUpdate {
    pub fn new(seq: u64, status: &ServiceStatus) -> Self {
        Self {
            seq,
            running: status.running,
            stats: status.stats.clone(),
            daemon_online: status.daemon_online,
        }
    }

    /// The update as a status report, for folding into a listener's view
    pub fn report(&self) -> StatusReport {
        StatusReport {
            running: self.running,
            stats: self.stats.clone(),
            daemon_online: self.daemon_online,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TransportError;
    use serde_json::json;

    #[test]
    fn test_request_actions() {
        let env: Envelope = serde_json::from_str(r#"{"action":"startService","id":7}"#).unwrap();
        assert_eq!(env.id, Some(7));
        assert_eq!(env.request, Request::StartService);

        let env: Envelope = serde_json::from_str(r#"{"action":"getStatus"}"#).unwrap();
        assert_eq!(env.id, None);
        assert_eq!(env.request, Request::GetStatus);

        assert!(serde_json::from_str::<Envelope>(r#"{"action":"ensureDaemon"}"#).is_err());
    }

    #[test]
    fn test_status_update_wire_shape() {
        let update = StatusUpdate {
            seq: 3,
            running: true,
            stats: SessionStats { clicks_made: 2, ..Default::default() },
            daemon_online: true,
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["action"], json!("statusUpdate"));
        assert_eq!(value["daemonOnline"], json!(true));
        assert_eq!(value["stats"]["clicksMade"], json!(2));

        let back: StatusUpdate = serde_json::from_value(value).unwrap();
        assert_eq!(back, update);
    }

    #[test]
    fn test_status_reply_shape() {
        let reply = ReplyEnvelope {
            id: Some(1),
            reply: Reply::Status(StatusReport::offline()),
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["running"], json!(false));
        assert_eq!(value["daemonOnline"], json!(false));
    }

    #[test]
    fn test_start_offline_message() {
        let result = Err(Error::DaemonUnreachable {
            attempts: 4,
            cause: TransportError::Connect {
                url: "http://localhost:9999/api/start".into(),
                message: "refused".into(),
            },
        });
        let reply = CommandReply::from_start(&result);
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some(DAEMON_OFFLINE_MESSAGE));
    }

    #[test]
    fn test_stop_surfaces_underlying_error() {
        let cause = TransportError::Connect {
            url: "http://localhost:9999/api/stop".into(),
            message: "refused".into(),
        };
        let expected = cause.to_string();
        let reply = CommandReply::from_stop(&Err(Error::Transport(cause)));
        assert_eq!(reply.error, Some(expected));
    }

    #[test]
    fn test_daemon_refusal_keeps_message() {
        let reply = CommandReply::from_start(&Err(Error::DaemonError("Service already running".into())));
        assert_eq!(reply.error.as_deref(), Some("Service already running"));
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value, json!({ "success": false, "error": "Service already running" }));
    }
}
