//! Outbound envelope (JSON).
//!
//! Every outbound call builds one envelope from the identity held at that
//! moment and a single clock read. The same timestamp feeds both the
//! correlation `id` and `head.timestampUnixTime`.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::protocol::identity::Identity;

/// Logical purpose of an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Message,
    SystemCommand,
    Command,
    Logs,
}

impl OperationKind {
    /// Transport event name used to emit this kind.
    pub fn event_name(self) -> &'static str {
        match self {
            OperationKind::Message => "message",
            OperationKind::SystemCommand => "system-command",
            OperationKind::Command => "command",
            OperationKind::Logs => "logs",
        }
    }

    /// Suffix appended to the correlation id. Plain messages carry none.
    pub fn id_suffix(self) -> Option<&'static str> {
        match self {
            OperationKind::Message => None,
            OperationKind::SystemCommand => Some("system"),
            OperationKind::Command => Some("command"),
            OperationKind::Logs => Some("logs"),
        }
    }
}

/// Log retrieval window, passed through as the `logs` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Legacy `{command, payload}` pair wrapped by `system-command`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemCommand {
    pub command: String,
    pub payload: Value,
}

/// Envelope body, one variant per operation kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    Message {
        message: String,
        position: Value,
        extra: Value,
    },
    SystemCommand {
        message: SystemCommand,
    },
    Command {
        name: String,
        extra: Value,
    },
    Logs(LogsQuery),
}

impl Body {
    pub fn kind(&self) -> OperationKind {
        match self {
            Body::Message { .. } => OperationKind::Message,
            Body::SystemCommand { .. } => OperationKind::SystemCommand,
            Body::Command { .. } => OperationKind::Command,
            Body::Logs(_) => OperationKind::Logs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeHead {
    pub application_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    pub timestamp_unix_time: u64,
}

/// Wire message sent to the server.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub id: String,
    pub head: EnvelopeHead,
    pub body: Body,
    #[serde(skip)]
    kind: OperationKind,
}

impl Envelope {
    /// Build an envelope from an identity snapshot and one timestamp.
    pub fn build(identity: &Identity, timestamp_ms: u64, lang: Option<String>, body: Body) -> Self {
        let kind = body.kind();
        Self {
            id: correlation_id(identity, timestamp_ms, kind),
            head: EnvelopeHead {
                application_id: identity.application_id.clone(),
                client_id: identity.client_id.clone(),
                user_id: identity.user_id.clone(),
                device_id: identity.device_id.clone(),
                lang,
                timestamp_unix_time: timestamp_ms,
            },
            body,
            kind,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Transport event name for this envelope.
    pub fn event_name(&self) -> &'static str {
        self.kind.event_name()
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// `<applicationId><clientId><userId><deviceId>-<ts>[-<suffix>]`
pub fn correlation_id(identity: &Identity, timestamp_ms: u64, kind: OperationKind) -> String {
    let prefix = identity.correlation_prefix();
    match kind.id_suffix() {
        Some(suffix) => format!("{prefix}-{timestamp_ms}-{suffix}"),
        None => format!("{prefix}-{timestamp_ms}"),
    }
}

/// Current unix time in milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn ident() -> Identity {
        Identity::new("A", Some("C".into()), Some("U".into()), Some("D".into()), 0)
    }

    #[test]
    fn message_envelope_shape() {
        let body = Body::Message {
            message: "hi".into(),
            position: json!({}),
            extra: json!({}),
        };
        let env = Envelope::build(&ident(), 1234, Some("ja-JP".into()), body);
        let v = env.to_value().unwrap();
        assert_eq!(
            v,
            json!({
                "id": "ACUD-1234",
                "head": {
                    "applicationId": "A",
                    "clientId": "C",
                    "userId": "U",
                    "deviceId": "D",
                    "lang": "ja-JP",
                    "timestampUnixTime": 1234
                },
                "body": { "message": "hi", "position": {}, "extra": {} }
            })
        );
        assert_eq!(env.event_name(), "message");
    }

    #[test]
    fn same_tick_ids_differ_by_kind() {
        let a = Envelope::build(
            &ident(),
            99,
            None,
            Body::Message { message: "x".into(), position: json!({}), extra: json!({}) },
        );
        let b = Envelope::build(&ident(), 99, None, Body::Command { name: "n".into(), extra: json!(null) });
        let c = Envelope::build(&ident(), 99, None, Body::Logs(LogsQuery::default()));
        assert_eq!(b.id, "ACUD-99-command");
        assert_eq!(c.id, "ACUD-99-logs");
        assert_eq!(a.kind(), OperationKind::Message);
        assert_eq!(b.kind(), OperationKind::Command);
        assert_eq!(c.kind(), OperationKind::Logs);
        assert_ne!(a.id, b.id);
        assert_ne!(b.id, c.id);
    }

    #[test]
    fn system_command_wraps_pair_in_message() {
        let env = Envelope::build(
            &ident(),
            5,
            None,
            Body::SystemCommand {
                message: SystemCommand { command: "reset".into(), payload: json!({"a": 1}) },
            },
        );
        let v = env.to_value().unwrap();
        assert_eq!(v["id"], "ACUD-5-system");
        assert_eq!(v["body"], json!({ "message": { "command": "reset", "payload": { "a": 1 } } }));
        assert!(v["head"].get("lang").is_none());
        assert_eq!(env.event_name(), "system-command");
    }

    #[test]
    fn logs_query_passes_through_verbatim() {
        let q = LogsQuery { lt_date: Some("2024-01-01".into()), limit: Some(20) };
        let env = Envelope::build(&ident(), 7, None, Body::Logs(q));
        let v = env.to_value().unwrap();
        assert_eq!(v["body"], json!({ "ltDate": "2024-01-01", "limit": 20 }));
        assert_eq!(v["head"]["timestampUnixTime"], 7);

        let env = Envelope::build(&ident(), 7, None, Body::Logs(LogsQuery::default()));
        assert_eq!(env.to_value().unwrap()["body"], json!({}));
    }
}
