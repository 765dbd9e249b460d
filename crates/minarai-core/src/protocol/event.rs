//! Inbound transport events and the local session event stream.
//!
//! Inbound events are decoded once from `(name, payload)` into a tagged
//! union. Republishing is a pure mapping: every event keeps its name and
//! payload except `disconnect`, which surfaces locally as `disconnected`.

use serde_json::Value;

/// Transport event names the session listens to.
pub const INBOUND_EVENTS: [&str; 10] = [
    "connect",
    "disconnect",
    "joined",
    "sync",
    "sync-system-command",
    "sync-command",
    "message",
    "operator-command",
    "system-message",
    "logs",
];

/// Event received from the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Connect,
    Disconnect,
    Joined(Value),
    Sync(Value),
    SyncSystemCommand(Value),
    SyncCommand(Value),
    Message(Value),
    OperatorCommand(Value),
    SystemMessage(Value),
    Logs(Value),
}

impl InboundEvent {
    /// Decode a transport event. Unknown names yield `None`.
    pub fn decode(name: &str, payload: Option<Value>) -> Option<Self> {
        let data = payload.unwrap_or(Value::Null);
        let ev = match name {
            "connect" => InboundEvent::Connect,
            "disconnect" => InboundEvent::Disconnect,
            "joined" => InboundEvent::Joined(data),
            "sync" => InboundEvent::Sync(data),
            "sync-system-command" => InboundEvent::SyncSystemCommand(data),
            "sync-command" => InboundEvent::SyncCommand(data),
            "message" => InboundEvent::Message(data),
            "operator-command" => InboundEvent::OperatorCommand(data),
            "system-message" => InboundEvent::SystemMessage(data),
            "logs" => InboundEvent::Logs(data),
            _ => return None,
        };
        Some(ev)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::Connect => "connect",
            InboundEvent::Disconnect => "disconnect",
            InboundEvent::Joined(_) => "joined",
            InboundEvent::Sync(_) => "sync",
            InboundEvent::SyncSystemCommand(_) => "sync-system-command",
            InboundEvent::SyncCommand(_) => "sync-command",
            InboundEvent::Message(_) => "message",
            InboundEvent::OperatorCommand(_) => "operator-command",
            InboundEvent::SystemMessage(_) => "system-message",
            InboundEvent::Logs(_) => "logs",
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            InboundEvent::Connect | InboundEvent::Disconnect => None,
            InboundEvent::Joined(v)
            | InboundEvent::Sync(v)
            | InboundEvent::SyncSystemCommand(v)
            | InboundEvent::SyncCommand(v)
            | InboundEvent::Message(v)
            | InboundEvent::OperatorCommand(v)
            | InboundEvent::SystemMessage(v)
            | InboundEvent::Logs(v) => Some(v),
        }
    }
}

/// Event published on the session's local stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connect,
    Disconnected,
    Joined(Value),
    Sync(Value),
    SyncSystemCommand(Value),
    SyncCommand(Value),
    Message(Value),
    OperatorCommand(Value),
    SystemMessage(Value),
    Logs(Value),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Connect => "connect",
            SessionEvent::Disconnected => "disconnected",
            SessionEvent::Joined(_) => "joined",
            SessionEvent::Sync(_) => "sync",
            SessionEvent::SyncSystemCommand(_) => "sync-system-command",
            SessionEvent::SyncCommand(_) => "sync-command",
            SessionEvent::Message(_) => "message",
            SessionEvent::OperatorCommand(_) => "operator-command",
            SessionEvent::SystemMessage(_) => "system-message",
            SessionEvent::Logs(_) => "logs",
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            SessionEvent::Connect | SessionEvent::Disconnected => None,
            SessionEvent::Joined(v)
            | SessionEvent::Sync(v)
            | SessionEvent::SyncSystemCommand(v)
            | SessionEvent::SyncCommand(v)
            | SessionEvent::Message(v)
            | SessionEvent::OperatorCommand(v)
            | SessionEvent::SystemMessage(v)
            | SessionEvent::Logs(v) => Some(v),
        }
    }
}

/// Map an inbound event to the local event it republishes as.
pub fn republish(ev: InboundEvent) -> SessionEvent {
    match ev {
        InboundEvent::Connect => SessionEvent::Connect,
        // the one rename
        InboundEvent::Disconnect => SessionEvent::Disconnected,
        InboundEvent::Joined(v) => SessionEvent::Joined(v),
        InboundEvent::Sync(v) => SessionEvent::Sync(v),
        InboundEvent::SyncSystemCommand(v) => SessionEvent::SyncSystemCommand(v),
        InboundEvent::SyncCommand(v) => SessionEvent::SyncCommand(v),
        InboundEvent::Message(v) => SessionEvent::Message(v),
        InboundEvent::OperatorCommand(v) => SessionEvent::OperatorCommand(v),
        InboundEvent::SystemMessage(v) => SessionEvent::SystemMessage(v),
        InboundEvent::Logs(v) => SessionEvent::Logs(v),
    }
}
