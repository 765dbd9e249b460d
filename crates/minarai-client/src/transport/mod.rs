//! Realtime transport layer.
//!
//! A factory opens one connection and hands back an outbound handle plus a
//! buffered inbound event channel. Events that arrive before the session
//! starts draining the channel are kept, not dropped.

pub mod codec;
pub mod memory;
pub mod ws;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use minarai_core::error::Result;

pub use memory::{memory_pair, MemoryRemote, MemoryTransportFactory};
pub use ws::WsTransportFactory;

/// One named event with an optional JSON payload, in either direction.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEvent {
    pub name: String,
    pub payload: Option<Value>,
}

impl WireEvent {
    pub fn new(name: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Outbound side of a connection.
pub trait Transport: Send + Sync {
    /// Queue an event for the server. Fails only when the connection is gone.
    fn emit(&self, event: &str, payload: Option<Value>) -> Result<()>;
}

/// Transport-specific connection options.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    pub path: Option<String>,
    pub query: BTreeMap<String, String>,
}

/// An opened connection.
pub struct Connection {
    pub handle: Arc<dyn Transport>,
    pub inbound: mpsc::UnboundedReceiver<WireEvent>,
}

/// Opens connections. Called once, eagerly, by `SessionClient::new`.
pub trait TransportFactory {
    fn connect(&self, url: &str, opts: &TransportOptions) -> Result<Connection>;
}
