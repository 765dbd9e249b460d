//! In-process transport.
//!
//! `memory_pair` returns a factory for the session and the remote end that
//! plays the server: it injects inbound events and observes emitted ones.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;

use minarai_core::error::{MinaraiError, Result};

use crate::transport::{Connection, Transport, TransportFactory, TransportOptions, WireEvent};

pub struct MemoryTransportFactory {
    conn: Mutex<Option<Connection>>,
    connected_url: Arc<Mutex<Option<String>>>,
}

pub struct MemoryRemote {
    inbound: mpsc::UnboundedSender<WireEvent>,
    outbound: mpsc::UnboundedReceiver<WireEvent>,
    connected_url: Arc<Mutex<Option<String>>>,
}

struct MemoryHandle {
    tx: mpsc::UnboundedSender<WireEvent>,
}

impl Transport for MemoryHandle {
    fn emit(&self, event: &str, payload: Option<Value>) -> Result<()> {
        self.tx
            .send(WireEvent::new(event, payload))
            .map_err(|_| MinaraiError::Closed)
    }
}

/// Build a connected factory/remote pair. The factory connects once.
pub fn memory_pair() -> (MemoryTransportFactory, MemoryRemote) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let connected_url = Arc::new(Mutex::new(None));

    let factory = MemoryTransportFactory {
        conn: Mutex::new(Some(Connection {
            handle: Arc::new(MemoryHandle { tx: out_tx }),
            inbound: in_rx,
        })),
        connected_url: Arc::clone(&connected_url),
    };
    let remote = MemoryRemote {
        inbound: in_tx,
        outbound: out_rx,
        connected_url,
    };
    (factory, remote)
}

impl TransportFactory for MemoryTransportFactory {
    fn connect(&self, url: &str, _opts: &TransportOptions) -> Result<Connection> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| MinaraiError::Internal("memory transport lock poisoned".into()))?
            .take()
            .ok_or_else(|| MinaraiError::Transport("memory transport already connected".into()))?;
        if let Ok(mut slot) = self.connected_url.lock() {
            *slot = Some(url.to_string());
        }
        Ok(conn)
    }
}

impl MemoryRemote {
    /// Deliver an event to the session as if the server sent it.
    pub fn push(&self, name: &str, payload: Option<Value>) -> Result<()> {
        self.inbound
            .send(WireEvent::new(name, payload))
            .map_err(|_| MinaraiError::Closed)
    }

    /// Next event the session emitted. `None` once every handle is dropped.
    pub async fn next_emitted(&mut self) -> Option<WireEvent> {
        self.outbound.recv().await
    }

    /// Next emitted event if one is already queued.
    pub fn try_next_emitted(&mut self) -> Option<WireEvent> {
        self.outbound.try_recv().ok()
    }

    /// Url the session connected with.
    pub fn connected_url(&self) -> Option<String> {
        self.connected_url.lock().ok().and_then(|u| u.clone())
    }
}
