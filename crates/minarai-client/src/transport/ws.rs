//! WebSocket transport (tokio-tungstenite).
//!
//! Responsibilities:
//! - Dial the realtime endpoint in a background task (connect is eager)
//! - Writer: drain the outbound queue into the socket
//! - Reader: decode frames once and forward events to the session
//! - Lifecycle: synthetic `connect` once open, `disconnect` once closed
//!
//! Reconnection is left to the caller; a closed transport stays closed.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use minarai_core::error::{MinaraiError, Result};
use minarai_core::protocol::append_query;

use crate::transport::codec::{decode, encode, Inbound};
use crate::transport::{Connection, Transport, TransportFactory, TransportOptions, WireEvent};

#[derive(Debug, Default, Clone)]
pub struct WsTransportFactory;

impl WsTransportFactory {
    pub fn new() -> Self {
        Self
    }
}

impl TransportFactory for WsTransportFactory {
    fn connect(&self, url: &str, opts: &TransportOptions) -> Result<Connection> {
        let target = build_url(url, opts);
        let rt = tokio::runtime::Handle::try_current()
            .map_err(|e| MinaraiError::Internal(format!("websocket transport needs a tokio runtime: {e}")))?;

        let (out_tx, out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<WireEvent>();

        rt.spawn(async move {
            if let Err(e) = run_socket(&target, out_rx, in_tx).await {
                tracing::warn!(url = %target, error = %e, "websocket transport stopped");
            }
        });

        Ok(Connection {
            handle: Arc::new(WsHandle { tx: out_tx }),
            inbound: in_rx,
        })
    }
}

struct WsHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl Transport for WsHandle {
    fn emit(&self, event: &str, payload: Option<Value>) -> Result<()> {
        let msg = encode(&WireEvent::new(event, payload))?;
        self.tx.send(msg).map_err(|_| MinaraiError::Closed)
    }
}

/// `url` + optional `path` + `?query`.
pub fn build_url(url: &str, opts: &TransportOptions) -> String {
    let mut target = url.to_string();
    if let Some(path) = opts.path.as_deref().filter(|p| !p.is_empty()) {
        target = format!(
            "{}/{}",
            target.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
    }
    let query: Vec<(&str, &str)> = opts
        .query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    append_query(&target, &query)
}

async fn run_socket(
    target: &str,
    mut out_rx: mpsc::UnboundedReceiver<Message>,
    in_tx: mpsc::UnboundedSender<WireEvent>,
) -> Result<()> {
    let (ws, _) = connect_async(target)
        .await
        .map_err(|e| MinaraiError::Transport(format!("connect failed: {e}")))?;
    tracing::info!(url = %target, "websocket connected");

    let (mut ws_tx, mut ws_rx) = ws.split();
    let _ = in_tx.send(WireEvent::new("connect", None));

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    // every handle dropped: local close
                    None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                match decode(msg) {
                    Ok(Inbound::Event(ev)) => {
                        if in_tx.send(ev).is_err() {
                            break;
                        }
                    }
                    Ok(Inbound::Ping(payload)) => {
                        let _ = ws_tx.send(Message::Pong(payload)).await;
                    }
                    Ok(Inbound::Pong) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping undecodable frame");
                    }
                }
            }
        }
    }

    tracing::info!(url = %target, "websocket closed");
    let _ = in_tx.send(WireEvent::new("disconnect", None));
    Ok(())
}
