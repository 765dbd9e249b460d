//! Event frame codec for the WebSocket transport.
//!
//! - Text frames carry one JSON `{"event": name, "data": payload?}`
//! - Binary frames are not part of the protocol and are rejected
//! - Ping/Pong/Close are surfaced for lifecycle management

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

use minarai_core::error::{MinaraiError, Result};

use crate::transport::WireEvent;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Frame {
    event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

#[derive(Debug)]
pub enum Inbound {
    Event(WireEvent),
    Ping(Vec<u8>),
    Pong,
    Close,
}

pub fn encode(ev: &WireEvent) -> Result<Message> {
    let frame = Frame {
        event: ev.name.clone(),
        data: ev.payload.clone(),
    };
    let s = serde_json::to_string(&frame)
        .map_err(|e| MinaraiError::BadPayload(format!("event encode failed: {e}")))?;
    Ok(Message::text(s))
}

pub fn decode_text(s: &str) -> Result<WireEvent> {
    let frame: Frame = serde_json::from_str(s)
        .map_err(|e| MinaraiError::BadPayload(format!("invalid event frame: {e}")))?;
    Ok(WireEvent::new(frame.event, frame.data))
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(_) => {
            let s = msg
                .to_text()
                .map_err(|e| MinaraiError::BadPayload(format!("text frame: {e}")))?;
            Ok(Inbound::Event(decode_text(s)?))
        }
        Message::Binary(_) => Err(MinaraiError::BadPayload("binary frames are not supported".into())),
        Message::Ping(v) => Ok(Inbound::Ping(v.to_vec())),
        Message::Pong(_) => Ok(Inbound::Pong),
        Message::Close(_) => Ok(Inbound::Close),
        Message::Frame(_) => Err(MinaraiError::BadPayload("raw frame".into())),
    }
}
