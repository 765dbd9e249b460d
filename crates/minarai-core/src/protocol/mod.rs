//! Session protocol modules.
//!
//! - Identity: the four-field tuple reconciled with the server on join.
//! - Envelope: outbound wire message (correlation id, head, body).
//! - Event: inbound transport events and the local republished stream.
//! - Upload: attachment upload response and result shapes.
//!
//! Everything here is pure: time is passed in, nothing touches a socket.

pub mod envelope;
pub mod event;
pub mod identity;
pub mod upload;

pub use envelope::{
    correlation_id, now_millis, Body, Envelope, EnvelopeHead, LogsQuery, OperationKind, SystemCommand,
};
pub use event::{republish, InboundEvent, SessionEvent, INBOUND_EVENTS};
pub use identity::Identity;
pub use upload::{append_query, UploadOutcome, UploadResponse, URL_MISSING};
