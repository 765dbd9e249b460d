//! Session client: identity reconciliation, envelopes, and event republishing.
//!
//! One `SessionClient` owns one transport connection and the identity tuple.
//! Outbound calls build a fresh envelope from the identity held at call time;
//! the inbound task is the only writer of that identity after construction.

mod client;
mod inbound;
mod options;

pub use client::{SessionClient, EVENT_CAPACITY};
pub use options::{ClientOptions, SendOptions, DEFAULT_LANG, DEFAULT_SEND_LANG};
