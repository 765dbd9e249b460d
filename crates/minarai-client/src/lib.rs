//! minarai session client library.
//!
//! Wires a realtime transport, the identity-reconciling session, the local
//! event stream, and the attachment uploader into one client. The binary
//! (`main.rs`) and the integration tests consume it.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod log;
pub mod session;
pub mod transport;
pub mod upload;

pub use session::{ClientOptions, SendOptions, SessionClient};
pub use transport::{Connection, Transport, TransportFactory, TransportOptions, WireEvent};
pub use upload::{Attachment, HttpUploader, UploadForm, UploadOptions, Uploader};
