//! minarai core: transport-agnostic session protocol primitives and errors.
//!
//! This crate defines the identity tuple, the outbound envelope format, the
//! inbound/local event unions, and the attachment upload result shapes shared
//! by the session client and its tooling. It carries no transport or runtime
//! dependencies so the protocol rules can be tested in isolation.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `MinaraiError`/`Result` so a malformed
//! server payload never takes the client process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, MinaraiError, Result};
