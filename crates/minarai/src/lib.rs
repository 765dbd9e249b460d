//! Top-level facade crate for minarai.
//!
//! Re-exports the protocol core and the session client so users can depend on a single crate.

pub mod core {
    pub use minarai_core::*;
}

pub mod client {
    pub use minarai_client::*;
}

pub use minarai_client::{ClientOptions, SendOptions, SessionClient};
