//! Session logging sink.
//!
//! Thin wrapper over `tracing` carrying the `{debug, silent}` flags a client
//! is built with. `silent` mutes everything; `debug` enables debug lines and
//! payload dumps.

use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Logger {
    debug: bool,
    silent: bool,
}

impl Logger {
    pub fn new(debug: bool, silent: bool) -> Self {
        Self { debug, silent }
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug && !self.silent
    }

    pub fn debug(&self, msg: &str) {
        if self.debug_enabled() {
            tracing::debug!(target: "minarai", "{msg}");
        }
    }

    pub fn info(&self, msg: &str) {
        if !self.silent {
            tracing::info!(target: "minarai", "{msg}");
        }
    }

    pub fn warn(&self, msg: &str) {
        if !self.silent {
            tracing::warn!(target: "minarai", "{msg}");
        }
    }

    /// `EnvFilter` directive for a process whose `RUST_LOG` is unset.
    pub fn default_directive(&self) -> &'static str {
        if self.silent {
            "warn,minarai=off"
        } else if self.debug {
            "info,minarai=debug"
        } else {
            "info"
        }
    }

    /// Structured dump of an event or envelope.
    pub fn obj(&self, label: &str, payload: Option<&Value>) {
        if !self.debug_enabled() {
            return;
        }
        match payload {
            Some(v) => tracing::debug!(target: "minarai", label = %label, payload = %v, "obj"),
            None => tracing::debug!(target: "minarai", label = %label, "obj"),
        }
    }
}
