//! Client/session identity tuple.
//!
//! `applicationId` is fixed by the caller. `clientId`, `userId` and `deviceId`
//! start from caller input (or a generated device id) and are overwritten by
//! the server's `joined` acknowledgment.
//!
//! An ack always decides `clientId` and `userId`: absent or null clears them.
//! `applicationId` and `deviceId` are never cleared; an ack that omits them
//! keeps the held values.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{MinaraiError, Result};

/// The four-field identity sent in every envelope head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub application_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub device_id: String,
}

/// A `joined` payload as sent by the server. Every field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinAck {
    #[serde(default, deserialize_with = "de_opt_id")]
    application_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    client_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    user_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    device_id: Option<String>,
}

impl Identity {
    /// Build the initial identity. A missing device id is derived from the
    /// application id and `now_ms`.
    pub fn new(
        application_id: impl Into<String>,
        client_id: Option<String>,
        user_id: Option<String>,
        device_id: Option<String>,
        now_ms: u64,
    ) -> Self {
        let application_id = application_id.into();
        let device_id = device_id
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| default_device_id(&application_id, now_ms));
        Self {
            application_id,
            client_id,
            user_id,
            device_id,
        }
    }

    /// Apply a `joined` payload.
    ///
    /// Unknown fields are ignored; ids may be strings or numbers. A payload
    /// that is not an object, or carries an id of another type, is rejected
    /// and `self` is left untouched.
    pub fn apply_join_ack(&mut self, payload: &Value) -> Result<()> {
        let ack = JoinAck::deserialize(payload)
            .map_err(|e| MinaraiError::BadPayload(format!("invalid joined payload: {e}")))?;

        if let Some(app) = ack.application_id.filter(|a| !a.is_empty()) {
            self.application_id = app;
        }
        if let Some(device) = ack.device_id.filter(|d| !d.is_empty()) {
            self.device_id = device;
        }
        self.client_id = ack.client_id;
        self.user_id = ack.user_id;
        Ok(())
    }

    /// Payload for the `join-as-client` handshake.
    pub fn join_request(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The four fields concatenated, absent ones as empty strings.
    pub fn correlation_prefix(&self) -> String {
        format!(
            "{}{}{}{}",
            self.application_id,
            self.client_id.as_deref().unwrap_or_default(),
            self.user_id.as_deref().unwrap_or_default(),
            self.device_id
        )
    }

    /// Multipart form fields in wire order.
    pub fn form_fields(&self) -> [(&'static str, String); 4] {
        [
            ("applicationId", self.application_id.clone()),
            ("clientId", self.client_id.clone().unwrap_or_default()),
            ("userId", self.user_id.clone().unwrap_or_default()),
            ("deviceId", self.device_id.clone()),
        ]
    }

    /// Drop the server-assigned session part (explicit local teardown).
    pub fn reset_session(&mut self) {
        self.client_id = None;
        self.user_id = None;
    }
}

/// `device_id_<applicationId>_<millis>`.
pub fn default_device_id(application_id: &str, now_ms: u64) -> String {
    format!("device_id_{application_id}_{now_ms}")
}

fn id_from_value(v: Value) -> std::result::Result<Option<String>, String> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(format!("identity field must be a string or number, got {other}")),
    }
}

fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    let v = Value::deserialize(d)?;
    id_from_value(v).map_err(D::Error::custom)
}
