//! Attachment upload response and result shapes.
//!
//! The result keeps the server's conventions:
//! - `{ok: true, result: {url}}` when the server answered `message: "ok"`
//! - `{ok: true, error: {url}}` for any other message (still HTTP success)
//! - `{error: "url does not exist"}` when no url came back (no `ok` key)
//! - `{err}` when the HTTP call itself failed

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

/// Error text used when the upload response lacks a url.
pub const URL_MISSING: &str = "url does not exist";

/// Body returned by the upload endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Outcome of an attachment upload. Never an error for the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Server stored the file.
    Uploaded { url: String },
    /// HTTP success, but the server reported a non-"ok" message.
    Rejected { url: String },
    /// HTTP success without a url.
    MissingUrl,
    /// The HTTP call failed.
    Failed { err: String },
}

impl UploadOutcome {
    /// Fold a successful HTTP response. `query` pairs are appended to the
    /// returned url as `?k=v&k=v`.
    pub fn from_response(resp: UploadResponse, query: &[(&str, &str)]) -> Self {
        let url = match resp.url {
            Some(u) if !u.is_empty() => u,
            _ => return UploadOutcome::MissingUrl,
        };
        let url = append_query(&url, query);
        if resp.message.as_deref() == Some("ok") {
            UploadOutcome::Uploaded { url }
        } else {
            UploadOutcome::Rejected { url }
        }
    }

    pub fn failed(err: impl ToString) -> Self {
        UploadOutcome::Failed { err: err.to_string() }
    }

    /// `true` only for `Uploaded`.
    pub fn is_uploaded(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded { .. })
    }

    /// Url of the stored file, if the server returned one.
    pub fn url(&self) -> Option<&str> {
        match self {
            UploadOutcome::Uploaded { url } | UploadOutcome::Rejected { url } => Some(url),
            _ => None,
        }
    }

    /// JSON rendering in the server's result conventions.
    pub fn to_json(&self) -> Value {
        match self {
            UploadOutcome::Uploaded { url } => json!({ "ok": true, "result": { "url": url } }),
            UploadOutcome::Rejected { url } => json!({ "ok": true, "error": { "url": url } }),
            UploadOutcome::MissingUrl => json!({ "error": URL_MISSING }),
            UploadOutcome::Failed { err } => json!({ "err": err }),
        }
    }
}

impl Serialize for UploadOutcome {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(s)
    }
}

/// Appends `?k=v&...` verbatim, percent-encoding keys and values.
pub fn append_query(url: &str, query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let qs = query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    tracing::trace!(%url, %qs, "augment upload url");
    format!("{url}?{qs}")
}
