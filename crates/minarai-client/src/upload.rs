//! Attachment upload over HTTP.
//!
//! The session builds an `UploadForm` from its identity and hands it to an
//! `Uploader`. `HttpUploader` posts it as multipart with reqwest; any
//! transport-level failure (connect error, non-2xx status, undecodable body)
//! comes back as `Err` and is folded into `UploadOutcome::Failed` upstream.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use minarai_core::error::{MinaraiError, Result};
use minarai_core::protocol::{Identity, UploadResponse};

/// Fixed path segment appended to the upload base url.
pub const UPLOAD_PATH: &str = "upload-image";

/// `<base without one trailing slash>/upload-image`.
pub fn upload_endpoint(base_url: &str) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    format!("{base}/{UPLOAD_PATH}")
}

/// A file to upload.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a file from disk; the file name is the path's last component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| MinaraiError::InvalidArgument(format!("read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Ok(Self::new(file_name, data))
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Serialized into the `params` form field when present.
    pub extra: Option<Value>,
}

/// Multipart form contents, independent of the HTTP stack.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub fields: Vec<(&'static str, String)>,
    pub file: Attachment,
}

impl UploadForm {
    pub fn build(identity: &Identity, file: Attachment, opts: &UploadOptions) -> Result<Self> {
        let mut fields = identity.form_fields().to_vec();
        if let Some(extra) = opts.extra.as_ref().filter(|v| !v.is_null()) {
            fields.push(("params", serde_json::to_string(extra)?));
        }
        Ok(Self { fields, file })
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// POST capability used for attachment upload.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn post(&self, endpoint: &str, form: UploadForm) -> Result<UploadResponse>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpUploader {
    client: reqwest::Client,
}

impl HttpUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn post(&self, endpoint: &str, form: UploadForm) -> Result<UploadResponse> {
        let mut part = Part::bytes(form.file.data.to_vec()).file_name(form.file.file_name.clone());
        if let Some(ct) = form.file.content_type.as_deref() {
            part = part
                .mime_str(ct)
                .map_err(|e| MinaraiError::InvalidArgument(format!("content type {ct}: {e}")))?;
        }

        let mut multipart = Form::new();
        for (k, v) in form.fields {
            multipart = multipart.text(k, v);
        }
        multipart = multipart.part("file", part);

        let res = self
            .client
            .post(endpoint)
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| MinaraiError::Transport(format!("upload request failed: {e}")))?
            .error_for_status()
            .map_err(|e| MinaraiError::Transport(format!("upload rejected: {e}")))?;

        res.json::<UploadResponse>()
            .await
            .map_err(|e| MinaraiError::Transport(format!("upload response: {e}")))
    }
}
