use serde_json::Value;

use crate::config::ClientConfig;
use crate::transport::TransportOptions;

/// Language stored on the client when none is configured.
pub const DEFAULT_LANG: &str = "ja";
/// Language put in message heads when `send` gets none.
pub const DEFAULT_SEND_LANG: &str = "ja-JP";

/// Construction input for `SessionClient`.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub realtime_url: String,
    pub transport: TransportOptions,
    pub upload_base_url: Option<String>,
    pub application_id: String,
    pub client_id: Option<String>,
    pub user_id: Option<String>,
    pub device_id: Option<String>,
    pub lang: Option<String>,
    pub debug: bool,
    pub silent: bool,
    /// Bound of the `subscribe` stream; `EVENT_CAPACITY` when unset.
    pub event_capacity: Option<usize>,
}

impl ClientOptions {
    pub fn new(realtime_url: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            realtime_url: realtime_url.into(),
            application_id: application_id.into(),
            ..Default::default()
        }
    }

    pub fn from_config(cfg: &ClientConfig) -> Self {
        Self {
            realtime_url: cfg.realtime.url.clone(),
            transport: TransportOptions {
                path: cfg.realtime.path.clone(),
                query: cfg.realtime.query.clone(),
            },
            upload_base_url: cfg.upload.base_url.clone(),
            application_id: cfg.identity.application_id.clone(),
            client_id: cfg.identity.client_id.clone(),
            user_id: cfg.identity.user_id.clone(),
            device_id: cfg.identity.device_id.clone(),
            lang: cfg.identity.lang.clone(),
            debug: cfg.logging.debug,
            silent: cfg.logging.silent,
            event_capacity: None,
        }
    }

    pub fn with_upload_base_url(mut self, url: impl Into<String>) -> Self {
        self.upload_base_url = Some(url.into());
        self
    }

    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    pub fn with_device_id(mut self, id: impl Into<String>) -> Self {
        self.device_id = Some(id.into());
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }
}

/// Options for `SessionClient::send`.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub lang: Option<String>,
    pub position: Option<Value>,
    pub extra: Option<Value>,
}
