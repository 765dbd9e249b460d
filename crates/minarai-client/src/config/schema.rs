use std::collections::BTreeMap;

use serde::Deserialize;
use minarai_core::error::{MinaraiError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    pub realtime: RealtimeSection,

    #[serde(default)]
    pub upload: UploadSection,

    pub identity: IdentitySection,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MinaraiError::InvalidArgument(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        if self.identity.application_id.trim().is_empty() {
            return Err(MinaraiError::InvalidArgument(
                "identity.application_id must not be empty".into(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealtimeSection {
    pub url: String,

    /// Path appended to `url` when connecting.
    #[serde(default)]
    pub path: Option<String>,

    /// Extra query parameters for the connect request.
    #[serde(default)]
    pub query: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct UploadSection {
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentitySection {
    pub application_id: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub silent: bool,
}
