//! Client config loader.
//!
//! Parsing is strict (`deny_unknown_fields` throughout the schema). After
//! parsing, blank optional strings are treated as unset and endpoint urls are
//! checked against the schemes each transport speaks.

pub mod schema;

use std::fs;
use std::path::Path;

use minarai_core::error::{MinaraiError, Result};

pub use schema::{ClientConfig, IdentitySection, LoggingSection, RealtimeSection, UploadSection};

/// Used when no config path is given.
pub const DEFAULT_CONFIG_PATH: &str = "minarai.yaml";

const REALTIME_SCHEMES: &[&str] = &["ws://", "wss://"];
const UPLOAD_SCHEMES: &[&str] = &["http://", "https://"];

pub fn load_from_file(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| {
        MinaraiError::InvalidArgument(format!("read config {} failed: {e}", path.display()))
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ClientConfig> {
    let mut cfg: ClientConfig = serde_yaml::from_str(s)
        .map_err(|e| MinaraiError::InvalidArgument(format!("invalid yaml: {e}")))?;
    normalize(&mut cfg);
    cfg.validate()?;
    check_endpoints(&cfg)?;
    Ok(cfg)
}

/// `key: ""` means the same as leaving the key out.
fn normalize(cfg: &mut ClientConfig) {
    for slot in [
        &mut cfg.upload.base_url,
        &mut cfg.realtime.path,
        &mut cfg.identity.client_id,
        &mut cfg.identity.user_id,
        &mut cfg.identity.device_id,
        &mut cfg.identity.lang,
    ] {
        if slot.as_deref().is_some_and(|v| v.trim().is_empty()) {
            *slot = None;
        }
    }
}

fn check_endpoints(cfg: &ClientConfig) -> Result<()> {
    require_scheme("realtime.url", &cfg.realtime.url, REALTIME_SCHEMES)?;
    if let Some(base) = cfg.upload.base_url.as_deref() {
        require_scheme("upload.base_url", base, UPLOAD_SCHEMES)?;
    }
    Ok(())
}

fn require_scheme(key: &str, url: &str, schemes: &[&str]) -> Result<()> {
    let has_host = schemes
        .iter()
        .find_map(|s| url.strip_prefix(s))
        .is_some_and(|rest| !rest.is_empty());
    if has_host {
        return Ok(());
    }
    Err(MinaraiError::InvalidArgument(format!(
        "{key} must start with {} and name a host, got {url:?}",
        schemes.join(" or ")
    )))
}
