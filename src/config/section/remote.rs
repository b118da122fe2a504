//! `[remote]`, `[auth]` and `[client]` sections.
//!
//! # Example
//!
//! ```toml
//! [remote]
//! base_url = "https://sfu-place-web-server.vercel.app"
//! timeout_secs = 30
//!
//! [auth]
//! api_key = "AIza..."          # Identity provider web API key
//! email = "ada@example.com"    # Used when --email is not given
//! password = "..."             # Used when --password is not given
//!
//! [client]
//! display_name = "strokesync"  # Attribution when the account has no name
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ConfigDiagnostics;
use crate::remote::auth::DEFAULT_SIGN_IN_URL;

pub const DEFAULT_BASE_URL: &str = "https://sfu-place-web-server.vercel.app";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Surface store root; routes are joined onto it.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_http_url("remote.base_url", &self.base_url, diag);
        if self.timeout_secs == 0 {
            diag.error("remote.timeout_secs", "must be greater than 0");
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub api_key: String,
    pub sign_in_url: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            sign_in_url: DEFAULT_SIGN_IN_URL.to_string(),
            email: None,
            password: None,
        }
    }
}

impl AuthConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_http_url("auth.sign_in_url", &self.sign_in_url, diag);
    }

    /// Email and password when both are known.
    pub fn password_login(&self) -> Option<(&str, &str)> {
        Some((self.email.as_deref()?, self.password.as_deref()?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub display_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            display_name: "strokesync".to_string(),
        }
    }
}

fn validate_http_url(field: &'static str, value: &str, diag: &mut ConfigDiagnostics) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => diag.error_with_hint(
            field,
            format!("unsupported scheme `{}`", url.scheme()),
            "use an http:// or https:// URL",
        ),
        Err(e) => diag.error(field, format!("invalid URL `{value}`: {e}")),
    }
}
