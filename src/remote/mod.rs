//! Remote surface store client.
//!
//! # Module Structure
//!
//! - `mod.rs` - `RemoteClient` transport: URLs, bearer auth, status bands (this file)
//! - `auth` - sign-in, registration, credential injection
//! - `surface` - `SurfaceRegistrar` (create + uid resolution)
//! - `stroke` - `StrokeDispatcher` (send + read back)
//! - `error` - `SyncError` taxonomy
//!
//! One `RemoteClient` is constructed per process and shared through `Arc`;
//! credentials live inside it, never in a global.

pub mod auth;
pub mod error;
pub mod stroke;
pub mod surface;

#[cfg(test)]
pub(crate) mod stub;

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::SyncConfig;

pub use auth::{Credentials, describe_sign_in_error};
pub use error::{ErrorKind, Result, SyncError};
pub use stroke::StrokeDispatcher;
pub use surface::SurfaceRegistrar;

/// Whether a request carries the bound bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Bearer,
    None,
}

/// Thin HTTP transport for the remote surface store.
pub struct RemoteClient {
    http: Client,
    /// Always ends with `/` so relative joins append instead of replace.
    base: Url,
    sign_in_url: Url,
    api_key: String,
    /// Attribution used when the sign-in response has no display name.
    default_name: String,
    credentials: ArcSwapOption<Credentials>,
}

impl RemoteClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: normalize_base(base_url)?,
            sign_in_url: Url::parse(auth::DEFAULT_SIGN_IN_URL)?,
            api_key: String::new(),
            default_name: "strokesync".to_string(),
            credentials: ArcSwapOption::empty(),
        })
    }

    /// Build from the loaded configuration.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Ok(Self::new(
            &config.remote.base_url,
            Duration::from_secs(config.remote.timeout_secs),
        )?
        .with_identity(&config.auth.sign_in_url, &config.auth.api_key)?
        .with_display_name(&config.client.display_name))
    }

    /// Set the identity provider endpoint and its API key.
    pub fn with_identity(mut self, sign_in_url: &str, api_key: &str) -> Result<Self> {
        self.sign_in_url = Url::parse(sign_in_url)?;
        self.api_key = api_key.to_string();
        Ok(self)
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.default_name = name.to_string();
        self
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Bound credential, or `SyncError::Auth`.
    pub fn credentials(&self) -> Result<Arc<Credentials>> {
        self.credentials
            .load_full()
            .ok_or_else(|| SyncError::Auth("sign in first".into()))
    }

    pub fn set_credentials(&self, credentials: Credentials) {
        self.credentials.store(Some(Arc::new(credentials)));
    }

    pub fn clear_credentials(&self) {
        self.credentials.store(None);
    }

    pub fn is_signed_in(&self) -> bool {
        self.credentials.load().is_some()
    }

    /// Attribution name: signed-in display name, else the configured default.
    pub fn display_name(&self) -> String {
        self.credentials
            .load_full()
            .and_then(|c| c.display_name.clone())
            .unwrap_or_else(|| self.default_name.clone())
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Resolve a store-relative path (`surface/all`) against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// Append `segments` to the base URL, percent-encoding each one.
    ///
    /// Use this when a segment comes from user input: `/`, `?` and `#`
    /// inside it stay part of that segment.
    pub fn endpoint_segments(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Authenticated GET, decoding the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_json_at(self.endpoint(path)?).await
    }

    /// Authenticated GET of an already resolved URL.
    pub async fn get_json_at<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let request = self.authorize(self.http.get(url))?;
        let body = self.execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POST a JSON body to a store path, returning the raw response text.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        auth: Auth,
    ) -> Result<String> {
        let mut request = self.http.post(self.endpoint(path)?).json(body);
        if auth == Auth::Bearer {
            request = self.authorize(request)?;
        }
        self.execute(request).await
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let credentials = self.credentials()?;
        Ok(request.bearer_auth(&credentials.id_token))
    }

    /// Send and enforce the 2xx band; other statuses carry the raw body.
    async fn execute(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            crate::debug!("http"; "{} -> {}", status, body);
            return Err(SyncError::Http {
                status: status.as_u16(),
                body: if body.is_empty() { "<no body>".into() } else { body },
            });
        }
        Ok(body)
    }
}

/// Parse the base URL and make sure its path ends with `/`.
fn normalize_base(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
