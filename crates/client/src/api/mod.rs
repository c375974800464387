//! Typed REST client for the KidsGPT backend API.
//!
//! # Architecture
//!
//! - One clone-cheap [`ApiClient`] (`Arc` inner) shared by the whole app
//! - JSON in, JSON out; wire field names are `snake_case`, matching the
//!   structs in [`types`]
//! - Protected endpoints get an `Authorization: Bearer <token>` header;
//!   bootstrap endpoints (kid PIN login, legacy login/register, create-admin)
//!   go out bare
//! - A 401 on a protected call triggers exactly one token refresh through the
//!   injected [`TokenSource`], then exactly one retry; if the refresh fails,
//!   the original 401 is surfaced unchanged
//!
//! The bearer token lives inside the client but is writable only through the
//! narrow `set_bearer_token`/`clear_bearer_token` accessors, which the auth
//! session manager alone calls. Endpoint wrappers live in sibling modules
//! ([`auth`], [`children`], [`chat`], [`admin`]) as `impl ApiClient` blocks.

mod admin;
mod auth;
mod chat;
mod children;
pub mod types;

pub use types::*;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::error::{ApiError, AuthError};

/// Failure reported by a [`TokenSource`] refresh.
#[derive(Debug, Error)]
#[error("token refresh failed: {0}")]
pub struct TokenSourceError(pub String);

/// Source of fresh bearer tokens.
///
/// The backend does not mint its own tokens; it validates tokens issued by an
/// external identity provider. This seam lets the app plug in whichever
/// provider it uses (and lets tests plug in a fake) without the client
/// knowing anything beyond "give me a new token".
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtain a fresh bearer token, forcing renewal if the provider caches.
    async fn refresh(&self) -> Result<SecretString, TokenSourceError>;
}

/// Whether an endpoint carries the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Bootstrap endpoint; no Authorization header.
    Public,
    /// Authorization header attached; 401 triggers refresh-and-retry.
    Protected,
}

/// Client for the KidsGPT backend REST API.
///
/// The only component that knows the base URL and wire format. Cheap to
/// clone; all clones share the same bearer token state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    bearer: RwLock<Option<SecretString>>,
    token_source: RwLock<Option<Arc<dyn TokenSource>>>,
}

/// FastAPI-style error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed (TLS
    /// backend initialization failure).
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                bearer: RwLock::new(None),
                token_source: RwLock::new(None),
            }),
        }
    }

    /// Install the source used to refresh expired bearer tokens.
    pub fn set_token_source(&self, source: Arc<dyn TokenSource>) {
        *self.inner.token_source.write() = Some(source);
    }

    /// Replace the current bearer token.
    ///
    /// Called by the auth session manager only; nothing else writes token
    /// state.
    pub fn set_bearer_token(&self, token: SecretString) {
        *self.inner.bearer.write() = Some(token);
    }

    /// Drop the current bearer token. Subsequent requests go out without an
    /// Authorization header.
    pub fn clear_bearer_token(&self) {
        *self.inner.bearer.write() = None;
    }

    /// Whether a bearer token is currently held.
    #[must_use]
    pub fn has_bearer_token(&self) -> bool {
        self.inner.bearer.read().is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request plumbing
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, format!("{}{path}", self.inner.base_url))
    }

    fn attach_bearer(&self, builder: RequestBuilder, scope: Scope) -> RequestBuilder {
        if scope == Scope::Protected
            && let Some(token) = self.inner.bearer.read().as_ref()
        {
            return builder.bearer_auth(token.expose_secret());
        }
        builder
    }

    /// Send a request and decode a JSON body.
    ///
    /// On a protected call, a 401 response triggers a single refresh through
    /// the token source and a single retry; a 401 surfacing past this point
    /// becomes [`AuthError::TokenExpired`].
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        scope: Scope,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(builder, scope).await?;
        let result = Self::decode(response).await;
        if scope == Scope::Protected {
            return result.map_err(|e| e.map_status(&[(401, AuthError::TokenExpired)]));
        }
        result
    }

    /// Send a request expecting an empty (or ignorable) success body.
    pub(crate) async fn execute_no_content(
        &self,
        builder: RequestBuilder,
        scope: Scope,
    ) -> Result<(), ApiError> {
        let response = self.dispatch(builder, scope).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let err = Self::error_from(response).await;
        if scope == Scope::Protected {
            return Err(err.map_status(&[(401, AuthError::TokenExpired)]));
        }
        Err(err)
    }

    async fn dispatch(&self, builder: RequestBuilder, scope: Scope) -> Result<Response, ApiError> {
        // Clone before the bearer is attached so the retry picks up the
        // refreshed token instead of re-sending the stale one.
        let retry = builder.try_clone();

        let response = self.attach_bearer(builder, scope).send().await?;

        if scope == Scope::Protected && response.status() == StatusCode::UNAUTHORIZED {
            if let Some(retry) = retry
                && self.refresh_bearer().await
            {
                tracing::debug!("retrying request with refreshed token");
                return Ok(self.attach_bearer(retry, scope).send().await?);
            }
            // Refresh unavailable or failed: the original 401 stands.
        }

        Ok(response)
    }

    /// Attempt one token refresh. Returns whether a new token was installed.
    async fn refresh_bearer(&self) -> bool {
        let source = self.inner.token_source.read().clone();
        let Some(source) = source else {
            tracing::debug!("got 401 but no token source is installed");
            return false;
        };

        match source.refresh().await {
            Ok(token) => {
                self.set_bearer_token(token);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "bearer token refresh failed");
                false
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn error_from(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);
        ApiError::Http { status, detail }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("bearer", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        let config = ClientConfig::new("http://localhost:8000/api/", "/tmp/kidsgpt-test").unwrap();
        ApiClient::new(&config)
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = client();
        assert_eq!(client.inner.base_url, "http://localhost:8000/api");
    }

    #[test]
    fn test_bearer_token_accessors() {
        let client = client();
        assert!(!client.has_bearer_token());

        client.set_bearer_token(SecretString::from("tok-1"));
        assert!(client.has_bearer_token());

        client.clear_bearer_token();
        assert!(!client.has_bearer_token());
    }

    #[test]
    fn test_clones_share_token_state() {
        let a = client();
        let b = a.clone();
        a.set_bearer_token(SecretString::from("tok-1"));
        assert!(b.has_bearer_token());
    }

    #[test]
    fn test_debug_redacts_bearer() {
        let client = client();
        client.set_bearer_token(SecretString::from("super-secret-token"));
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
