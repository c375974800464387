//! KidsGPT client library.
//!
//! Everything a KidsGPT front end needs that is not view code:
//!
//! - [`api`] - Typed REST client for the backend API. The only module that
//!   knows the base URL and wire format. Attaches bearer tokens, maps HTTP
//!   failures to a typed error taxonomy, and retries exactly once on token
//!   expiry.
//! - [`session`] - Session handling: durable [`session::TokenStore`], the
//!   [`session::AuthSessionManager`] state machine (the single source of
//!   truth for "who is using the app right now"), and the pure
//!   [`session::router`] that maps session state to reachable views.
//! - [`config`] - Environment-based configuration.
//! - [`error`] - The error taxonomy shared by both layers.
//!
//! # Example
//!
//! ```rust,ignore
//! use kidsgpt_client::{ApiClient, ClientConfig};
//! use kidsgpt_client::session::{AuthSessionManager, TokenStore};
//! use kidsgpt_core::Pin;
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::new(&config);
//! let store = TokenStore::new(&config.state_dir);
//! let sessions = AuthSessionManager::new(api.clone(), store);
//!
//! let kid = sessions.login_as_kid(&Pin::parse("482916")?).await?;
//! let reply = api.send_message(kid.child_id, "why is the sky blue?", None).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod session;

pub use api::{ApiClient, TokenSource, TokenSourceError};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, AuthError};
pub use session::{AuthSessionManager, SessionError, SessionState, TokenStore};
