//! Error taxonomy for the KidsGPT client.
//!
//! Three transport-level failure classes (network, HTTP status, decode) plus
//! the authentication failures the UI needs to tell apart. The mapping from
//! status code to [`AuthError`] is a fixed table per endpoint, applied in the
//! endpoint wrappers; nothing is inferred from free-text error bodies.

use thiserror::Error;

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Timeout or connectivity failure; the request never produced a status.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The backend answered outside 200-299.
    #[error("server returned {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Http {
        /// HTTP status code.
        status: u16,
        /// `detail` field of the error body, when the backend sent one.
        detail: Option<String>,
    },

    /// The response body did not match the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// Authentication failure with a known meaning.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Authentication failures, mapped from specific HTTP status codes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No child profile matches the entered PIN (kid-login 404).
    #[error("no profile matches that PIN")]
    InvalidPin,

    /// No account matches the credentials (login 404).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account or child profile has been deactivated (403).
    #[error("account is deactivated")]
    AccountInactive,

    /// Bearer token was rejected and could not be refreshed (401).
    #[error("session expired")]
    TokenExpired,

    /// The email is already registered, or an admin already exists (400).
    #[error("already registered")]
    AlreadyRegistered,

    /// The child hit today's message limit (chat 429).
    #[error("daily message limit reached")]
    MessageLimitReached,
}

impl ApiError {
    /// Remap HTTP status errors through a fixed per-endpoint table.
    ///
    /// Non-`Http` errors and unlisted statuses pass through unchanged.
    #[must_use]
    pub fn map_status(self, table: &[(u16, AuthError)]) -> Self {
        match self {
            Self::Http { status, detail } => table
                .iter()
                .find(|(code, _)| *code == status)
                .map_or(Self::Http { status, detail }, |&(_, auth)| Self::Auth(auth)),
            other => other,
        }
    }

    /// Fixed user-visible message for this error.
    ///
    /// The UI layer shows these verbatim; they are deliberately not derived
    /// from whatever text the backend put in the response body.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) => "Connection failed. Check your internet and try again.",
            Self::Auth(auth) => auth.user_message(),
            Self::Http { .. } | Self::Decode(_) => "Something went wrong. Please try again.",
        }
    }
}

impl AuthError {
    /// Fixed user-visible message for this failure.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::InvalidPin => "That PIN doesn't match any profile. Ask a parent to check it.",
            Self::InvalidCredentials => "Invalid email or password.",
            Self::AccountInactive => "This account has been deactivated.",
            Self::TokenExpired => "Your session expired. Please log in again.",
            Self::AlreadyRegistered => "An account with this email already exists.",
            Self::MessageLimitReached => "You've used all your messages for today. See you tomorrow!",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status_hits_table() {
        let err = ApiError::Http {
            status: 404,
            detail: None,
        };
        let mapped = err.map_status(&[(404, AuthError::InvalidPin)]);
        assert!(matches!(mapped, ApiError::Auth(AuthError::InvalidPin)));
    }

    #[test]
    fn test_map_status_passes_through_unlisted() {
        let err = ApiError::Http {
            status: 500,
            detail: Some("boom".to_string()),
        };
        let mapped = err.map_status(&[(404, AuthError::InvalidPin)]);
        assert!(matches!(mapped, ApiError::Http { status: 500, .. }));
    }

    #[test]
    fn test_map_status_ignores_non_http() {
        let err = ApiError::Decode("bad json".to_string());
        let mapped = err.map_status(&[(404, AuthError::InvalidPin)]);
        assert!(matches!(mapped, ApiError::Decode(_)));
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ApiError::Http {
            status: 400,
            detail: Some("Email already registered".to_string()),
        };
        assert_eq!(err.to_string(), "server returned 400: Email already registered");

        let err = ApiError::Http {
            status: 502,
            detail: None,
        };
        assert_eq!(err.to_string(), "server returned 502");
    }

    #[test]
    fn test_user_messages_are_distinguishable() {
        let msgs = [
            ApiError::Auth(AuthError::InvalidPin).user_message(),
            ApiError::Auth(AuthError::AccountInactive).user_message(),
            ApiError::Decode("x".to_string()).user_message(),
        ];
        assert_eq!(
            msgs.len(),
            msgs.iter().collect::<std::collections::HashSet<_>>().len()
        );
    }
}
