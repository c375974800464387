//! Authentication endpoints.

use reqwest::Method;
use secrecy::SecretString;
use tracing::instrument;

use kidsgpt_core::{Email, Pin, UserId};

use crate::error::{ApiError, AuthError};

use super::types::{IdTokenLoginRequest, KidLoginRequest, KidSession, RegisterRequest, User};
use super::{ApiClient, Scope};

impl ApiClient {
    /// Register a new parent account.
    ///
    /// # Errors
    ///
    /// [`AuthError::AlreadyRegistered`] if the email is taken.
    #[instrument(skip(self, display_name), fields(email = %email))]
    pub async fn register(
        &self,
        email: &Email,
        display_name: Option<&str>,
    ) -> Result<User, ApiError> {
        let body = RegisterRequest {
            email: email.clone(),
            display_name: display_name.map(str::to_owned),
        };
        let builder = self.request(Method::POST, "/auth/register").json(&body);
        self.execute(builder, Scope::Public)
            .await
            .map_err(|e| e.map_status(&[(400, AuthError::AlreadyRegistered)]))
    }

    /// Log in a parent or admin by email.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] for an unknown email,
    /// [`AuthError::AccountInactive`] for a deactivated account.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn login(&self, email: &Email) -> Result<User, ApiError> {
        let builder = self
            .request(Method::POST, "/auth/login")
            .query(&[("email", email.as_str())]);
        self.execute(builder, Scope::Public).await.map_err(|e| {
            e.map_status(&[
                (404, AuthError::InvalidCredentials),
                (403, AuthError::AccountInactive),
            ])
        })
    }

    /// Exchange an identity-provider ID token for the backend user record.
    ///
    /// The token doubles as the bearer credential for subsequent protected
    /// calls; the session manager installs it via
    /// [`ApiClient::set_bearer_token`] after this returns.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] if the backend rejects the token,
    /// [`AuthError::AccountInactive`] for a deactivated account.
    #[instrument(skip_all)]
    pub async fn login_with_id_token(
        &self,
        id_token: &SecretString,
        display_name: Option<&str>,
    ) -> Result<User, ApiError> {
        use secrecy::ExposeSecret;

        let body = IdTokenLoginRequest {
            id_token: id_token.expose_secret().to_owned(),
            display_name: display_name.map(str::to_owned),
        };
        let builder = self
            .request(Method::POST, "/auth/firebase-login")
            .json(&body);
        self.execute(builder, Scope::Public).await.map_err(|e| {
            e.map_status(&[
                (401, AuthError::InvalidCredentials),
                (403, AuthError::AccountInactive),
            ])
        })
    }

    /// Fetch the profile of the currently authenticated user.
    ///
    /// # Errors
    ///
    /// [`AuthError::TokenExpired`] if the bearer token was rejected and
    /// could not be refreshed.
    #[instrument(skip(self))]
    pub async fn me(&self, user_id: UserId) -> Result<User, ApiError> {
        let builder = self
            .request(Method::GET, "/auth/me")
            .query(&[("user_id", user_id.as_i64())]);
        self.execute(builder, Scope::Protected).await
    }

    /// Log a child in with their six-digit PIN.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidPin`] when no profile matches,
    /// [`AuthError::AccountInactive`] when the matching profile is
    /// deactivated.
    #[instrument(skip_all)]
    pub async fn kid_login(&self, pin: &Pin) -> Result<KidSession, ApiError> {
        let body = KidLoginRequest { pin: pin.clone() };
        let builder = self.request(Method::POST, "/auth/kid-login").json(&body);
        self.execute(builder, Scope::Public).await.map_err(|e| {
            e.map_status(&[
                (404, AuthError::InvalidPin),
                (403, AuthError::AccountInactive),
            ])
        })
    }
}
