//! Admin oversight endpoints.
//!
//! Aggregates are read-mostly and refetched per view; nothing here is cached
//! client-side.

use reqwest::Method;
use tracing::instrument;

use kidsgpt_core::{Email, SubscriptionTier, UserId};

use crate::error::{ApiError, AuthError};

use super::types::{AdminStats, FlaggedConversation, SystemConfig, User, UserListItem};
use super::{ApiClient, Scope};

impl ApiClient {
    /// Fetch platform-wide aggregates for the admin dashboard.
    ///
    /// # Errors
    ///
    /// `Http {status: 403}` when the caller is not an admin.
    #[instrument(skip(self))]
    pub async fn admin_stats(&self, admin_id: UserId) -> Result<AdminStats, ApiError> {
        let builder = self
            .request(Method::GET, "/admin/stats")
            .query(&[("admin_id", admin_id.as_i64())]);
        self.execute(builder, Scope::Protected).await
    }

    /// List all users with their aggregate stats.
    ///
    /// # Errors
    ///
    /// `Http {status: 403}` when the caller is not an admin.
    #[instrument(skip(self))]
    pub async fn admin_users(
        &self,
        admin_id: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<UserListItem>, ApiError> {
        let builder = self.request(Method::GET, "/admin/users").query(&[
            ("admin_id", admin_id.as_i64().to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ]);
        self.execute(builder, Scope::Protected).await
    }

    /// Fetch the platform configuration.
    ///
    /// # Errors
    ///
    /// `Http {status: 403}` when the caller is not an admin.
    #[instrument(skip(self))]
    pub async fn system_config(&self, admin_id: UserId) -> Result<SystemConfig, ApiError> {
        let builder = self
            .request(Method::GET, "/admin/config")
            .query(&[("admin_id", admin_id.as_i64())]);
        self.execute(builder, Scope::Protected).await
    }

    /// Replace the platform configuration.
    ///
    /// # Errors
    ///
    /// `Http {status: 403}` when the caller is not an admin.
    #[instrument(skip(self, config))]
    pub async fn update_system_config(
        &self,
        admin_id: UserId,
        config: &SystemConfig,
    ) -> Result<SystemConfig, ApiError> {
        let builder = self
            .request(Method::PATCH, "/admin/config")
            .query(&[("admin_id", admin_id.as_i64())])
            .json(config);
        self.execute(builder, Scope::Protected).await
    }

    /// List conversations flagged by content moderation for review.
    ///
    /// # Errors
    ///
    /// `Http {status: 403}` when the caller is not an admin.
    #[instrument(skip(self))]
    pub async fn flagged_conversations(
        &self,
        admin_id: UserId,
        limit: u32,
    ) -> Result<Vec<FlaggedConversation>, ApiError> {
        let builder = self
            .request(Method::GET, "/admin/flagged-conversations")
            .query(&[
                ("admin_id", admin_id.as_i64().to_string()),
                ("limit", limit.to_string()),
            ]);
        self.execute(builder, Scope::Protected).await
    }

    /// Change a user's subscription tier.
    ///
    /// # Errors
    ///
    /// `Http {status: 404}` for an unknown user, `Http {status: 403}` when
    /// the caller is not an admin.
    #[instrument(skip(self))]
    pub async fn set_subscription_tier(
        &self,
        admin_id: UserId,
        user_id: UserId,
        tier: SubscriptionTier,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PATCH, &format!("/admin/users/{user_id}/subscription"))
            .query(&[
                ("admin_id", admin_id.as_i64().to_string()),
                ("tier", tier.to_string()),
            ]);
        self.execute_no_content(builder, Scope::Protected).await
    }

    /// Flip a user between active and deactivated.
    ///
    /// # Errors
    ///
    /// `Http {status: 404}` for an unknown user, `Http {status: 403}` when
    /// the caller is not an admin.
    #[instrument(skip(self))]
    pub async fn toggle_user_active(
        &self,
        admin_id: UserId,
        user_id: UserId,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PATCH, &format!("/admin/users/{user_id}/toggle-active"))
            .query(&[("admin_id", admin_id.as_i64())]);
        self.execute_no_content(builder, Scope::Protected).await
    }

    /// Bootstrap the first admin account. No auth required; the backend
    /// rejects the call once any admin exists.
    ///
    /// # Errors
    ///
    /// [`AuthError::AlreadyRegistered`] once an admin account exists.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn create_admin(&self, email: &Email, display_name: &str) -> Result<User, ApiError> {
        let builder = self
            .request(Method::POST, "/admin/create-admin")
            .query(&[("email", email.as_str()), ("display_name", display_name)]);
        self.execute(builder, Scope::Public)
            .await
            .map_err(|e| e.map_status(&[(400, AuthError::AlreadyRegistered)]))
    }
}
