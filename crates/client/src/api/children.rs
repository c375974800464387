//! Child profile endpoints.
//!
//! All calls are parent-scoped: the backend checks that `parent_id` owns the
//! child in question, so cross-family reads fail with a 404.

use reqwest::Method;
use tracing::instrument;

use kidsgpt_core::{ChildId, UserId};

use crate::error::ApiError;

use super::types::{Child, ChildUpdate, ChildWithStats, NewChild};
use super::{ApiClient, Scope};

impl ApiClient {
    /// List all of a parent's children with usage stats.
    ///
    /// # Errors
    ///
    /// Surfaces transport and HTTP errors from the backend.
    #[instrument(skip(self))]
    pub async fn list_children(&self, parent_id: UserId) -> Result<Vec<ChildWithStats>, ApiError> {
        let builder = self
            .request(Method::GET, "/children")
            .query(&[("parent_id", parent_id.as_i64())]);
        self.execute(builder, Scope::Protected).await
    }

    /// Create a child profile. The backend generates the login PIN.
    ///
    /// # Errors
    ///
    /// `Http {status: 403}` when the subscription tier's child limit is
    /// reached.
    #[instrument(skip(self, child), fields(name = %child.name))]
    pub async fn create_child(&self, parent_id: UserId, child: &NewChild) -> Result<Child, ApiError> {
        let builder = self
            .request(Method::POST, "/children")
            .query(&[("parent_id", parent_id.as_i64())])
            .json(child);
        self.execute(builder, Scope::Protected).await
    }

    /// Fetch one child with usage stats.
    ///
    /// # Errors
    ///
    /// `Http {status: 404}` when the child does not exist or belongs to a
    /// different parent.
    #[instrument(skip(self))]
    pub async fn get_child(
        &self,
        child_id: ChildId,
        parent_id: UserId,
    ) -> Result<ChildWithStats, ApiError> {
        let builder = self
            .request(Method::GET, &format!("/children/{child_id}"))
            .query(&[("parent_id", parent_id.as_i64())]);
        self.execute(builder, Scope::Protected).await
    }

    /// Apply a partial update to a child profile.
    ///
    /// # Errors
    ///
    /// `Http {status: 404}` when the child does not exist or belongs to a
    /// different parent.
    #[instrument(skip(self, update))]
    pub async fn update_child(
        &self,
        child_id: ChildId,
        parent_id: UserId,
        update: &ChildUpdate,
    ) -> Result<Child, ApiError> {
        let builder = self
            .request(Method::PATCH, &format!("/children/{child_id}"))
            .query(&[("parent_id", parent_id.as_i64())])
            .json(update);
        self.execute(builder, Scope::Protected).await
    }

    /// Delete a child profile and its conversation history.
    ///
    /// # Errors
    ///
    /// `Http {status: 404}` when the child does not exist or belongs to a
    /// different parent.
    #[instrument(skip(self))]
    pub async fn delete_child(&self, child_id: ChildId, parent_id: UserId) -> Result<(), ApiError> {
        let builder = self
            .request(Method::DELETE, &format!("/children/{child_id}"))
            .query(&[("parent_id", parent_id.as_i64())]);
        self.execute_no_content(builder, Scope::Protected).await
    }

    /// Issue a fresh login PIN for a child, invalidating the old one.
    ///
    /// # Errors
    ///
    /// `Http {status: 404}` when the child does not exist or belongs to a
    /// different parent.
    #[instrument(skip(self))]
    pub async fn regenerate_pin(
        &self,
        child_id: ChildId,
        parent_id: UserId,
    ) -> Result<Child, ApiError> {
        let builder = self
            .request(Method::POST, &format!("/children/{child_id}/regenerate-pin"))
            .query(&[("parent_id", parent_id.as_i64())]);
        self.execute(builder, Scope::Protected).await
    }
}
