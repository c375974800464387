//! Chat endpoints.

use reqwest::Method;
use tracing::instrument;

use kidsgpt_core::{ChildId, ConversationId, UserId};

use crate::error::{ApiError, AuthError};

use super::types::{
    ChatResponse, Conversation, ConversationWithMessages, SendMessageRequest, TodayStats,
};
use super::{ApiClient, Scope};

impl ApiClient {
    /// Send a chat message on behalf of a child and receive the AI reply.
    ///
    /// Passing `conversation_id: None` starts a new conversation; the
    /// returned [`ChatResponse::conversation_id`] should be threaded through
    /// follow-up messages.
    ///
    /// # Errors
    ///
    /// [`AuthError::MessageLimitReached`] once today's budget is spent,
    /// [`AuthError::AccountInactive`] for a deactivated profile.
    #[instrument(skip(self, message), fields(child_id = %child_id))]
    pub async fn send_message(
        &self,
        child_id: ChildId,
        message: &str,
        conversation_id: Option<ConversationId>,
    ) -> Result<ChatResponse, ApiError> {
        let body = SendMessageRequest {
            child_id,
            message: message.to_owned(),
            conversation_id,
        };
        let builder = self.request(Method::POST, "/chat").json(&body);
        self.execute(builder, Scope::Protected).await.map_err(|e| {
            e.map_status(&[
                (429, AuthError::MessageLimitReached),
                (403, AuthError::AccountInactive),
            ])
        })
    }

    /// Fetch today's usage stats for a child.
    ///
    /// # Errors
    ///
    /// Surfaces transport and HTTP errors from the backend.
    #[instrument(skip(self))]
    pub async fn today_stats(&self, child_id: ChildId) -> Result<TodayStats, ApiError> {
        let builder = self.request(Method::GET, &format!("/chat/today/{child_id}"));
        self.execute(builder, Scope::Protected).await
    }

    /// List a child's conversations, newest first.
    ///
    /// # Errors
    ///
    /// Surfaces transport and HTTP errors from the backend.
    #[instrument(skip(self))]
    pub async fn list_conversations(
        &self,
        child_id: ChildId,
        parent_id: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Conversation>, ApiError> {
        let builder = self
            .request(Method::GET, &format!("/chat/conversations/{child_id}"))
            .query(&[
                ("parent_id", parent_id.as_i64().to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ]);
        self.execute(builder, Scope::Protected).await
    }

    /// Fetch one conversation with its full message log.
    ///
    /// # Errors
    ///
    /// `Http {status: 404}` when the conversation does not belong to one of
    /// the parent's children.
    #[instrument(skip(self))]
    pub async fn get_conversation(
        &self,
        conversation_id: ConversationId,
        parent_id: UserId,
    ) -> Result<ConversationWithMessages, ApiError> {
        let builder = self
            .request(Method::GET, &format!("/chat/conversation/{conversation_id}"))
            .query(&[("parent_id", parent_id.as_i64())]);
        self.execute(builder, Scope::Protected).await
    }
}
