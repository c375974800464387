//! Wire types for the KidsGPT backend API.
//!
//! Field names match the backend's `snake_case` JSON exactly; no renames
//! needed on the Rust side. Request bodies skip `None` fields so partial
//! updates stay partial.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use kidsgpt_core::{
    ChildId, ConversationId, Email, MessageId, MessageRole, Pin, Role, SubscriptionTier, UserId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────────────────────────────────────

/// A parent or admin account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub display_name: Option<String>,
    pub role: Role,
    pub subscription_tier: SubscriptionTier,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Registration request body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// ID-token exchange request body.
#[derive(Debug, Serialize)]
pub struct IdTokenLoginRequest {
    pub id_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Children
// ─────────────────────────────────────────────────────────────────────────────

/// A child profile, owned by exactly one parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: ChildId,
    pub parent_id: UserId,
    pub name: String,
    pub age: u8,
    /// Six-digit PIN the child logs in with.
    pub login_pin: Pin,
    pub avatar_id: Option<String>,
    pub interests: Option<Vec<String>>,
    pub learning_goals: Option<Vec<String>>,
    pub daily_message_limit: u32,
    /// Usage counter, owned and reset server-side.
    pub messages_today: u32,
    pub last_message_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A child profile with usage aggregates, as returned by list/detail calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildWithStats {
    #[serde(flatten)]
    pub child: Child,
    pub total_conversations: u64,
    pub total_messages: u64,
    pub can_send_message: bool,
}

/// Request body for creating a child profile.
#[derive(Debug, Clone, Serialize)]
pub struct NewChild {
    pub name: String,
    pub age: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_goals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_message_limit: Option<u32>,
}

/// Partial update for a child profile. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChildUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_goals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_message_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Kid sessions
// ─────────────────────────────────────────────────────────────────────────────

/// Kid PIN login request body.
#[derive(Debug, Serialize)]
pub struct KidLoginRequest {
    pub pin: Pin,
}

/// The session payload a successful PIN login returns.
///
/// This is everything the kid chat view needs; kids never see a [`User`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KidSession {
    pub child_id: ChildId,
    pub child_name: String,
    pub age: u8,
    pub avatar_id: Option<String>,
    pub daily_limit: u32,
    pub messages_remaining: u32,
    pub can_send_message: bool,
    pub parent_name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

/// One message in a conversation. Append-only; clients never mutate these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    /// Set server-side when content moderation flags the exchange.
    pub is_flagged: bool,
    pub created_at: DateTime<Utc>,
}

/// Conversation summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub child_id: ChildId,
    pub title: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_flagged: bool,
    pub message_count: u32,
}

/// Conversation with its full message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationWithMessages {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// Chat request body.
#[derive(Debug, Serialize)]
pub struct SendMessageRequest {
    pub child_id: ChildId,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
}

/// Response to a sent message: the echoed child message, the assistant
/// reply, and the updated daily budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: ConversationId,
    pub message: Message,
    pub response: Message,
    pub messages_remaining_today: u32,
    pub safety_note: Option<String>,
}

/// Today's usage for one child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayStats {
    pub child_id: ChildId,
    pub child_name: String,
    pub messages_sent_today: u32,
    pub daily_limit: u32,
    pub messages_remaining: u32,
    pub can_send_message: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin
// ─────────────────────────────────────────────────────────────────────────────

/// Platform-wide aggregates for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_children: u64,
    pub total_conversations: u64,
    pub total_messages: u64,
    pub messages_today: u64,
    pub active_users_today: u64,
    pub flagged_conversations: u64,
}

/// One row in the admin user list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserListItem {
    pub id: UserId,
    pub email: Email,
    pub display_name: Option<String>,
    pub role: Role,
    pub subscription_tier: SubscriptionTier,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub children_count: u64,
    pub total_messages: u64,
}

/// Platform configuration, read-mostly and refetched per view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub ai_provider: String,
    pub default_daily_limit: u32,
    pub max_children_free: u32,
    pub max_children_basic: u32,
    pub max_children_premium: u32,
    pub content_filter_level: String,
}

/// A conversation surfaced in the admin flagged-content review queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedConversation {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub child_name: String,
    pub parent_email: Email,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_decodes_from_wire_json() {
        let json = r#"{
            "id": 1,
            "email": "parent@example.com",
            "display_name": null,
            "role": "parent",
            "subscription_tier": "free",
            "is_active": true,
            "created_at": "2026-01-15T09:30:00Z"
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new(1));
        assert_eq!(user.role, Role::Parent);
        assert_eq!(user.subscription_tier, SubscriptionTier::Free);
        assert!(user.display_name.is_none());
    }

    #[test]
    fn test_child_with_stats_flattens() {
        let json = r#"{
            "id": 3,
            "parent_id": 1,
            "name": "Maya",
            "age": 8,
            "login_pin": "482916",
            "avatar_id": "fox",
            "interests": ["space", "dinosaurs"],
            "learning_goals": null,
            "daily_message_limit": 50,
            "messages_today": 12,
            "last_message_date": "2026-08-27",
            "is_active": true,
            "created_at": "2026-01-15T09:30:00Z",
            "total_conversations": 4,
            "total_messages": 87,
            "can_send_message": true
        }"#;

        let child: ChildWithStats = serde_json::from_str(json).unwrap();
        assert_eq!(child.child.name, "Maya");
        assert_eq!(child.child.login_pin.as_str(), "482916");
        assert_eq!(child.total_messages, 87);
        assert!(child.can_send_message);
    }

    #[test]
    fn test_partial_update_skips_none_fields() {
        let update = ChildUpdate {
            daily_message_limit: Some(25),
            ..ChildUpdate::default()
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"daily_message_limit":25}"#);
    }

    #[test]
    fn test_send_message_request_omits_missing_conversation() {
        let req = SendMessageRequest {
            child_id: ChildId::new(3),
            message: "hi".to_string(),
            conversation_id: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"child_id":3,"message":"hi"}"#);
    }

    #[test]
    fn test_chat_response_roundtrip() {
        let json = r#"{
            "conversation_id": 9,
            "message": {
                "id": 100, "conversation_id": 9, "role": "child",
                "content": "why is the sky blue?", "is_flagged": false,
                "created_at": "2026-08-27T10:00:00Z"
            },
            "response": {
                "id": 101, "conversation_id": 9, "role": "assistant",
                "content": "Great question!", "is_flagged": false,
                "created_at": "2026-08-27T10:00:01Z"
            },
            "messages_remaining_today": 37,
            "safety_note": null
        }"#;

        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.conversation_id, ConversationId::new(9));
        assert_eq!(resp.message.role, MessageRole::Child);
        assert_eq!(resp.response.role, MessageRole::Assistant);
        assert_eq!(resp.messages_remaining_today, 37);
    }
}
