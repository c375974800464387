//! Chat: message threading, daily limits, and history.

#![allow(clippy::unwrap_used)]

use kidsgpt_client::{ApiError, AuthError};
use kidsgpt_core::MessageRole;
use kidsgpt_integration_tests::TestContext;

#[tokio::test]
async fn test_first_message_starts_a_conversation() {
    let ctx = TestContext::spawn().await;
    let parent = ctx.seed_parent("parent@example.com");
    let child = ctx.seed_child(&parent, "Maya", "482916");

    let response = ctx
        .api
        .send_message(child.child.id, "why is the sky blue?", None)
        .await
        .unwrap();

    assert_eq!(response.message.role, MessageRole::Child);
    assert_eq!(response.message.content, "why is the sky blue?");
    assert_eq!(response.response.role, MessageRole::Assistant);
    assert_eq!(response.messages_remaining_today, 49);
}

#[tokio::test]
async fn test_follow_up_threads_the_same_conversation() {
    let ctx = TestContext::spawn().await;
    let parent = ctx.seed_parent("parent@example.com");
    let child = ctx.seed_child(&parent, "Maya", "482916");

    let first = ctx
        .api
        .send_message(child.child.id, "hello", None)
        .await
        .unwrap();
    let second = ctx
        .api
        .send_message(child.child.id, "and another thing", Some(first.conversation_id))
        .await
        .unwrap();
    assert_eq!(second.conversation_id, first.conversation_id);

    let conversation = ctx
        .api
        .get_conversation(first.conversation_id, parent.id)
        .await
        .unwrap();
    assert_eq!(conversation.messages.len(), 4);
    assert_eq!(conversation.conversation.message_count, 4);
}

#[tokio::test]
async fn test_daily_limit_maps_to_message_limit_reached() {
    let ctx = TestContext::spawn().await;
    let parent = ctx.seed_parent("parent@example.com");
    let child = ctx.seed_child(&parent, "Maya", "482916");

    // Burn the whole budget down to zero.
    {
        let mut state = ctx.state.lock();
        let seeded = state
            .children
            .iter_mut()
            .find(|c| c.child.id == child.child.id)
            .unwrap();
        seeded.child.messages_today = seeded.child.daily_message_limit;
    }

    let err = ctx
        .api
        .send_message(child.child.id, "one more?", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::MessageLimitReached)));
}

#[tokio::test]
async fn test_today_stats_track_usage() {
    let ctx = TestContext::spawn().await;
    let parent = ctx.seed_parent("parent@example.com");
    let child = ctx.seed_child(&parent, "Maya", "482916");

    ctx.api
        .send_message(child.child.id, "hello", None)
        .await
        .unwrap();

    let stats = ctx.api.today_stats(child.child.id).await.unwrap();
    assert_eq!(stats.child_name, "Maya");
    assert_eq!(stats.messages_sent_today, 1);
    assert_eq!(stats.messages_remaining, 49);
    assert!(stats.can_send_message);
}

#[tokio::test]
async fn test_history_lists_conversations_newest_first() {
    let ctx = TestContext::spawn().await;
    let parent = ctx.seed_parent("parent@example.com");
    let child = ctx.seed_child(&parent, "Maya", "482916");

    ctx.api
        .send_message(child.child.id, "first topic", None)
        .await
        .unwrap();
    let second = ctx
        .api
        .send_message(child.child.id, "second topic", None)
        .await
        .unwrap();

    let conversations = ctx
        .api
        .list_conversations(child.child.id, parent.id, 20, 0)
        .await
        .unwrap();
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].id, second.conversation_id);
}
