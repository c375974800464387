//! Admin oversight endpoints and their role gating.

#![allow(clippy::unwrap_used)]

use kidsgpt_client::{ApiError, AuthError};
use kidsgpt_core::{ConversationId, Email, SubscriptionTier};
use kidsgpt_integration_tests::TestContext;

#[tokio::test]
async fn test_stats_reflect_seeded_world() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.seed_admin("admin@example.com");
    let parent = ctx.seed_parent("parent@example.com");
    let child = ctx.seed_child(&parent, "Maya", "482916");

    ctx.api
        .send_message(child.child.id, "hello", None)
        .await
        .unwrap();

    let stats = ctx.api.admin_stats(admin.id).await.unwrap();
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_children, 1);
    assert_eq!(stats.total_conversations, 1);
    assert_eq!(stats.messages_today, 1);
}

#[tokio::test]
async fn test_non_admin_caller_is_forbidden() {
    let ctx = TestContext::spawn().await;
    let parent = ctx.seed_parent("parent@example.com");

    let err = ctx.api.admin_stats(parent.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 403, .. }));
}

#[tokio::test]
async fn test_user_list_includes_aggregates() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.seed_admin("admin@example.com");
    let parent = ctx.seed_parent("parent@example.com");
    ctx.seed_child(&parent, "Maya", "482916");

    let users = ctx.api.admin_users(admin.id, 50, 0).await.unwrap();
    let row = users.iter().find(|u| u.id == parent.id).unwrap();
    assert_eq!(row.children_count, 1);
}

#[tokio::test]
async fn test_config_roundtrip() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.seed_admin("admin@example.com");

    let mut config = ctx.api.system_config(admin.id).await.unwrap();
    assert_eq!(config.content_filter_level, "strict");

    config.default_daily_limit = 30;
    let updated = ctx.api.update_system_config(admin.id, &config).await.unwrap();
    assert_eq!(updated.default_daily_limit, 30);

    let reread = ctx.api.system_config(admin.id).await.unwrap();
    assert_eq!(reread.default_daily_limit, 30);
}

#[tokio::test]
async fn test_subscription_and_active_toggles() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.seed_admin("admin@example.com");
    let parent = ctx.seed_parent("parent@example.com");

    ctx.api
        .set_subscription_tier(admin.id, parent.id, SubscriptionTier::Premium)
        .await
        .unwrap();
    ctx.api.toggle_user_active(admin.id, parent.id).await.unwrap();

    let users = ctx.api.admin_users(admin.id, 50, 0).await.unwrap();
    let row = users.iter().find(|u| u.id == parent.id).unwrap();
    assert_eq!(row.subscription_tier, SubscriptionTier::Premium);
    assert!(!row.is_active);
}

#[tokio::test]
async fn test_flagged_queue_joins_family_context() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.seed_admin("admin@example.com");
    let parent = ctx.seed_parent("parent@example.com");
    let child = ctx.seed_child(&parent, "Maya", "482916");

    let sent = ctx
        .api
        .send_message(child.child.id, "hello", None)
        .await
        .unwrap();
    {
        let mut state = ctx.state.lock();
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| c.conversation.id == sent.conversation_id)
            .unwrap();
        conversation.conversation.is_flagged = true;
    }

    let flagged = ctx.api.flagged_conversations(admin.id, 50).await.unwrap();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].conversation.id, sent.conversation_id);
    assert_eq!(flagged[0].child_name, "Maya");
    assert_eq!(flagged[0].parent_email.as_str(), "parent@example.com");
    assert_eq!(
        flagged[0].conversation.id,
        ConversationId::new(sent.conversation_id.as_i64())
    );
}

#[tokio::test]
async fn test_create_admin_bootstraps_once() {
    let ctx = TestContext::spawn().await;

    let email = Email::parse("admin@example.com").unwrap();
    let admin = ctx.api.create_admin(&email, "Site Admin").await.unwrap();
    assert!(admin.role.is_admin());

    let err = ctx
        .api
        .create_admin(&Email::parse("second@example.com").unwrap(), "Other")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::AlreadyRegistered)));
}
