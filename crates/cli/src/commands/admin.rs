//! Admin oversight commands.
//!
//! All of these require an admin session except `create`, which bootstraps
//! the first admin account on a fresh deployment.
//!
//! # Usage
//!
//! ```bash
//! kidsgpt admin stats
//! kidsgpt admin users
//! kidsgpt admin set-tier -u 4 -t premium
//! kidsgpt admin flagged
//! kidsgpt admin create -e admin@example.com -n "Site Admin"
//! ```

use kidsgpt_client::api::types::SystemConfig;
use kidsgpt_core::{Email, SubscriptionTier, UserId};

use super::{CliError, Context, require_admin};

/// Show platform-wide aggregates.
pub async fn stats(ctx: &Context) -> Result<(), CliError> {
    let admin = require_admin(ctx)?;
    let stats = ctx.api().admin_stats(admin.id).await?;

    tracing::info!(
        "Users: {} ({} active today)",
        stats.total_users,
        stats.active_users_today
    );
    tracing::info!("Children: {}", stats.total_children);
    tracing::info!(
        "Conversations: {} ({} flagged)",
        stats.total_conversations,
        stats.flagged_conversations
    );
    tracing::info!(
        "Messages: {} ({} today)",
        stats.total_messages,
        stats.messages_today
    );
    Ok(())
}

/// List user accounts with aggregates.
pub async fn users(ctx: &Context, limit: u32, offset: u32) -> Result<(), CliError> {
    let admin = require_admin(ctx)?;
    let users = ctx.api().admin_users(admin.id, limit, offset).await?;

    for user in users {
        tracing::info!(
            "#{} {} ({}, {} tier) - {} children, {} messages{}",
            user.id,
            user.email,
            user.role,
            user.subscription_tier,
            user.children_count,
            user.total_messages,
            if user.is_active { "" } else { " [deactivated]" }
        );
    }
    Ok(())
}

/// Show the platform configuration.
pub async fn show_config(ctx: &Context) -> Result<(), CliError> {
    let admin = require_admin(ctx)?;
    let config = ctx.api().system_config(admin.id).await?;
    print_config(&config);
    Ok(())
}

/// Update parts of the platform configuration.
pub async fn set_config(
    ctx: &Context,
    default_daily_limit: Option<u32>,
    content_filter_level: Option<String>,
) -> Result<(), CliError> {
    let admin = require_admin(ctx)?;
    let mut config = ctx.api().system_config(admin.id).await?;

    if let Some(limit) = default_daily_limit {
        config.default_daily_limit = limit;
    }
    if let Some(level) = content_filter_level {
        config.content_filter_level = level;
    }

    let config = ctx.api().update_system_config(admin.id, &config).await?;
    tracing::info!("Configuration updated");
    print_config(&config);
    Ok(())
}

/// Change a user's subscription tier.
pub async fn set_tier(ctx: &Context, user_id: i64, tier: &str) -> Result<(), CliError> {
    let admin = require_admin(ctx)?;
    let tier: SubscriptionTier = tier.parse().map_err(|_| CliError::InvalidArg {
        what: "tier",
        value: tier.to_owned(),
    })?;

    ctx.api()
        .set_subscription_tier(admin.id, UserId::new(user_id), tier)
        .await?;
    tracing::info!("User {user_id} moved to the {tier} tier");
    Ok(())
}

/// Flip a user between active and deactivated.
pub async fn toggle_active(ctx: &Context, user_id: i64) -> Result<(), CliError> {
    let admin = require_admin(ctx)?;
    ctx.api()
        .toggle_user_active(admin.id, UserId::new(user_id))
        .await?;
    tracing::info!("Toggled active state for user {user_id}");
    Ok(())
}

/// List conversations flagged for review.
pub async fn flagged(ctx: &Context, limit: u32) -> Result<(), CliError> {
    let admin = require_admin(ctx)?;
    let conversations = ctx.api().flagged_conversations(admin.id, limit).await?;

    if conversations.is_empty() {
        tracing::info!("Nothing flagged for review");
        return Ok(());
    }

    for flagged in conversations {
        tracing::info!(
            "#{} {} - child {}, parent {}, {} messages",
            flagged.conversation.id,
            flagged.conversation.title.as_deref().unwrap_or("(untitled)"),
            flagged.child_name,
            flagged.parent_email,
            flagged.conversation.message_count
        );
    }
    Ok(())
}

/// Bootstrap the first admin account. Does not require a session.
pub async fn create(ctx: &Context, email: &str, name: &str) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let user = ctx.api().create_admin(&email, name).await?;
    tracing::info!("Admin account created: {} (id {})", user.email, user.id);
    Ok(())
}

fn print_config(config: &SystemConfig) {
    tracing::info!("AI provider: {}", config.ai_provider);
    tracing::info!("Default daily limit: {}", config.default_daily_limit);
    tracing::info!(
        "Max children: free {}, basic {}, premium {}",
        config.max_children_free,
        config.max_children_basic,
        config.max_children_premium
    );
    tracing::info!("Content filter level: {}", config.content_filter_level);
}
