//! Child profile management.
//!
//! # Usage
//!
//! ```bash
//! kidsgpt children list
//! kidsgpt children create -n Maya -a 8 --daily-limit 50
//! kidsgpt children select 3
//! kidsgpt children regenerate-pin 3
//! ```

use kidsgpt_client::api::types::{ChildUpdate, NewChild};
use kidsgpt_core::ChildId;

use super::{CliError, Context, require_user};

/// List the parent's children with usage stats.
pub async fn list(ctx: &Context) -> Result<(), CliError> {
    let user = require_user(ctx)?;
    let children = ctx.api().list_children(user.id).await?;

    if children.is_empty() {
        tracing::info!("No children yet; add one with `kidsgpt children create`");
        return Ok(());
    }

    for child in children {
        tracing::info!(
            "#{} {} (age {}) - {}/{} messages today, {} conversations{}",
            child.child.id,
            child.child.name,
            child.child.age,
            child.child.messages_today,
            child.child.daily_message_limit,
            child.total_conversations,
            if child.child.is_active { "" } else { " [inactive]" }
        );
    }
    Ok(())
}

/// Create a child profile. The backend generates and returns the login PIN.
pub async fn create(
    ctx: &Context,
    name: &str,
    age: u8,
    interests: Vec<String>,
    daily_limit: Option<u32>,
) -> Result<(), CliError> {
    let user = require_user(ctx)?;
    let new_child = NewChild {
        name: name.to_owned(),
        age,
        interests: if interests.is_empty() {
            None
        } else {
            Some(interests)
        },
        learning_goals: None,
        daily_message_limit: daily_limit,
    };

    let child = ctx.api().create_child(user.id, &new_child).await?;
    tracing::info!("Created {} (id {})", child.name, child.id);
    tracing::info!("Login PIN: {}", child.login_pin);
    Ok(())
}

/// Show one child in detail.
pub async fn show(ctx: &Context, child_id: i64) -> Result<(), CliError> {
    let user = require_user(ctx)?;
    let child = ctx.api().get_child(ChildId::new(child_id), user.id).await?;

    tracing::info!("{} (id {}), age {}", child.child.name, child.child.id, child.child.age);
    tracing::info!("PIN: {}", child.child.login_pin);
    tracing::info!(
        "Today: {}/{} messages ({})",
        child.child.messages_today,
        child.child.daily_message_limit,
        if child.can_send_message {
            "can chat"
        } else {
            "limit reached"
        }
    );
    tracing::info!(
        "All time: {} conversations, {} messages",
        child.total_conversations,
        child.total_messages
    );
    if let Some(interests) = &child.child.interests {
        tracing::info!("Interests: {}", interests.join(", "));
    }
    Ok(())
}

/// Apply a partial update to a child profile.
pub async fn update(ctx: &Context, child_id: i64, update: ChildUpdate) -> Result<(), CliError> {
    let user = require_user(ctx)?;
    let child = ctx
        .api()
        .update_child(ChildId::new(child_id), user.id, &update)
        .await?;
    tracing::info!("Updated {} (id {})", child.name, child.id);
    Ok(())
}

/// Delete a child profile and its conversation history.
pub async fn remove(ctx: &Context, child_id: i64) -> Result<(), CliError> {
    let user = require_user(ctx)?;
    ctx.api()
        .delete_child(ChildId::new(child_id), user.id)
        .await?;
    tracing::info!("Deleted child {child_id}");
    Ok(())
}

/// Issue a fresh login PIN, invalidating the old one.
pub async fn regenerate_pin(ctx: &Context, child_id: i64) -> Result<(), CliError> {
    let user = require_user(ctx)?;
    let child = ctx
        .api()
        .regenerate_pin(ChildId::new(child_id), user.id)
        .await?;
    tracing::info!("New PIN for {}: {}", child.name, child.login_pin);
    Ok(())
}

/// Focus the session on one child for chat and history commands.
pub async fn select(ctx: &Context, child_id: i64) -> Result<(), CliError> {
    let user = require_user(ctx)?;
    let child = ctx.api().get_child(ChildId::new(child_id), user.id).await?;
    let name = child.child.name.clone();
    ctx.sessions.select_child(child)?;
    tracing::info!("Selected {name}");
    Ok(())
}
