//! Chat and conversation history.
//!
//! Chat commands work in two session shapes: a kid session chats as itself,
//! while a parent session chats as the selected child (useful for trying
//! out the experience before handing a device over).
//!
//! # Usage
//!
//! ```bash
//! kidsgpt chat send "why is the sky blue?"
//! kidsgpt chat today
//! kidsgpt chat history
//! kidsgpt chat show 9
//! ```

use kidsgpt_client::api::types::Message;
use kidsgpt_client::session::SessionState;
use kidsgpt_core::{ChildId, ConversationId, MessageRole};

use super::{CliError, Context, require_selected_child, require_user};

/// The child the chat commands act as.
fn active_child(ctx: &Context) -> Result<ChildId, CliError> {
    match ctx.sessions.current() {
        SessionState::Kid { session } => Ok(session.child_id),
        SessionState::Parent {
            selected_child: Some(child),
            ..
        } => Ok(child.child.id),
        SessionState::Parent { .. } => Err(CliError::NoChildSelected),
        SessionState::Admin { .. } => Err(CliError::ParentRequired),
        _ => Err(CliError::NotLoggedIn),
    }
}

/// Send one message and print the reply.
pub async fn send(
    ctx: &Context,
    message: &str,
    conversation_id: Option<i64>,
) -> Result<(), CliError> {
    let child_id = active_child(ctx)?;
    let response = ctx
        .api()
        .send_message(child_id, message, conversation_id.map(ConversationId::new))
        .await?;

    tracing::info!("{}", response.response.content);
    if let Some(note) = &response.safety_note {
        tracing::warn!("Safety note: {note}");
    }
    tracing::info!(
        "({} messages left today, conversation {})",
        response.messages_remaining_today,
        response.conversation_id
    );
    Ok(())
}

/// Show today's usage for the active child.
pub async fn today(ctx: &Context) -> Result<(), CliError> {
    let child_id = active_child(ctx)?;
    let stats = ctx.api().today_stats(child_id).await?;

    tracing::info!(
        "{}: {}/{} messages today, {} remaining",
        stats.child_name,
        stats.messages_sent_today,
        stats.daily_limit,
        stats.messages_remaining
    );
    Ok(())
}

/// List the selected child's conversations, newest first. Parent only.
pub async fn history(ctx: &Context, limit: u32, offset: u32) -> Result<(), CliError> {
    let user = require_user(ctx)?;
    let child = require_selected_child(ctx)?;
    let conversations = ctx
        .api()
        .list_conversations(child.child.id, user.id, limit, offset)
        .await?;

    if conversations.is_empty() {
        tracing::info!("No conversations yet");
        return Ok(());
    }

    for conversation in conversations {
        tracing::info!(
            "#{} {} - {} messages, started {}{}",
            conversation.id,
            conversation.title.as_deref().unwrap_or("(untitled)"),
            conversation.message_count,
            conversation.started_at.format("%Y-%m-%d %H:%M"),
            if conversation.is_flagged { " [flagged]" } else { "" }
        );
    }
    Ok(())
}

/// Print one conversation in full. Parent only.
pub async fn show(ctx: &Context, conversation_id: i64) -> Result<(), CliError> {
    let user = require_user(ctx)?;
    let conversation = ctx
        .api()
        .get_conversation(ConversationId::new(conversation_id), user.id)
        .await?;

    tracing::info!(
        "#{} {}",
        conversation.conversation.id,
        conversation
            .conversation
            .title
            .as_deref()
            .unwrap_or("(untitled)")
    );
    for message in &conversation.messages {
        print_message(message);
    }
    Ok(())
}

fn print_message(message: &Message) {
    let speaker = match message.role {
        MessageRole::Child => "child",
        MessageRole::Assistant => "assistant",
    };
    tracing::info!(
        "[{}] {speaker}: {}{}",
        message.created_at.format("%H:%M"),
        message.content,
        if message.is_flagged { " [flagged]" } else { "" }
    );
}
