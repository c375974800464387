//! Login, logout, and session inspection.
//!
//! # Usage
//!
//! ```bash
//! # Parent or admin login by email
//! kidsgpt auth login -e parent@example.com
//!
//! # Kid login by PIN
//! kidsgpt auth kid-login -p 482916
//!
//! # Show the current session
//! kidsgpt auth whoami
//! ```

use secrecy::SecretString;

use kidsgpt_client::session::SessionState;
use kidsgpt_core::{Email, Pin, Portal};

use super::{CliError, Context};

/// Log in a parent or admin by email.
pub async fn login(ctx: &Context, email: &str) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let user = ctx.sessions.login_with_email(&email).await?;
    tracing::info!(
        "Logged in as {} ({}, {} tier)",
        user.email,
        user.role,
        user.subscription_tier
    );
    Ok(())
}

/// Log in by exchanging an identity-provider ID token.
pub async fn login_with_token(
    ctx: &Context,
    id_token: String,
    display_name: Option<&str>,
) -> Result<(), CliError> {
    let user = ctx
        .sessions
        .login_with_id_token(SecretString::from(id_token), display_name)
        .await?;
    tracing::info!("Logged in as {} ({})", user.email, user.role);
    Ok(())
}

/// Register a new parent account and log it in.
pub async fn register(ctx: &Context, email: &str, name: Option<&str>) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let user = ctx.sessions.register(&email, name).await?;
    tracing::info!("Registered {} (id {})", user.email, user.id);
    Ok(())
}

/// Log a child in with their PIN.
pub async fn kid_login(ctx: &Context, pin: &str) -> Result<(), CliError> {
    let pin = Pin::parse(pin)?;
    let session = ctx.sessions.login_as_kid(&pin).await?;
    tracing::info!(
        "Hi {}! You have {} of {} messages left today.",
        session.child_name,
        session.messages_remaining,
        session.daily_limit
    );
    Ok(())
}

/// Log out and clear the stored session.
pub fn logout(ctx: &Context) {
    ctx.sessions.logout();
}

/// Show who is logged in, verified against the backend for user sessions.
pub async fn whoami(ctx: &Context) -> Result<(), CliError> {
    if let Some(user) = ctx.sessions.current().user() {
        confirm_identity(ctx, user.id).await;
    }
    match ctx.sessions.current() {
        SessionState::LoggedOut | SessionState::Authenticating => {
            tracing::info!("Not logged in");
        }
        SessionState::Kid { session } => {
            tracing::info!(
                "Kid session: {} (child id {}), {} messages remaining",
                session.child_name,
                session.child_id,
                session.messages_remaining
            );
        }
        SessionState::Parent {
            user,
            portal,
            selected_child,
        } => {
            tracing::info!("{} ({}), portal: {portal}", user.email, user.role);
            match selected_child {
                Some(child) => {
                    tracing::info!("Selected child: {} (id {})", child.child.name, child.child.id);
                }
                None => tracing::info!("No child selected"),
            }
        }
        SessionState::Admin { user, portal } => {
            tracing::info!("{} ({}), portal: {portal}", user.email, user.role);
        }
    }
    Ok(())
}

/// Switch the logged-in user to another portal.
pub fn switch_portal(ctx: &Context, portal: &str) -> Result<(), CliError> {
    let portal: Portal = portal.parse().map_err(|_| CliError::InvalidArg {
        what: "portal",
        value: portal.to_owned(),
    })?;
    ctx.sessions.switch_portal(portal)?;
    tracing::info!("Switched to the {portal} portal");
    Ok(())
}

/// Best-effort backend check that the stored session is still valid. Forces
/// a logout when the token expired and could not be refreshed.
async fn confirm_identity(ctx: &Context, user_id: kidsgpt_core::UserId) {
    if let Err(err) = ctx.api().me(user_id).await {
        if ctx.sessions.logout_if_expired(&err) {
            tracing::warn!("Stored session has expired; logged out");
        } else {
            tracing::debug!(error = %err, "could not verify session with backend");
        }
    }
}
