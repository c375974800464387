//! Command implementations.
//!
//! Each submodule owns one subcommand family and talks to the backend
//! through the shared [`Context`]. Commands report through `tracing` so the
//! same output plumbing serves both humans and scripts with `RUST_LOG`.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod children;

use thiserror::Error;

use kidsgpt_client::api::types::{ChildWithStats, User};
use kidsgpt_client::session::SessionState;
use kidsgpt_client::{ApiClient, ApiError, AuthSessionManager, SessionError};
use kidsgpt_core::{EmailError, PinError};

/// Shared state handed to every command.
pub struct Context {
    pub sessions: AuthSessionManager,
}

impl Context {
    pub fn api(&self) -> &ApiClient {
        self.sessions.api()
    }
}

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Pin(#[from] PinError),

    #[error("not logged in; run `kidsgpt auth login` first")]
    NotLoggedIn,

    #[error("this command requires a parent session")]
    ParentRequired,

    #[error("this command requires an admin session")]
    AdminRequired,

    #[error("no child selected; run `kidsgpt children select <ID>` first")]
    NoChildSelected,

    #[error("invalid {what}: {value}")]
    InvalidArg { what: &'static str, value: String },
}

/// The logged-in parent, or the admin browsing the parent portal.
pub(crate) fn require_user(ctx: &Context) -> Result<User, CliError> {
    match ctx.sessions.current() {
        SessionState::Parent { user, .. } | SessionState::Admin { user, .. } => Ok(user),
        SessionState::Kid { .. } => Err(CliError::ParentRequired),
        _ => Err(CliError::NotLoggedIn),
    }
}

/// The logged-in admin.
pub(crate) fn require_admin(ctx: &Context) -> Result<User, CliError> {
    match ctx.sessions.current() {
        SessionState::Admin { user, .. } => Ok(user),
        SessionState::Parent { .. } | SessionState::Kid { .. } => Err(CliError::AdminRequired),
        _ => Err(CliError::NotLoggedIn),
    }
}

/// The parent session's selected child.
pub(crate) fn require_selected_child(ctx: &Context) -> Result<ChildWithStats, CliError> {
    match ctx.sessions.current() {
        SessionState::Parent {
            selected_child: Some(child),
            ..
        } => Ok(*child),
        SessionState::Parent { .. } => Err(CliError::NoChildSelected),
        SessionState::Kid { .. } | SessionState::Admin { .. } => Err(CliError::ParentRequired),
        _ => Err(CliError::NotLoggedIn),
    }
}
