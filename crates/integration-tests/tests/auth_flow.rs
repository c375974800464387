//! End-to-end auth flows: email login, registration, restore, ID tokens.

#![allow(clippy::unwrap_used)]

use kidsgpt_client::session::SessionState;
use kidsgpt_client::{ApiError, AuthError, SessionError};
use kidsgpt_core::{Email, Portal};
use kidsgpt_integration_tests::TestContext;
use secrecy::SecretString;

fn email(s: &str) -> Email {
    Email::parse(s).unwrap()
}

fn auth_error(err: &SessionError) -> Option<AuthError> {
    match err {
        SessionError::Api(ApiError::Auth(auth)) => Some(*auth),
        _ => None,
    }
}

#[tokio::test]
async fn test_email_login_reaches_parent_state() {
    let ctx = TestContext::spawn().await;
    let seeded = ctx.seed_parent("parent@example.com");

    let user = ctx
        .sessions
        .login_with_email(&email("parent@example.com"))
        .await
        .unwrap();
    assert_eq!(user.id, seeded.id);

    match ctx.sessions.current() {
        SessionState::Parent {
            user,
            portal,
            selected_child,
        } => {
            assert_eq!(user.email.as_str(), "parent@example.com");
            assert_eq!(portal, Portal::Parent);
            assert!(selected_child.is_none());
        }
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test]
async fn test_admin_login_lands_in_admin_portal() {
    let ctx = TestContext::spawn().await;
    ctx.seed_admin("admin@example.com");

    ctx.sessions
        .login_with_email(&email("admin@example.com"))
        .await
        .unwrap();

    match ctx.sessions.current() {
        SessionState::Admin { portal, .. } => assert_eq!(portal, Portal::Admin),
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_email_is_invalid_credentials_and_rolls_back() {
    let ctx = TestContext::spawn().await;

    let err = ctx
        .sessions
        .login_with_email(&email("nobody@example.com"))
        .await
        .unwrap_err();
    assert_eq!(auth_error(&err), Some(AuthError::InvalidCredentials));
    assert_eq!(ctx.sessions.current(), SessionState::LoggedOut);
}

#[tokio::test]
async fn test_deactivated_account_is_rejected() {
    let ctx = TestContext::spawn().await;
    let user = ctx.seed_parent("parent@example.com");
    ctx.deactivate_user(user.id);

    let err = ctx
        .sessions
        .login_with_email(&email("parent@example.com"))
        .await
        .unwrap_err();
    assert_eq!(auth_error(&err), Some(AuthError::AccountInactive));
}

#[tokio::test]
async fn test_register_logs_in_and_rejects_duplicates() {
    let ctx = TestContext::spawn().await;

    ctx.sessions
        .register(&email("new@example.com"), Some("Sam"))
        .await
        .unwrap();
    assert!(ctx.sessions.current().is_authenticated());

    let err = ctx
        .sessions
        .register(&email("new@example.com"), None)
        .await
        .unwrap_err();
    assert_eq!(auth_error(&err), Some(AuthError::AlreadyRegistered));
}

#[tokio::test]
async fn test_id_token_login_installs_bearer_token() {
    let ctx = TestContext::spawn().await;
    let parent = ctx.seed_parent("parent@example.com");
    ctx.require_tokens(&["id-token-1"]);

    ctx.sessions
        .login_with_id_token(SecretString::from("id-token-1"), None)
        .await
        .unwrap();
    assert!(ctx.api.has_bearer_token());

    // The token from the exchange authenticates protected calls.
    let me = ctx.api.me(parent.id).await.unwrap();
    assert_eq!(me.email.as_str(), "parent@example.com");
    assert_eq!(
        ctx.state.lock().auth_headers_seen,
        vec![Some("id-token-1".to_string())]
    );
}

#[tokio::test]
async fn test_rejected_id_token_is_invalid_credentials() {
    let ctx = TestContext::spawn().await;
    ctx.seed_parent("parent@example.com");
    ctx.require_tokens(&["id-token-1"]);

    let err = ctx
        .sessions
        .login_with_id_token(SecretString::from("forged"), None)
        .await
        .unwrap_err();
    assert_eq!(auth_error(&err), Some(AuthError::InvalidCredentials));
    assert!(!ctx.api.has_bearer_token());
}

#[tokio::test]
async fn test_session_survives_relaunch() {
    let ctx = TestContext::spawn().await;
    let parent = ctx.seed_parent("parent@example.com");
    let child = ctx.seed_child(&parent, "Maya", "482916");

    ctx.sessions
        .login_with_email(&email("parent@example.com"))
        .await
        .unwrap();
    let fetched = ctx.api.get_child(child.child.id, parent.id).await.unwrap();
    ctx.sessions.select_child(fetched).unwrap();

    let relaunched = ctx.relaunch_sessions();
    match relaunched.current() {
        SessionState::Parent {
            user,
            selected_child,
            ..
        } => {
            assert_eq!(user.id, parent.id);
            assert_eq!(selected_child.unwrap().child.name, "Maya");
        }
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test]
async fn test_logout_clears_persisted_session_and_bearer() {
    let ctx = TestContext::spawn().await;
    let parent = ctx.seed_parent("parent@example.com");
    ctx.require_tokens(&["id-token-1"]);

    ctx.sessions
        .login_with_id_token(SecretString::from("id-token-1"), None)
        .await
        .unwrap();
    assert!(ctx.api.has_bearer_token());

    ctx.sessions.logout();
    assert_eq!(ctx.sessions.current(), SessionState::LoggedOut);
    assert_eq!(ctx.relaunch_sessions().current(), SessionState::LoggedOut);

    // Requests after logout go out without an Authorization header.
    ctx.state.lock().require_token = false;
    ctx.api.list_children(parent.id).await.unwrap();
    assert_eq!(ctx.state.lock().auth_headers_seen.last(), Some(&None));
}
