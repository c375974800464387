//! Maps session state to the views a client may show.
//!
//! Pure functions over [`SessionState`]; UI layers call these after every
//! state change instead of scattering role checks. The gate for the admin
//! panel is the account role, never the portal field, so a forged portal
//! value cannot expose it.

use kidsgpt_core::Portal;

use crate::session::manager::SessionState;

/// A top-level view a client can present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Portal chooser shown to logged-out visitors.
    Landing,
    /// Kid PIN entry.
    KidLogin,
    /// Parent email login and registration.
    ParentLogin,
    /// Admin email login.
    AdminLogin,
    /// The kid chat experience.
    KidChat,
    /// Parent dashboard (children, history, settings).
    ParentDashboard,
    /// Admin panel (stats, users, config, flagged content).
    AdminPanel,
}

/// The views reachable from `state`.
///
/// Kid sessions reach exactly the chat view. Parents reach the dashboard,
/// plus the kid chat only once a child is selected. Admins reach the admin
/// panel and the parent dashboard. Logged-out (and mid-login) states reach
/// only the landing page and the login forms.
#[must_use]
pub fn reachable_views(state: &SessionState) -> Vec<View> {
    match state {
        SessionState::LoggedOut | SessionState::Authenticating => vec![
            View::Landing,
            View::KidLogin,
            View::ParentLogin,
            View::AdminLogin,
        ],
        SessionState::Kid { .. } => vec![View::KidChat],
        SessionState::Parent { selected_child, .. } => {
            let mut views = vec![View::ParentDashboard];
            if selected_child.is_some() {
                views.push(View::KidChat);
            }
            views
        }
        SessionState::Admin { .. } => vec![View::AdminPanel, View::ParentDashboard],
    }
}

/// Whether `view` may be shown in `state`. Clients route back to
/// [`default_view`] when this says no.
#[must_use]
pub fn is_reachable(state: &SessionState, view: View) -> bool {
    reachable_views(state).contains(&view)
}

/// The view a client should land on for `state`.
#[must_use]
pub fn default_view(state: &SessionState) -> View {
    match state {
        SessionState::LoggedOut | SessionState::Authenticating => View::Landing,
        SessionState::Kid { .. } => View::KidChat,
        SessionState::Parent {
            portal,
            selected_child,
            ..
        } => {
            if *portal == Portal::Kids && selected_child.is_some() {
                View::KidChat
            } else {
                View::ParentDashboard
            }
        }
        SessionState::Admin { portal, .. } => {
            if *portal == Portal::Parent {
                View::ParentDashboard
            } else {
                View::AdminPanel
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::Utc;

    use kidsgpt_core::{ChildId, Email, Pin, Role, SubscriptionTier, UserId};

    use crate::api::types::{Child, ChildWithStats, KidSession, User};

    fn user(role: Role) -> User {
        User {
            id: UserId::new(1),
            email: "a@example.com".parse::<Email>().unwrap(),
            display_name: None,
            role,
            subscription_tier: SubscriptionTier::Free,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn child() -> Box<ChildWithStats> {
        Box::new(ChildWithStats {
            child: Child {
                id: ChildId::new(3),
                parent_id: UserId::new(1),
                name: "Maya".to_string(),
                age: 8,
                login_pin: "482916".parse::<Pin>().unwrap(),
                avatar_id: None,
                interests: None,
                learning_goals: None,
                daily_message_limit: 50,
                messages_today: 0,
                last_message_date: None,
                is_active: true,
                created_at: Utc::now(),
            },
            total_conversations: 0,
            total_messages: 0,
            can_send_message: true,
        })
    }

    fn kid_state() -> SessionState {
        SessionState::Kid {
            session: KidSession {
                child_id: ChildId::new(3),
                child_name: "Maya".to_string(),
                age: 8,
                avatar_id: None,
                daily_limit: 50,
                messages_remaining: 50,
                can_send_message: true,
                parent_name: None,
            },
        }
    }

    #[test]
    fn test_logged_out_reaches_landing_and_login_forms_only() {
        let views = reachable_views(&SessionState::LoggedOut);
        assert_eq!(
            views,
            vec![
                View::Landing,
                View::KidLogin,
                View::ParentLogin,
                View::AdminLogin
            ]
        );
        assert_eq!(views, reachable_views(&SessionState::Authenticating));
    }

    #[test]
    fn test_kid_session_reaches_chat_only() {
        assert_eq!(reachable_views(&kid_state()), vec![View::KidChat]);
        assert_eq!(default_view(&kid_state()), View::KidChat);
    }

    #[test]
    fn test_parent_without_child_cannot_reach_kid_chat() {
        let state = SessionState::Parent {
            user: user(Role::Parent),
            portal: kidsgpt_core::Portal::Parent,
            selected_child: None,
        };
        assert!(!is_reachable(&state, View::KidChat));
        assert!(is_reachable(&state, View::ParentDashboard));
    }

    #[test]
    fn test_parent_with_child_reaches_kid_chat() {
        let state = SessionState::Parent {
            user: user(Role::Parent),
            portal: kidsgpt_core::Portal::Kids,
            selected_child: Some(child()),
        };
        assert!(is_reachable(&state, View::KidChat));
        assert_eq!(default_view(&state), View::KidChat);
    }

    #[test]
    fn test_parent_never_reaches_admin_panel() {
        for selected_child in [None, Some(child())] {
            let state = SessionState::Parent {
                user: user(Role::Parent),
                portal: kidsgpt_core::Portal::Parent,
                selected_child,
            };
            assert!(!is_reachable(&state, View::AdminPanel));
        }
    }

    #[test]
    fn test_admin_panel_gated_on_role_exactly() {
        let admin = SessionState::Admin {
            user: user(Role::Admin),
            portal: kidsgpt_core::Portal::Admin,
        };
        assert!(is_reachable(&admin, View::AdminPanel));
        assert_eq!(default_view(&admin), View::AdminPanel);

        // An admin browsing the parent portal keeps the panel reachable but
        // lands on the dashboard.
        let browsing = SessionState::Admin {
            user: user(Role::Admin),
            portal: kidsgpt_core::Portal::Parent,
        };
        assert!(is_reachable(&browsing, View::AdminPanel));
        assert_eq!(default_view(&browsing), View::ParentDashboard);
    }

    #[test]
    fn test_unreachable_views_route_to_default() {
        assert_eq!(default_view(&SessionState::LoggedOut), View::Landing);
        assert!(!is_reachable(&SessionState::LoggedOut, View::ParentDashboard));
    }
}
