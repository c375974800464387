//! The auth session state machine.
//!
//! All session mutation funnels through [`AuthSessionManager`]; the rest of
//! the app holds a clone and observes state through [`subscribe`]. State
//! transitions are published synchronously, before the mutating call
//! returns, so an observer that reads after `logout()` never sees a stale
//! authenticated state.
//!
//! Login is async and racy by nature: the user can hit logout (or start a
//! second login) while a request is in flight. Each attempt takes a ticket
//! from a monotonic counter under the state lock; a completion only applies
//! if its ticket is still current. Logout bumps the counter, so a login that
//! lands afterwards is discarded and reported as [`SessionError::Superseded`].
//!
//! [`subscribe`]: AuthSessionManager::subscribe

use std::sync::Arc;

use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::watch;
use tracing::instrument;

use kidsgpt_core::{Email, Pin, Portal, Role};

use crate::api::types::{ChildWithStats, KidSession, User};
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::session::store::{PersistedIdentity, PersistedSession, TokenStore};

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No credentials; only login flows are available.
    LoggedOut,
    /// A login request is in flight.
    Authenticating,
    /// A parent account, possibly focused on one child.
    Parent {
        user: User,
        portal: Portal,
        selected_child: Option<Box<ChildWithStats>>,
    },
    /// An admin account. Admins may also browse the parent portal.
    Admin { user: User, portal: Portal },
    /// A child logged in by PIN. No [`User`] exists in this state.
    Kid { session: KidSession },
}

impl SessionState {
    /// Whether someone (user or kid) is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Parent { .. } | Self::Admin { .. } | Self::Kid { .. })
    }

    /// The logged-in account, if this is a parent or admin session.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Parent { user, .. } | Self::Admin { user, .. } => Some(user),
            _ => None,
        }
    }

    /// The active portal, if any.
    #[must_use]
    pub const fn portal(&self) -> Option<Portal> {
        match self {
            Self::Parent { portal, .. } | Self::Admin { portal, .. } => Some(*portal),
            Self::Kid { .. } => Some(Portal::Kids),
            _ => None,
        }
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::LoggedOut => "logged_out",
            Self::Authenticating => "authenticating",
            Self::Parent { .. } => "parent",
            Self::Admin { .. } => "admin",
            Self::Kid { .. } => "kid",
        }
    }
}

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The operation does not apply to the current state.
    #[error("operation requires a {required} session, but the session is {actual}")]
    InvalidState {
        required: &'static str,
        actual: &'static str,
    },

    /// Switching to the admin portal without the admin role.
    #[error("the admin portal requires an admin account")]
    PortalNotPermitted,

    /// A logout or newer login won the race against this attempt; its result
    /// was discarded.
    #[error("a newer auth operation superseded this one")]
    Superseded,
}

struct SessionCell {
    state: SessionState,
    bearer: Option<SecretString>,
    /// Monotonic attempt ticket. Bumped by every login start and by logout.
    attempt: u64,
}

struct ManagerInner {
    api: ApiClient,
    store: TokenStore,
    cell: Mutex<SessionCell>,
    tx: watch::Sender<SessionState>,
}

/// Owner of the session lifecycle.
///
/// Clone-cheap; all clones share one state machine. Constructing it restores
/// any persisted session from the [`TokenStore`].
#[derive(Clone)]
pub struct AuthSessionManager {
    inner: Arc<ManagerInner>,
}

impl AuthSessionManager {
    /// Build the manager, restoring a persisted session if one exists.
    #[must_use]
    pub fn new(api: ApiClient, store: TokenStore) -> Self {
        let (state, bearer) = match store.load() {
            Some(persisted) => Self::restore(persisted),
            None => (SessionState::LoggedOut, None),
        };

        if let Some(token) = &bearer {
            api.set_bearer_token(token.clone());
        }

        let (tx, _rx) = watch::channel(state.clone());
        Self {
            inner: Arc::new(ManagerInner {
                api,
                store,
                cell: Mutex::new(SessionCell {
                    state,
                    bearer,
                    attempt: 0,
                }),
                tx,
            }),
        }
    }

    fn restore(persisted: PersistedSession) -> (SessionState, Option<SecretString>) {
        let bearer = persisted.bearer_token.map(SecretString::from);
        let state = match persisted.identity {
            PersistedIdentity::Kid { session } => SessionState::Kid { session },
            PersistedIdentity::User {
                user,
                portal,
                selected_child,
            } => {
                // A tampered store could claim the admin portal for a parent.
                let portal = if portal == Portal::Admin && !user.role.is_admin() {
                    Portal::Parent
                } else {
                    portal
                };
                match user.role {
                    Role::Admin => SessionState::Admin { user, portal },
                    Role::Parent => SessionState::Parent {
                        user,
                        portal,
                        selected_child,
                    },
                }
            }
        };
        (state, bearer)
    }

    /// The API client this manager drives.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.inner.cell.lock().state.clone()
    }

    /// Subscribe to state changes. The receiver immediately holds the
    /// current state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.tx.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Login flows
    // ─────────────────────────────────────────────────────────────────────────

    /// Log in a parent or admin by email.
    ///
    /// # Errors
    ///
    /// [`SessionError::Api`] when the backend rejects the login; the session
    /// rolls back to its previous state. [`SessionError::Superseded`] when a
    /// logout or newer login raced past this attempt.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn login_with_email(&self, email: &Email) -> Result<User, SessionError> {
        let ticket = self.begin_attempt();
        match self.inner.api.login(email).await {
            Ok(user) => self.commit_user(ticket, user, None),
            Err(err) => {
                self.rollback(ticket);
                Err(err.into())
            }
        }
    }

    /// Register a new parent account and log it in.
    ///
    /// # Errors
    ///
    /// See [`login_with_email`](Self::login_with_email); additionally
    /// [`crate::AuthError::AlreadyRegistered`] through the `Api` variant.
    #[instrument(skip(self, display_name), fields(email = %email))]
    pub async fn register(
        &self,
        email: &Email,
        display_name: Option<&str>,
    ) -> Result<User, SessionError> {
        let ticket = self.begin_attempt();
        match self.inner.api.register(email, display_name).await {
            Ok(user) => self.commit_user(ticket, user, None),
            Err(err) => {
                self.rollback(ticket);
                Err(err.into())
            }
        }
    }

    /// Exchange an identity-provider ID token for a session. The token is
    /// kept as the bearer credential for protected calls.
    ///
    /// # Errors
    ///
    /// See [`login_with_email`](Self::login_with_email).
    #[instrument(skip_all)]
    pub async fn login_with_id_token(
        &self,
        id_token: SecretString,
        display_name: Option<&str>,
    ) -> Result<User, SessionError> {
        let ticket = self.begin_attempt();
        match self
            .inner
            .api
            .login_with_id_token(&id_token, display_name)
            .await
        {
            Ok(user) => self.commit_user(ticket, user, Some(id_token)),
            Err(err) => {
                self.rollback(ticket);
                Err(err.into())
            }
        }
    }

    /// Log a child in with their PIN.
    ///
    /// # Errors
    ///
    /// [`crate::AuthError::InvalidPin`] through the `Api` variant when no
    /// profile matches; [`SessionError::Superseded`] when raced.
    #[instrument(skip_all)]
    pub async fn login_as_kid(&self, pin: &Pin) -> Result<KidSession, SessionError> {
        let ticket = self.begin_attempt();
        match self.inner.api.kid_login(pin).await {
            Ok(session) => {
                let state = SessionState::Kid {
                    session: session.clone(),
                };
                self.apply(ticket, state, None)?;
                Ok(session)
            }
            Err(err) => {
                self.rollback(ticket);
                Err(err.into())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // In-session transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Focus the parent session on one child.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] unless a parent is logged in.
    pub fn select_child(&self, child: ChildWithStats) -> Result<(), SessionError> {
        self.mutate_in_place(|state| match state {
            SessionState::Parent { selected_child, .. } => {
                *selected_child = Some(Box::new(child));
                Ok(())
            }
            other => Err(SessionError::InvalidState {
                required: "parent",
                actual: other.name(),
            }),
        })
    }

    /// Drop the child selection, returning the dashboard to the overview.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] unless a parent is logged in.
    pub fn clear_selected_child(&self) -> Result<(), SessionError> {
        self.mutate_in_place(|state| match state {
            SessionState::Parent { selected_child, .. } => {
                *selected_child = None;
                Ok(())
            }
            other => Err(SessionError::InvalidState {
                required: "parent",
                actual: other.name(),
            }),
        })
    }

    /// Move the logged-in user to another portal.
    ///
    /// # Errors
    ///
    /// [`SessionError::PortalNotPermitted`] when a non-admin asks for the
    /// admin portal; [`SessionError::InvalidState`] for kid sessions and
    /// logged-out states.
    #[instrument(skip(self))]
    pub fn switch_portal(&self, portal: Portal) -> Result<(), SessionError> {
        self.mutate_in_place(|state| match state {
            SessionState::Parent {
                user,
                portal: current,
                ..
            }
            | SessionState::Admin {
                user,
                portal: current,
            } => {
                if portal == Portal::Admin && !user.role.is_admin() {
                    return Err(SessionError::PortalNotPermitted);
                }
                *current = portal;
                Ok(())
            }
            other => Err(SessionError::InvalidState {
                required: "parent or admin",
                actual: other.name(),
            }),
        })
    }

    /// Log out, discarding any in-flight login.
    ///
    /// State flips to [`SessionState::LoggedOut`] and is published before
    /// this returns; the store and the API client's bearer token are cleared.
    /// Idempotent.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        {
            let mut cell = self.inner.cell.lock();
            cell.attempt += 1;
            cell.state = SessionState::LoggedOut;
            cell.bearer = None;
            self.inner.tx.send_replace(SessionState::LoggedOut);
        }
        self.inner.store.clear();
        self.inner.api.clear_bearer_token();
        tracing::info!("logged out");
    }

    /// Force a logout if `err` means the bearer token expired and could not
    /// be refreshed. Returns whether a logout happened.
    pub fn logout_if_expired(&self, err: &ApiError) -> bool {
        if matches!(err, ApiError::Auth(crate::error::AuthError::TokenExpired)) {
            tracing::info!("bearer token expired, forcing logout");
            self.logout();
            return true;
        }
        false
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attempt machinery
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a login attempt: flip to `Authenticating`, remember where we
    /// came from, and take a ticket that must still be current at commit.
    fn begin_attempt(&self) -> Attempt {
        let mut cell = self.inner.cell.lock();
        cell.attempt += 1;
        let previous = std::mem::replace(&mut cell.state, SessionState::Authenticating);
        self.inner.tx.send_replace(SessionState::Authenticating);
        Attempt {
            ticket: cell.attempt,
            previous,
        }
    }

    fn commit_user(
        &self,
        attempt: Attempt,
        user: User,
        bearer: Option<SecretString>,
    ) -> Result<User, SessionError> {
        let state = match user.role {
            Role::Admin => SessionState::Admin {
                user: user.clone(),
                portal: Portal::Admin,
            },
            Role::Parent => SessionState::Parent {
                user: user.clone(),
                portal: Portal::Parent,
                selected_child: None,
            },
        };
        self.apply(attempt, state, bearer)?;
        Ok(user)
    }

    /// Install `state` if the attempt is still current, then persist and
    /// publish. A stale ticket means logout or a newer login won; the result
    /// is discarded.
    fn apply(
        &self,
        attempt: Attempt,
        state: SessionState,
        bearer: Option<SecretString>,
    ) -> Result<(), SessionError> {
        let mut cell = self.inner.cell.lock();
        if cell.attempt != attempt.ticket {
            tracing::debug!("discarding superseded login result");
            return Err(SessionError::Superseded);
        }

        cell.state = state.clone();
        cell.bearer = bearer.clone();
        self.inner.tx.send_replace(state.clone());

        match &bearer {
            Some(token) => self.inner.api.set_bearer_token(token.clone()),
            None => self.inner.api.clear_bearer_token(),
        }
        drop(cell);

        self.persist(&state, bearer.as_ref());
        Ok(())
    }

    /// Undo `Authenticating` after a failed attempt, unless something newer
    /// already took over.
    fn rollback(&self, attempt: Attempt) {
        let mut cell = self.inner.cell.lock();
        if cell.attempt != attempt.ticket {
            return;
        }
        cell.state = attempt.previous.clone();
        self.inner.tx.send_replace(attempt.previous);
    }

    /// Apply a synchronous edit to the current state, then persist and
    /// publish it.
    fn mutate_in_place(
        &self,
        edit: impl FnOnce(&mut SessionState) -> Result<(), SessionError>,
    ) -> Result<(), SessionError> {
        let mut cell = self.inner.cell.lock();
        edit(&mut cell.state)?;
        let state = cell.state.clone();
        let bearer = cell.bearer.clone();
        self.inner.tx.send_replace(state.clone());
        drop(cell);

        self.persist(&state, bearer.as_ref());
        Ok(())
    }

    fn persist(&self, state: &SessionState, bearer: Option<&SecretString>) {
        let identity = match state {
            SessionState::Parent {
                user,
                portal,
                selected_child,
            } => PersistedIdentity::User {
                user: user.clone(),
                portal: *portal,
                selected_child: selected_child.clone(),
            },
            SessionState::Admin { user, portal } => PersistedIdentity::User {
                user: user.clone(),
                portal: *portal,
                selected_child: None,
            },
            SessionState::Kid { session } => PersistedIdentity::Kid {
                session: session.clone(),
            },
            SessionState::LoggedOut | SessionState::Authenticating => return,
        };

        self.inner.store.save(&PersistedSession {
            identity,
            bearer_token: bearer.map(|t| t.expose_secret().to_owned()),
        });
    }
}

struct Attempt {
    ticket: u64,
    previous: SessionState,
}

impl std::fmt::Debug for AuthSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionManager")
            .field("state", &self.inner.cell.lock().state.name())
            .finish_non_exhaustive()
    }
}
