//! Session handling: durable token store, auth state machine, portal router.
//!
//! Ownership is deliberately narrow: the [`TokenStore`] is mutated only by
//! the [`AuthSessionManager`], which is also the only caller of the API
//! client's bearer-token setters. Everything else observes session state
//! through [`AuthSessionManager::subscribe`] and derives navigation from
//! [`router::reachable_views`].

pub mod manager;
pub mod router;
pub mod store;

pub use manager::{AuthSessionManager, SessionError, SessionState};
pub use router::{View, default_view, reachable_views};
pub use store::{PersistedIdentity, PersistedSession, TokenStore};
