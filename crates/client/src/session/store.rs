//! Durable session persistence.
//!
//! One small JSON file per key under the state directory, so partial writes
//! can never corrupt unrelated keys. Writes go through a temp file in the
//! same directory followed by an atomic rename; readers see either the old
//! value or the new one, never a torn write.
//!
//! The store is fail-open: a missing, unreadable, or corrupt file reads as
//! "no stored session" and the user simply logs in again. Errors are logged
//! at debug level and swallowed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use kidsgpt_core::{Portal, Role};

use crate::api::types::{ChildWithStats, KidSession, User};

mod keys {
    pub const CURRENT_USER: &str = "current_user";
    pub const PORTAL: &str = "portal";
    pub const SELECTED_CHILD: &str = "selected_child";
    pub const KID_SESSION: &str = "kid_session";
    pub const BEARER_TOKEN: &str = "bearer_token";

    pub const ALL: &[&str] = &[CURRENT_USER, PORTAL, SELECTED_CHILD, KID_SESSION, BEARER_TOKEN];
}

/// Who the stored session belongs to.
///
/// Exactly one variant is ever on disk: saving a user session removes any
/// kid-session keys and vice versa, so a restore can never see both.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistedIdentity {
    /// A parent or admin account, with its last portal and child selection.
    User {
        user: User,
        portal: Portal,
        selected_child: Option<Box<ChildWithStats>>,
    },
    /// A kid PIN session.
    Kid { session: KidSession },
}

/// Everything the store persists between launches.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedSession {
    pub identity: PersistedIdentity,
    /// Raw bearer token, if the login flow produced one. Stored device-local
    /// only.
    pub bearer_token: Option<String>,
}

/// File-backed session store.
#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: PathBuf,
}

impl TokenStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the session files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a session, replacing whatever was stored before.
    ///
    /// Failures are logged and swallowed; the in-memory session stays
    /// authoritative either way.
    pub fn save(&self, session: &PersistedSession) {
        if let Err(err) = self.try_save(session) {
            tracing::debug!(error = %err, dir = %self.dir.display(), "failed to persist session");
        }
    }

    fn try_save(&self, session: &PersistedSession) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        match &session.identity {
            PersistedIdentity::User {
                user,
                portal,
                selected_child,
            } => {
                self.write_key(keys::CURRENT_USER, user)?;
                self.write_key(keys::PORTAL, portal)?;
                match selected_child {
                    Some(child) => self.write_key(keys::SELECTED_CHILD, child.as_ref())?,
                    None => self.remove_key(keys::SELECTED_CHILD),
                }
                self.remove_key(keys::KID_SESSION);
            }
            PersistedIdentity::Kid { session } => {
                self.write_key(keys::KID_SESSION, session)?;
                self.remove_key(keys::CURRENT_USER);
                self.remove_key(keys::PORTAL);
                self.remove_key(keys::SELECTED_CHILD);
            }
        }

        match &session.bearer_token {
            Some(token) => self.write_key(keys::BEARER_TOKEN, token)?,
            None => self.remove_key(keys::BEARER_TOKEN),
        }

        Ok(())
    }

    /// Load the stored session, if any.
    ///
    /// Returns `None` when nothing is stored or the stored data cannot be
    /// read back. A kid session takes precedence if both somehow exist.
    #[must_use]
    pub fn load(&self) -> Option<PersistedSession> {
        let bearer_token = self.read_key::<String>(keys::BEARER_TOKEN);

        if let Some(session) = self.read_key::<KidSession>(keys::KID_SESSION) {
            return Some(PersistedSession {
                identity: PersistedIdentity::Kid { session },
                bearer_token,
            });
        }

        let user = self.read_key::<User>(keys::CURRENT_USER)?;
        let portal = self
            .read_key::<Portal>(keys::PORTAL)
            .unwrap_or(match user.role {
                Role::Admin => Portal::Admin,
                Role::Parent => Portal::Parent,
            });
        let selected_child = self
            .read_key::<ChildWithStats>(keys::SELECTED_CHILD)
            .map(Box::new);

        Some(PersistedSession {
            identity: PersistedIdentity::User {
                user,
                portal,
                selected_child,
            },
            bearer_token,
        })
    }

    /// Remove every stored key. Used on logout.
    pub fn clear(&self) {
        for key in keys::ALL {
            self.remove_key(key);
        }
    }

    fn write_key<T: Serialize>(&self, key: &str, value: &T) -> io::Result<()> {
        let json = serde_json::to_vec(value)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.persist(self.path(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn read_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = fs::read(self.path(key)).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(key, error = %err, "stored session key is corrupt, ignoring");
                None
            }
        }
    }

    fn remove_key(&self, key: &str) {
        let _ = fs::remove_file(self.path(key));
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::Utc;

    use kidsgpt_core::{ChildId, Email, Pin, SubscriptionTier, UserId};

    use crate::api::types::Child;

    fn store() -> (tempfile::TempDir, TokenStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path());
        (dir, store)
    }

    fn parent_user() -> User {
        User {
            id: UserId::new(1),
            email: "parent@example.com".parse::<Email>().unwrap(),
            display_name: Some("Sam".to_string()),
            role: Role::Parent,
            subscription_tier: SubscriptionTier::Free,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn child_with_stats() -> ChildWithStats {
        ChildWithStats {
            child: Child {
                id: ChildId::new(3),
                parent_id: UserId::new(1),
                name: "Maya".to_string(),
                age: 8,
                login_pin: "482916".parse::<Pin>().unwrap(),
                avatar_id: Some("fox".to_string()),
                interests: None,
                learning_goals: None,
                daily_message_limit: 50,
                messages_today: 12,
                last_message_date: None,
                is_active: true,
                created_at: Utc::now(),
            },
            total_conversations: 4,
            total_messages: 87,
            can_send_message: true,
        }
    }

    fn kid_session() -> KidSession {
        KidSession {
            child_id: ChildId::new(3),
            child_name: "Maya".to_string(),
            age: 8,
            avatar_id: Some("fox".to_string()),
            daily_limit: 50,
            messages_remaining: 38,
            can_send_message: true,
            parent_name: Some("Sam".to_string()),
        }
    }

    #[test]
    fn test_empty_store_loads_none() {
        let (_dir, store) = store();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_user_session_roundtrip() {
        let (_dir, store) = store();
        let session = PersistedSession {
            identity: PersistedIdentity::User {
                user: parent_user(),
                portal: Portal::Parent,
                selected_child: Some(Box::new(child_with_stats())),
            },
            bearer_token: Some("tok-1".to_string()),
        };

        store.save(&session);
        assert_eq!(store.load().unwrap(), session);
    }

    #[test]
    fn test_kid_session_roundtrip() {
        let (_dir, store) = store();
        let session = PersistedSession {
            identity: PersistedIdentity::Kid {
                session: kid_session(),
            },
            bearer_token: None,
        };

        store.save(&session);
        assert_eq!(store.load().unwrap(), session);
    }

    #[test]
    fn test_saving_kid_session_evicts_user_session() {
        let (_dir, store) = store();
        store.save(&PersistedSession {
            identity: PersistedIdentity::User {
                user: parent_user(),
                portal: Portal::Parent,
                selected_child: Some(Box::new(child_with_stats())),
            },
            bearer_token: Some("tok-1".to_string()),
        });

        let kid = PersistedSession {
            identity: PersistedIdentity::Kid {
                session: kid_session(),
            },
            bearer_token: None,
        };
        store.save(&kid);

        let loaded = store.load().unwrap();
        assert_eq!(loaded, kid);
        assert!(!store.dir().join("current_user.json").exists());
        assert!(!store.dir().join("bearer_token.json").exists());
    }

    #[test]
    fn test_saving_without_child_removes_stale_selection() {
        let (_dir, store) = store();
        store.save(&PersistedSession {
            identity: PersistedIdentity::User {
                user: parent_user(),
                portal: Portal::Parent,
                selected_child: Some(Box::new(child_with_stats())),
            },
            bearer_token: None,
        });

        let without_child = PersistedSession {
            identity: PersistedIdentity::User {
                user: parent_user(),
                portal: Portal::Parent,
                selected_child: None,
            },
            bearer_token: None,
        };
        store.save(&without_child);

        let loaded = store.load().unwrap();
        match loaded.identity {
            PersistedIdentity::User { selected_child, .. } => assert!(selected_child.is_none()),
            PersistedIdentity::Kid { .. } => panic!("expected user identity"),
        }
    }

    #[test]
    fn test_corrupt_user_file_loads_none() {
        let (_dir, store) = store();
        store.save(&PersistedSession {
            identity: PersistedIdentity::User {
                user: parent_user(),
                portal: Portal::Parent,
                selected_child: None,
            },
            bearer_token: None,
        });

        fs::write(store.dir().join("current_user.json"), b"{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_portal_falls_back_to_role_default() {
        let (_dir, store) = store();
        store.save(&PersistedSession {
            identity: PersistedIdentity::User {
                user: parent_user(),
                portal: Portal::Kids,
                selected_child: None,
            },
            bearer_token: None,
        });

        fs::write(store.dir().join("portal.json"), b"\"moon\"").unwrap();
        match store.load().unwrap().identity {
            PersistedIdentity::User { portal, .. } => assert_eq!(portal, Portal::Parent),
            PersistedIdentity::Kid { .. } => panic!("expected user identity"),
        }
    }

    #[test]
    fn test_clear_removes_everything() {
        let (_dir, store) = store();
        store.save(&PersistedSession {
            identity: PersistedIdentity::User {
                user: parent_user(),
                portal: Portal::Parent,
                selected_child: Some(Box::new(child_with_stats())),
            },
            bearer_token: Some("tok-1".to_string()),
        });

        store.clear();
        assert!(store.load().is_none());
        assert!(!store.dir().join("bearer_token.json").exists());
    }
}
