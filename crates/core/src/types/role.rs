//! Closed enums for roles, subscription tiers, portals, and message roles.
//!
//! The backend transmits these as `snake_case` strings. `Role` is the one
//! value historically compared case-insensitively at every call site in the
//! old clients; here the normalization happens exactly once, at the serde
//! boundary, and unknown strings are a decode error.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Account role for parent/admin users.
///
/// Kids never carry a role; they authenticate with a [`crate::Pin`] and get
/// a separate kid session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular parent account.
    Parent,
    /// Platform administrator.
    Admin,
}

impl Role {
    /// Whether this role may enter the admin portal.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => write!(f, "parent"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Normalize once here; everywhere else compares enum variants.
        match s.to_ascii_lowercase().as_str() {
            "parent" => Ok(Self::Parent),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Subscription tier for a parent account.
///
/// Tier gating (how many children, daily limits) is enforced server-side;
/// clients only display it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Basic,
    Premium,
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Basic => write!(f, "basic"),
            Self::Premium => write!(f, "premium"),
        }
    }
}

impl std::str::FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "basic" => Ok(Self::Basic),
            "premium" => Ok(Self::Premium),
            _ => Err(format!("invalid subscription tier: {s}")),
        }
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Written by the child.
    Child,
    /// Written by the AI assistant.
    Assistant,
}

/// One of the three top-level experiences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Portal {
    /// Kid chat experience.
    Kids,
    /// Parent dashboard.
    Parent,
    /// Admin panel.
    Admin,
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kids => write!(f, "kids"),
            Self::Parent => write!(f, "parent"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Portal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kids" => Ok(Self::Kids),
            "parent" => Ok(Self::Parent),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid portal: {s}")),
        }
    }
}
