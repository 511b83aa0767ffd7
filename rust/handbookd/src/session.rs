//! One-shot session check run when the handbook page mounts.
//!
//! The page never writes to the store. The login flow, the settings screen
//! and logout own the keys; here they are only read through a
//! [`SessionProvider`].

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db;

/// Cached profile written by the login flow. Only `department` is read here;
/// everything else is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(flatten)]
    pub profile: serde_json::Map<String, serde_json::Value>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("stored user record is invalid: {0}")]
    RecordInvalid(String),

    #[error("local store unavailable: {0}")]
    StoreUnavailable(String),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::RecordInvalid(_) => "record_invalid",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

pub trait SessionProvider {
    fn current_user(&self) -> Result<Option<UserRecord>, SessionError>;
    fn is_online(&self) -> bool;
    fn is_anonymous_mode_enabled(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Access {
    Authorized,
    RedirectToLogin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub access: Access,
    pub user: Option<UserRecord>,
    pub online: bool,
    /// Anonymous offline mode was in effect (offline and the flag set).
    pub anonymous: bool,
    /// A stored record that could not be used and was treated as absent.
    pub recovered: Option<SessionError>,
}

impl Resolution {
    pub fn is_authorized(&self) -> bool {
        self.access == Access::Authorized
    }
}

pub fn resolve(provider: &dyn SessionProvider) -> Resolution {
    let online = provider.is_online();

    if !online && provider.is_anonymous_mode_enabled() {
        tracing::info!(online, anonymous = true, access = "authorized", "session resolved");
        return Resolution {
            access: Access::Authorized,
            user: None,
            online,
            anonymous: true,
            recovered: None,
        };
    }

    let (user, recovered) = match provider.current_user() {
        Ok(user) => (user, None),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unusable user record");
            (None, Some(e))
        }
    };

    // Offline visitors always get in; the page may be served from a local cache.
    let access = if online && user.is_none() {
        Access::RedirectToLogin
    } else {
        Access::Authorized
    };

    tracing::info!(
        online,
        anonymous = false,
        access = ?access,
        has_user = user.is_some(),
        "session resolved"
    );

    Resolution {
        access,
        user,
        online,
        anonymous: false,
        recovered,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub user: String,
    pub anonymous_mode: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            user: "user".to_string(),
            anonymous_mode: "anonymousOfflineMode".to_string(),
        }
    }
}

/// Reads the session inputs from the workspace's local store. Connectivity is
/// supplied by the shell and sampled once.
pub struct StoreSessionProvider<'a> {
    conn: &'a Connection,
    keys: &'a StoreKeys,
    online: bool,
}

impl<'a> StoreSessionProvider<'a> {
    pub fn new(conn: &'a Connection, keys: &'a StoreKeys, online: bool) -> Self {
        Self { conn, keys, online }
    }
}

impl SessionProvider for StoreSessionProvider<'_> {
    fn current_user(&self) -> Result<Option<UserRecord>, SessionError> {
        let raw = db::store_get(self.conn, &self.keys.user)
            .map_err(|e| SessionError::StoreUnavailable(e.to_string()))?;
        match raw {
            None => Ok(None),
            Some(s) => serde_json::from_str::<UserRecord>(&s)
                .map(Some)
                .map_err(|e| SessionError::RecordInvalid(e.to_string())),
        }
    }

    fn is_online(&self) -> bool {
        self.online
    }

    fn is_anonymous_mode_enabled(&self) -> bool {
        match db::store_get(self.conn, &self.keys.anonymous_mode) {
            Ok(v) => v.as_deref() == Some("true"),
            Err(e) => {
                tracing::warn!(error = %e, "could not read anonymous mode flag");
                false
            }
        }
    }
}
