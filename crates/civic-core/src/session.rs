//! Authenticated session state, injected into the guard and the API client.
//!
//! The session is owned by the auth collaborator. Everything here reads it
//! through a [`SessionHandle`]; nothing caches a verdict derived from it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::model::ParseEnumError;

/// Account role as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.strip_prefix("ROLE_").unwrap_or(&normalized) {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(ParseEnumError {
                expected: "role",
                got: s.to_string(),
            }),
        }
    }
}

/// Snapshot of the auth collaborator's state.
///
/// While `is_loading` is set, `is_authenticated` and `role` carry no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Session {
    /// Session whose state has not settled yet.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    /// Settled session with nobody logged in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(username: impl Into<String>, role: Role, token: impl Into<String>) -> Self {
        Self {
            is_loading: false,
            is_authenticated: true,
            role,
            username: Some(username.into()),
            token: Some(token.into()),
        }
    }

    /// Settled and logged in.
    #[must_use]
    pub const fn is_settled_authenticated(&self) -> bool {
        !self.is_loading && self.is_authenticated
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_settled_authenticated() && matches!(self.role, Role::Admin)
    }

    /// Bearer credential for remote calls, only for a settled, authenticated session.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        if self.is_settled_authenticated() {
            self.token.as_deref().filter(|t| !t.is_empty())
        } else {
            None
        }
    }
}

/// Shared, observable reference to the current [`Session`].
///
/// Cloning yields another handle onto the same state. Every replacement bumps
/// a version counter so observers can tell the session changed.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Session>>,
    version: Arc<AtomicU64>,
}

impl SessionHandle {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the session wholesale.
    pub fn replace(&self, session: Session) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = session;
        self.version.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(version = self.version(), "session replaced");
    }

    /// Monotonic change counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

/// On-disk form of a session obtained through `civic login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredSession {
    username: String,
    role: Role,
    token: String,
}

/// Load a persisted session. A missing file yields an anonymous session.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_session(path: &Path) -> Result<Session> {
    if !path.exists() {
        return Ok(Session::anonymous());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let stored: StoredSession = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(Session::authenticated(stored.username, stored.role, stored.token))
}

/// Persist an authenticated session.
///
/// # Errors
///
/// Returns an error if the session is not authenticated or cannot be written.
pub fn save_session(path: &Path, session: &Session) -> Result<()> {
    let (Some(username), Some(token)) = (session.username.clone(), session.token.clone()) else {
        anyhow::bail!("only an authenticated session with a token can be saved");
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let stored = StoredSession {
        username,
        role: session.role,
        token,
    };
    let content = serde_json::to_string_pretty(&stored)?;
    write_private(path, content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Write `content` readable by the owner only; the file holds a bearer token.
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // `mode` only applies on creation; tighten a file left by an older save.
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content)
}

/// Remove a persisted session. Returns whether a file was removed.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_session(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    Ok(true)
}
