//! Route access guard.
//!
//! A pure decision over the current [`Session`] and the requested location.
//! It never touches the network and is re-evaluated on every check, so a
//! logout revokes access at the very next evaluation.

use serde::Serialize;

use crate::session::{Session, SessionHandle};

/// Login entry point. Redirects here carry the requested location.
pub const LOGIN_PATH: &str = "/login";
/// Terminal view for authenticated users lacking the required role.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Why a redirect was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NotAuthenticated,
    AdminRequired,
}

/// Navigation instruction produced when access is refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub to: &'static str,
    pub reason: DenyReason,
    /// Location to resume after logging in. Only set for login redirects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_from: Option<String>,
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Session still loading; show a neutral waiting state.
    Wait,
    Redirect(Redirect),
    Grant,
}

impl GuardDecision {
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Grant)
    }
}

/// Gate in front of a protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessGuard {
    requires_admin: bool,
}

impl AccessGuard {
    #[must_use]
    pub const fn new(requires_admin: bool) -> Self {
        Self { requires_admin }
    }

    /// Guard for views any logged-in user may enter.
    #[must_use]
    pub const fn authenticated() -> Self {
        Self::new(false)
    }

    /// Guard for admin-only views.
    #[must_use]
    pub const fn admin() -> Self {
        Self::new(true)
    }

    #[must_use]
    pub const fn requires_admin(&self) -> bool {
        self.requires_admin
    }

    /// Decide whether `requested` may be entered under `session`.
    #[must_use]
    pub fn evaluate(&self, session: &Session, requested: &str) -> GuardDecision {
        if session.is_loading {
            return GuardDecision::Wait;
        }

        if !session.is_authenticated {
            return GuardDecision::Redirect(Redirect {
                to: LOGIN_PATH,
                reason: DenyReason::NotAuthenticated,
                resume_from: Some(requested.to_string()),
            });
        }

        if self.requires_admin && !session.is_admin() {
            return GuardDecision::Redirect(Redirect {
                to: UNAUTHORIZED_PATH,
                reason: DenyReason::AdminRequired,
                resume_from: None,
            });
        }

        GuardDecision::Grant
    }

    /// Evaluate against the handle's current snapshot.
    #[must_use]
    pub fn check(&self, session: &SessionHandle, requested: &str) -> GuardDecision {
        let decision = self.evaluate(&session.snapshot(), requested);
        tracing::debug!(requested, requires_admin = self.requires_admin, ?decision, "guard evaluated");
        decision
    }
}
