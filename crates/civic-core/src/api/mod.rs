//! Remote issue API seam.
//!
//! [`IssueApi`] is the contract the controller drives; [`http::HttpIssueApi`]
//! implements it over the tracker's REST endpoints.

pub mod http;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::model::{Issue, IssueId, IssueStatus};
use crate::session::{Role, Session};

pub use http::HttpIssueApi;

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("no session credential available")]
    MissingCredential,
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Machine-readable code for a failed call made during `context`.
    #[must_use]
    pub const fn code(&self, context: ErrorCode) -> ErrorCode {
        match self {
            Self::MissingCredential | Self::Status { status: 401, .. } => ErrorCode::NotLoggedIn,
            Self::Status { status: 403, .. } => ErrorCode::AdminRequired,
            Self::Status { status: 404, .. } => ErrorCode::IssueNotFound,
            Self::Timeout(_) => ErrorCode::RequestTimedOut,
            _ => context,
        }
    }
}

/// Operations the admin controller needs from the remote store.
///
/// Every call carries the session's bearer credential; implementations never
/// acquire or refresh tokens themselves.
pub trait IssueApi {
    /// `GET /issues`: the full collection, unfiltered and unpaginated.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the call fails or the body is not an issue list.
    fn fetch_issues(&self) -> Result<Vec<Issue>, ApiError>;

    /// `PATCH /issues/{id}` with `{"status": ...}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the remote update fails.
    fn update_status(&self, id: &IssueId, status: IssueStatus) -> Result<(), ApiError>;

    /// `DELETE /issues/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the remote delete fails.
    fn delete_issue(&self, id: &IssueId) -> Result<(), ApiError>;
}

impl<T: IssueApi + ?Sized> IssueApi for &T {
    fn fetch_issues(&self) -> Result<Vec<Issue>, ApiError> {
        (**self).fetch_issues()
    }

    fn update_status(&self, id: &IssueId, status: IssueStatus) -> Result<(), ApiError> {
        (**self).update_status(id, status)
    }

    fn delete_issue(&self, id: &IssueId) -> Result<(), ApiError> {
        (**self).delete_issue(id)
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Reply of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl LoginResponse {
    /// Settled session for this login. Unknown or missing roles map to `USER`.
    #[must_use]
    pub fn into_session(self) -> Session {
        let role = self
            .role
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(Role::User);
        Session::authenticated(self.username, role, self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_refine_error_code() {
        let unauthorized = ApiError::Status {
            status: 401,
            message: String::new(),
        };
        assert_eq!(unauthorized.code(ErrorCode::FetchFailed), ErrorCode::NotLoggedIn);

        let server = ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(server.code(ErrorCode::MutationFailed), ErrorCode::MutationFailed);
        assert_eq!(
            ApiError::Timeout("30s".to_string()).code(ErrorCode::FetchFailed),
            ErrorCode::RequestTimedOut
        );
    }

    #[test]
    fn login_response_maps_role() {
        let raw = r#"{"token":"t","username":"ada","email":"a@x","firstName":"Ada","lastName":"L","role":"ADMIN"}"#;
        let session = serde_json::from_str::<LoginResponse>(raw).unwrap().into_session();
        assert!(session.is_admin());
        assert_eq!(session.bearer_token(), Some("t"));

        let raw = r#"{"token":"t","username":"bob","role":"SUPERVISOR"}"#;
        let session = serde_json::from_str::<LoginResponse>(raw).unwrap().into_session();
        assert_eq!(session.role, Role::User);
    }
}
