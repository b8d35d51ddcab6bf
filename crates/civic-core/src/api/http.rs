//! Blocking REST client for the tracker API.

use serde::de::DeserializeOwned;
use std::io;

use super::{ApiError, IssueApi, LoginRequest, LoginResponse};
use crate::config::ApiConfig;
use crate::model::{Issue, IssueId, IssueStatus};
use crate::session::SessionHandle;

/// Decode a `GET /issues` reply: a bare array or a `{"data": [...]}` envelope.
///
/// Records are decoded one at a time. A record that does not fit the model
/// (an unknown status or category, a missing id) is skipped with a warning
/// so the rest of the collection still loads.
fn issues_from_payload(payload: serde_json::Value) -> Result<Vec<Issue>, ApiError> {
    let records = match payload {
        serde_json::Value::Array(records) => records,
        serde_json::Value::Object(mut envelope) => match envelope.remove("data") {
            Some(serde_json::Value::Array(records)) => records,
            _ => {
                return Err(ApiError::Decode(
                    "expected an issue array or a `data` array envelope".to_string(),
                ));
            }
        },
        other => {
            return Err(ApiError::Decode(format!(
                "expected an issue array, got {}",
                json_kind(&other)
            )));
        }
    };

    let total = records.len();
    let issues: Vec<Issue> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let id = record.get("id").map(ToString::to_string);
            serde_json::from_value::<Issue>(record)
                .inspect_err(|err| {
                    tracing::warn!(index, id = id.as_deref().unwrap_or("?"), "skipping issue record: {err}");
                })
                .ok()
        })
        .collect();

    let skipped = total - issues.len();
    if skipped > 0 {
        tracing::warn!(skipped, total, "some issue records could not be read");
    }
    Ok(issues)
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// [`IssueApi`] over HTTP, reading the bearer token from the injected session.
#[derive(Debug, Clone)]
pub struct HttpIssueApi {
    agent: ureq::Agent,
    base_url: String,
    session: SessionHandle,
}

impl HttpIssueApi {
    /// Build a client whose every call is bounded by `config.timeout_secs`.
    #[must_use]
    pub fn new(config: &ApiConfig, session: SessionHandle) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .user_agent(concat!("civic/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /auth/login`. Needs no credential.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on rejection, transport failure, or a malformed reply.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = format!("{}/auth/login", self.base_url);
        tracing::debug!(%url, username, "logging in");
        let response = self
            .agent
            .post(&url)
            .send_json(LoginRequest { username, password })
            .map_err(map_error)?;
        decode(response)
    }

    fn issue_url(&self, id: &IssueId) -> String {
        format!("{}/issues/{}", self.base_url, encode_segment(id.as_str()))
    }

    fn bearer(&self) -> Result<String, ApiError> {
        self.session
            .snapshot()
            .bearer_token()
            .map(|token| format!("Bearer {token}"))
            .ok_or(ApiError::MissingCredential)
    }
}

impl IssueApi for HttpIssueApi {
    fn fetch_issues(&self) -> Result<Vec<Issue>, ApiError> {
        let url = format!("{}/issues", self.base_url);
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &self.bearer()?)
            .set("Accept", "application/json")
            .call()
            .map_err(map_error)?;
        let issues = issues_from_payload(decode(response)?)?;
        tracing::debug!(%url, count = issues.len(), "fetched issues");
        Ok(issues)
    }

    fn update_status(&self, id: &IssueId, status: IssueStatus) -> Result<(), ApiError> {
        let url = self.issue_url(id);
        let response = self
            .agent
            .request("PATCH", &url)
            .set("Authorization", &self.bearer()?)
            .send_json(serde_json::json!({ "status": status }))
            .map_err(map_error)?;
        tracing::debug!(%url, %status, http_status = response.status(), "status updated");
        Ok(())
    }

    fn delete_issue(&self, id: &IssueId) -> Result<(), ApiError> {
        let url = self.issue_url(id);
        let response = self
            .agent
            .delete(&url)
            .set("Authorization", &self.bearer()?)
            .call()
            .map_err(map_error)?;
        tracing::debug!(%url, http_status = response.status(), "issue deleted");
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ApiError> {
    response
        .into_json::<T>()
        .map_err(|err| ApiError::Decode(err.to_string()))
}

fn map_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            ApiError::Status {
                status,
                message: error_message(&body),
            }
        }
        ureq::Error::Transport(transport) => {
            let timed_out = std::error::Error::source(&transport)
                .and_then(|source| source.downcast_ref::<io::Error>())
                .is_some_and(|io_err| {
                    matches!(io_err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
                });
            if timed_out {
                ApiError::Timeout(transport.to_string())
            } else {
                ApiError::Transport(transport.to_string())
            }
        }
    }
}

/// Pull a readable message out of an error body.
fn error_message(body: &str) -> String {
    const MAX_CHARS: usize = 200;

    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
    });

    let text = from_json.unwrap_or(body).trim();
    if text.is_empty() {
        return "no response body".to_string();
    }
    text.chars().take(MAX_CHARS).collect()
}

/// Percent-encode one path segment (RFC 3986 unreserved characters pass through).
fn encode_segment(raw: &str) -> String {
    raw.bytes().fold(String::with_capacity(raw.len()), |mut out, byte| {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Role, Session};

    #[test]
    fn payload_accepts_bare_array_and_envelope() {
        let bare = serde_json::json!([{"id": 1, "title": "a", "category": "Other", "status": "PENDING"}]);
        let envelope = serde_json::json!({"data": bare.clone()});
        let a = issues_from_payload(bare).unwrap();
        let b = issues_from_payload(envelope).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn unreadable_records_are_skipped_not_fatal() {
        let payload = serde_json::json!([
            {"id": 1, "title": "a", "category": "Other", "status": "PENDING"},
            {"id": 2, "title": "b", "category": "Other", "status": "REJECTED"},
            {"id": 3, "title": "c", "category": "Parks", "status": "RESOLVED"},
            {"id": 4, "title": "d", "category": "Safety", "status": "OPEN"}
        ]);
        let issues = issues_from_payload(payload).unwrap();
        let ids: Vec<_> = issues.iter().map(|issue| issue.id.as_str()).collect();
        assert_eq!(ids, ["1", "4"]);
        assert_eq!(issues[1].status, IssueStatus::Pending);
    }

    #[test]
    fn wrong_payload_shape_names_the_problem() {
        let err = issues_from_payload(serde_json::json!({"items": []})).unwrap_err();
        assert!(err.to_string().contains("`data`"), "got {err}");
        let err = issues_from_payload(serde_json::json!("nope")).unwrap_err();
        assert!(err.to_string().contains("got a string"), "got {err}");
    }

    #[test]
    fn error_message_prefers_json_message() {
        assert_eq!(error_message(r#"{"message":"Issue not found"}"#), "Issue not found");
        assert_eq!(error_message(r#"{"error":"Forbidden","status":403}"#), "Forbidden");
        assert_eq!(error_message("  plain text  "), "plain text");
        assert_eq!(error_message(""), "no response body");
    }

    #[test]
    fn ids_are_encoded_as_one_segment() {
        assert_eq!(encode_segment("42"), "42");
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn missing_session_is_reported_before_any_request() {
        let api = HttpIssueApi::new(&ApiConfig::default(), SessionHandle::new(Session::anonymous()));
        assert_eq!(api.fetch_issues().unwrap_err(), ApiError::MissingCredential);

        let loading = SessionHandle::new(Session::loading());
        let api = HttpIssueApi::new(&ApiConfig::default(), loading);
        assert_eq!(
            api.delete_issue(&IssueId::new("1")).unwrap_err(),
            ApiError::MissingCredential
        );
    }

    #[test]
    fn base_url_is_normalized() {
        let config = ApiConfig {
            base_url: "http://example.test/api/".to_string(),
            timeout_secs: 1,
        };
        let api = HttpIssueApi::new(&config, SessionHandle::new(Session::authenticated("a", Role::Admin, "t")));
        assert_eq!(api.base_url(), "http://example.test/api");
        assert_eq!(api.issue_url(&IssueId::new("7")), "http://example.test/api/issues/7");
    }
}
