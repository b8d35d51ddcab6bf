//! Per-invocation state: resolved config, output mode, and the session.
//!
//! The session starts out loading and settles once `session.json` (or the
//! `CIVIC_TOKEN` override) has been read. Commands then pass through an
//! [`AccessGuard`] before touching the API.

use anyhow::Result;
use civic_core::api::HttpIssueApi;
use civic_core::config::{self, CivicConfig, session_path};
use civic_core::error::ErrorCode;
use civic_core::guard::{DenyReason, Redirect};
use civic_core::session::load_session;
use civic_core::{AccessGuard, GuardDecision, IssueAdminController, Role, Session, SessionHandle};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error, resolve_output_mode};

/// Bearer token for a session that is never written to disk.
pub const TOKEN_ENV: &str = "CIVIC_TOKEN";
/// Role of the `CIVIC_TOKEN` session; defaults to `USER`.
pub const ROLE_ENV: &str = "CIVIC_ROLE";
/// Display name of the `CIVIC_TOKEN` session.
pub const USER_ENV: &str = "CIVIC_USER";

/// Marker for a failure already rendered to stderr.
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("command failed")
    }
}

impl std::error::Error for Reported {}

/// Render `error` and return the marker error for `main`.
#[must_use]
pub fn fail(output: OutputMode, error: &CliError) -> anyhow::Error {
    if let Err(render_err) = render_error(output, error) {
        return render_err.context(error.message.clone());
    }
    anyhow::Error::new(Reported)
}

pub struct AppContext {
    pub config: CivicConfig,
    pub output: OutputMode,
    pub session: SessionHandle,
    dir: Option<PathBuf>,
}

impl AppContext {
    /// Resolve config and output mode, then settle the session.
    pub fn load(json_flag: bool) -> Result<Self> {
        let dir = config::config_dir();
        let config = match config::resolve_config(dir.as_deref()) {
            Ok(config) => config,
            Err(err) => {
                let output = resolve_output_mode(json_flag, None);
                return Err(fail(
                    output,
                    &CliError::coded(format!("{err:#}"), ErrorCode::ConfigParseError),
                ));
            }
        };
        let output = resolve_output_mode(json_flag, config.output.as_deref());

        let ctx = Self {
            config,
            output,
            session: SessionHandle::new(Session::loading()),
            dir,
        };
        ctx.restore_session()?;
        Ok(ctx)
    }

    fn restore_session(&self) -> Result<()> {
        let from_env = session_from_env(
            std::env::var(TOKEN_ENV).ok(),
            std::env::var(ROLE_ENV).ok(),
            std::env::var(USER_ENV).ok(),
        );
        let session = match (from_env, self.session_file()) {
            (Some(session), _) => {
                debug!("using session from {TOKEN_ENV}");
                session
            }
            (None, Some(path)) => load_session(&path)
                .map_err(|err| fail(self.output, &CliError::new(format!("{err:#}"))))?,
            (None, None) => Session::anonymous(),
        };
        self.session.replace(session);
        Ok(())
    }

    /// `session.json` location, when a config directory could be determined.
    #[must_use]
    pub fn session_file(&self) -> Option<PathBuf> {
        self.dir.as_deref().map(session_path)
    }

    /// Run `guard` for `requested`, rendering the refusal if access is denied.
    pub fn authorize(&self, guard: AccessGuard, requested: &str) -> Result<()> {
        match guard.check(&self.session, requested) {
            GuardDecision::Grant => Ok(()),
            GuardDecision::Wait => Err(fail(
                self.output,
                &CliError::new("session is still loading; retry"),
            )),
            GuardDecision::Redirect(redirect) => Err(fail(self.output, &redirect_error(&redirect))),
        }
    }

    #[must_use]
    pub fn api(&self) -> HttpIssueApi {
        HttpIssueApi::new(&self.config.api, self.session.clone())
    }

    /// Controller with the collection already loaded.
    pub fn mounted_controller(&self) -> Result<IssueAdminController<HttpIssueApi>> {
        let mut controller = IssueAdminController::new(self.api());
        controller
            .mount()
            .map_err(|err| fail(self.output, &CliError::from(&err)))?;
        Ok(controller)
    }
}

/// Ephemeral session built from `CIVIC_TOKEN` / `CIVIC_ROLE` / `CIVIC_USER`.
fn session_from_env(
    token: Option<String>,
    role: Option<String>,
    user: Option<String>,
) -> Option<Session> {
    let token = token.filter(|t| !t.trim().is_empty())?;
    let role = role
        .as_deref()
        .and_then(|raw| raw.parse::<Role>().ok())
        .unwrap_or_default();
    let username = user
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| "token".to_string());
    Some(Session::authenticated(username, role, token.trim()))
}

fn redirect_error(redirect: &Redirect) -> CliError {
    match redirect.reason {
        DenyReason::NotAuthenticated => {
            let from = redirect.resume_from.as_deref().unwrap_or("/");
            CliError::coded(
                format!("not logged in; `{from}` requires a session"),
                ErrorCode::NotLoggedIn,
            )
        }
        DenyReason::AdminRequired => CliError::coded(
            format!("admin role required (redirected to {})", redirect.to),
            ErrorCode::AdminRequired,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::guard::{LOGIN_PATH, UNAUTHORIZED_PATH};

    #[test]
    fn env_session_requires_token() {
        assert!(session_from_env(None, Some("ADMIN".into()), None).is_none());
        assert!(session_from_env(Some("  ".into()), None, None).is_none());
    }

    #[test]
    fn env_session_defaults_to_user_role() {
        let session = session_from_env(Some("tok".into()), None, None).unwrap();
        assert_eq!(session.role, Role::User);
        assert_eq!(session.username.as_deref(), Some("token"));
        assert_eq!(session.bearer_token(), Some("tok"));

        let admin = session_from_env(Some("tok".into()), Some("admin".into()), Some("ada".into()))
            .unwrap();
        assert!(admin.is_admin());
        assert_eq!(admin.username.as_deref(), Some("ada"));
    }

    #[test]
    fn login_redirect_names_requested_command() {
        let err = redirect_error(&Redirect {
            to: LOGIN_PATH,
            reason: DenyReason::NotAuthenticated,
            resume_from: Some("/admin/issues".to_string()),
        });
        assert!(err.message.contains("/admin/issues"));
        assert_eq!(err.error_code.as_deref(), Some("E1001"));
    }

    #[test]
    fn unauthorized_redirect_is_admin_error() {
        let err = redirect_error(&Redirect {
            to: UNAUTHORIZED_PATH,
            reason: DenyReason::AdminRequired,
            resume_from: None,
        });
        assert!(err.message.contains("admin role required"));
        assert_eq!(err.error_code.as_deref(), Some("E1002"));
    }
}
