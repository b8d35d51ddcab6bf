//! `civic login`, `civic logout`, `civic whoami`.

use anyhow::{Context, Result};
use civic_core::api::ApiError;
use civic_core::error::ErrorCode;
use civic_core::session::{clear_session, save_session};
use civic_core::{AccessGuard, Role, Session};
use clap::Args;
use serde::Serialize;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing::info;

use crate::context::{AppContext, fail};
use crate::output::{CliError, render, render_success};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username.
    #[arg(short, long)]
    pub username: String,

    /// Account password. Read from stdin when omitted.
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
struct Identity<'a> {
    username: &'a str,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

fn require_session_file(ctx: &AppContext) -> Result<PathBuf> {
    ctx.session_file().ok_or_else(|| {
        fail(
            ctx.output,
            &CliError::new("no configuration directory found; set CIVIC_CONFIG_DIR"),
        )
    })
}

fn read_password() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
        io::stderr().flush()?;
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    anyhow::ensure!(!password.is_empty(), "password must not be empty");
    Ok(password)
}

fn login_error(err: &ApiError) -> CliError {
    match err {
        ApiError::Status {
            status: 400 | 401 | 403,
            message,
        } => CliError::coded(format!("login rejected: {message}"), ErrorCode::LoginFailed),
        other => CliError::from_api(other, ErrorCode::LoginFailed),
    }
}

/// Execute `civic login`.
pub fn run_login(args: &LoginArgs, ctx: &AppContext) -> Result<()> {
    let path = require_session_file(ctx)?;
    let password = match &args.password {
        Some(password) => password.clone(),
        None => read_password()?,
    };

    let response = ctx
        .api()
        .login(args.username.trim(), &password)
        .map_err(|err| fail(ctx.output, &login_error(&err)))?;
    let email = response.email.clone();
    let session = response.into_session();

    save_session(&path, &session)?;
    ctx.session.replace(session.clone());
    info!(role = %session.role, "logged in");

    let identity = Identity {
        username: session.username.as_deref().unwrap_or_default(),
        role: session.role,
        email: email.as_deref(),
    };
    render(ctx.output, &identity, |id, w| {
        writeln!(w, "✓ Logged in as {} ({})", id.username, id.role)
    })
}

/// Execute `civic logout`.
pub fn run_logout(ctx: &AppContext) -> Result<()> {
    let path = require_session_file(ctx)?;
    let removed = clear_session(&path)?;
    ctx.session.replace(Session::anonymous());
    info!(removed, "logged out");

    if removed {
        render_success(ctx.output, "Logged out")
    } else {
        render_success(ctx.output, "No active session")
    }
}

/// Execute `civic whoami`.
pub fn run_whoami(ctx: &AppContext) -> Result<()> {
    ctx.authorize(AccessGuard::authenticated(), "civic whoami")?;
    let session = ctx.session.snapshot();
    let identity = Identity {
        username: session.username.as_deref().unwrap_or("unknown"),
        role: session.role,
        email: None,
    };
    render(ctx.output, &identity, |id, w| {
        writeln!(w, "{} ({})", id.username, id.role)
    })
}
