//! `civic set-status`: move one issue to a new status.

use anyhow::Result;
use civic_core::AccessGuard;
use civic_core::model::{IssueId, IssueStatus};
use civic_core::notice::Notice;
use clap::Args;
use serde::Serialize;

use crate::cmd::write_notices;
use crate::context::{AppContext, fail};
use crate::output::{CliError, render};

#[derive(Args, Debug)]
pub struct SetStatusArgs {
    /// Issue ID.
    pub id: String,

    /// New status: PENDING, IN_PROGRESS, or RESOLVED.
    pub status: IssueStatus,
}

#[derive(Debug, Serialize)]
struct StatusChange {
    id: IssueId,
    status: IssueStatus,
    notices: Vec<Notice>,
}

/// Execute `civic set-status`.
pub fn run_set_status(args: &SetStatusArgs, ctx: &AppContext) -> Result<()> {
    ctx.authorize(AccessGuard::admin(), "civic set-status")?;
    let mut controller = ctx.mounted_controller()?;
    let id = IssueId::new(args.id.as_str());

    controller
        .set_status(&id, args.status)
        .map_err(|err| fail(ctx.output, &CliError::from(&err)))?;

    let current = controller.issue(&id).map_or(args.status, |issue| issue.status);
    let change = StatusChange {
        id,
        status: current,
        notices: controller.drain_notices(),
    };
    render(ctx.output, &change, |change, w| write_notices(w, &change.notices))
}
