//! `civic list`: filtered issue table with summary counts.

use anyhow::Result;
use civic_core::AccessGuard;
use civic_core::filter::{Choice, FilterPatch};
use civic_core::model::{Category, IssueStatus};
use clap::Args;
use std::io::Write;

use crate::cmd::{write_issue_line, write_issue_row};
use crate::context::AppContext;
use crate::output::{pretty_rule, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Case-insensitive text matched against title, description and location.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Status filter: PENDING, IN_PROGRESS, RESOLVED, or ALL.
    #[arg(long)]
    pub status: Option<Choice<IssueStatus>>,

    /// Category filter (e.g. Safety), or ALL.
    #[arg(long)]
    pub category: Option<Choice<Category>>,
}

impl ListArgs {
    fn patches(&self) -> impl Iterator<Item = FilterPatch> {
        [
            self.search.clone().map(FilterPatch::search),
            self.status.map(FilterPatch::status),
            self.category.map(FilterPatch::category),
        ]
        .into_iter()
        .flatten()
    }
}

/// Execute `civic list`.
pub fn run_list(args: &ListArgs, ctx: &AppContext) -> Result<()> {
    ctx.authorize(AccessGuard::admin(), "civic list")?;
    let mut controller = ctx.mounted_controller()?;
    for patch in args.patches() {
        controller.set_filter(patch);
    }

    let snapshot = controller.snapshot();
    render_mode(
        ctx.output,
        &snapshot,
        |snap, w| {
            for issue in &snap.issues {
                write_issue_row(w, issue)?;
            }
            Ok(())
        },
        |snap, w| {
            pretty_section(
                w,
                &format!("Issues ({} of {})", snap.issues.len(), snap.stats.total),
            )?;
            if snap.issues.is_empty() {
                writeln!(w, "No issues match the current filter.")?;
            }
            for issue in &snap.issues {
                write_issue_line(w, issue)?;
            }
            pretty_rule(w)?;
            writeln!(
                w,
                "Total {}  Pending {}  In Progress {}  Resolved {}",
                snap.stats.total,
                snap.stats.pending,
                snap.stats.in_progress,
                snap.stats.resolved
            )
        },
    )
}
