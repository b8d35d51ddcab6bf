//! `civic show`: full detail for one issue.

use anyhow::Result;
use civic_core::AccessGuard;
use civic_core::model::{Issue, IssueId};
use clap::Args;
use std::io::{self, Write};

use crate::cmd::write_issue_row;
use crate::context::{AppContext, fail};
use crate::output::{CliError, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Issue ID.
    pub id: String,
}

/// Execute `civic show`.
pub fn run_show(args: &ShowArgs, ctx: &AppContext) -> Result<()> {
    ctx.authorize(AccessGuard::admin(), "civic show")?;
    let mut controller = ctx.mounted_controller()?;
    let issue = controller
        .view_details(&IssueId::new(args.id.as_str()))
        .map_err(|err| fail(ctx.output, &CliError::from(&err)))?;
    render_mode(ctx.output, issue, |issue, w| write_issue_row(w, issue), render_issue_pretty)
}

fn render_issue_pretty(issue: &Issue, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Issue {}: {}", issue.id, issue.title))?;
    pretty_kv(w, "Status", issue.status.label())?;
    pretty_kv(w, "Category", issue.category.as_str())?;
    pretty_kv(w, "Location", issue.location.as_deref().unwrap_or("-"))?;
    pretty_kv(w, "Reporter", issue.reporter_name())?;
    pretty_kv(w, "Reported", issue.created_on())?;
    pretty_kv(w, "Upvotes", issue.upvotes.to_string())?;
    if issue.critical {
        pretty_kv(w, "Critical", "yes")?;
    }
    if let Some(description) = issue.description.as_deref().filter(|d| !d.trim().is_empty()) {
        writeln!(w, "\n{description}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::model::{Category, IssueStatus};

    #[test]
    fn pretty_fills_missing_fields() {
        let issue = Issue {
            id: IssueId::new("12"),
            title: "Fallen tree".to_string(),
            description: Some("Blocking the bike lane".to_string()),
            location: None,
            category: Category::Environment,
            status: IssueStatus::InProgress,
            created_by: None,
            created_at: None,
            critical: true,
            upvotes: 4,
        };
        let mut buf = Vec::new();
        render_issue_pretty(&issue, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("Issue 12: Fallen tree\n"));
        assert!(text.contains("Reporter:    Unknown"));
        assert!(text.contains("Reported:    N/A"));
        assert!(text.contains("Critical:    yes"));
        assert!(text.ends_with("Blocking the bike lane\n"));
    }
}
