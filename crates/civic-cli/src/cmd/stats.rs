//! `civic stats`: counts over the whole collection.

use anyhow::Result;
use civic_core::AccessGuard;
use civic_core::model::IssueStatus;
use civic_core::stats::IssueStats;
use std::io::{self, Write};

use crate::context::AppContext;
use crate::output::{pretty_kv, pretty_section, render_mode};

/// Execute `civic stats`.
pub fn run_stats(ctx: &AppContext) -> Result<()> {
    ctx.authorize(AccessGuard::admin(), "civic stats")?;
    let controller = ctx.mounted_controller()?;
    let stats = controller.stats();
    render_mode(ctx.output, &stats, render_stats_text, render_stats_pretty)
}

fn render_stats_text(stats: &IssueStats, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "total\t{}", stats.total)?;
    for status in IssueStatus::ALL {
        writeln!(w, "{status}\t{}", stats.count(status))?;
    }
    for (category, count) in &stats.by_category {
        writeln!(w, "{category}\t{count}")?;
    }
    Ok(())
}

fn render_stats_pretty(stats: &IssueStats, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Issue statistics")?;
    pretty_kv(w, "Total", stats.total.to_string())?;
    for status in IssueStatus::ALL {
        pretty_kv(w, status.label(), stats.count(status).to_string())?;
    }

    if !stats.by_category.is_empty() {
        writeln!(w, "\nBy category:")?;
        for (category, count) in &stats.by_category {
            writeln!(w, "  {category}: {count}")?;
        }
    }
    Ok(())
}
