pub mod auth;
pub mod completions;
pub mod delete;
pub mod list;
pub mod show;
pub mod stats;
pub mod status;

use civic_core::model::Issue;
use civic_core::notice::{Notice, NoticeLevel};
use std::io::{self, Write};

/// Width of the title column in tabular issue output.
const TITLE_WIDTH: usize = 40;

/// One issue as a tab-separated row: id, status, category, title, reporter, date.
pub fn write_issue_row(w: &mut dyn Write, issue: &Issue) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}",
        issue.id,
        issue.status,
        issue.category,
        issue.title,
        issue.reporter_name(),
        issue.created_on()
    )
}

/// One issue as an aligned table line for pretty output.
pub fn write_issue_line(w: &mut dyn Write, issue: &Issue) -> io::Result<()> {
    let marker = if issue.critical { "!" } else { " " };
    writeln!(
        w,
        "{marker}{:<6} {:<12} {:<15} {:<width$} {:<12} {}",
        issue.id,
        issue.status.label(),
        issue.category,
        truncate(&issue.title, TITLE_WIDTH),
        issue.reporter_name(),
        issue.created_on(),
        width = TITLE_WIDTH
    )
}

/// Print notices raised by a controller action, one per line.
pub fn write_notices(w: &mut dyn Write, notices: &[Notice]) -> io::Result<()> {
    for notice in notices {
        match notice.level {
            NoticeLevel::Success => writeln!(w, "✓ {}", notice.message)?,
            NoticeLevel::Error => writeln!(w, "✗ {}", notice.message)?,
        }
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
