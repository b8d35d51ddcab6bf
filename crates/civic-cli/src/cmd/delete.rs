//! `civic delete`: permanently remove an issue after confirmation.
//!
//! Without `--yes` the user is asked `[y/N]` on stderr. When stdin is not a
//! terminal there is nobody to ask, so the deletion is declined.

use anyhow::Result;
use civic_core::AccessGuard;
use civic_core::controller::{ConfirmDelete, PreConfirmed};
use civic_core::model::IssueId;
use civic_core::notice::Notice;
use clap::Args;
use serde::Serialize;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::warn;

use crate::cmd::write_notices;
use crate::context::{AppContext, fail};
use crate::output::{CliError, render};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Issue ID.
    pub id: String,

    /// Skip the interactive confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// Asks on stderr and reads the answer from stdin.
struct PromptConfirm;

impl ConfirmDelete for PromptConfirm {
    fn confirm_delete(&mut self, id: &IssueId, title: Option<&str>) -> bool {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            warn!(issue = %id, "stdin is not a terminal; declining delete without --yes");
            return false;
        }
        ask(&mut stdin.lock(), &mut io::stderr(), id, title).unwrap_or(false)
    }
}

fn ask(
    input: &mut dyn BufRead,
    prompt: &mut dyn Write,
    id: &IssueId,
    title: Option<&str>,
) -> io::Result<bool> {
    match title {
        Some(title) => write!(prompt, "Delete issue {id} '{title}'? [y/N] ")?,
        None => write!(prompt, "Delete issue {id}? [y/N] ")?,
    }
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[derive(Debug, Serialize)]
struct DeleteOutcome {
    id: IssueId,
    deleted: bool,
    notices: Vec<Notice>,
}

/// Execute `civic delete`.
pub fn run_delete(args: &DeleteArgs, ctx: &AppContext) -> Result<()> {
    ctx.authorize(AccessGuard::admin(), "civic delete")?;
    let mut controller = ctx.mounted_controller()?;
    let id = IssueId::new(args.id.as_str());

    let result = if args.yes {
        controller.delete_issue(&id, PreConfirmed)
    } else {
        controller.delete_issue(&id, PromptConfirm)
    };
    result.map_err(|err| fail(ctx.output, &CliError::from(&err)))?;

    let outcome = DeleteOutcome {
        id,
        deleted: true,
        notices: controller.drain_notices(),
    };
    render(ctx.output, &outcome, |outcome, w| write_notices(w, &outcome.notices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(reply: &str, title: Option<&str>) -> (bool, String) {
        let mut input = Cursor::new(reply.as_bytes().to_vec());
        let mut prompt = Vec::new();
        let confirmed = ask(&mut input, &mut prompt, &IssueId::new("5"), title).unwrap();
        (confirmed, String::from_utf8(prompt).unwrap())
    }

    #[test]
    fn yes_answers_confirm() {
        assert!(answer("y\n", None).0);
        assert!(answer("YES\n", None).0);
    }

    #[test]
    fn anything_else_declines() {
        assert!(!answer("\n", None).0);
        assert!(!answer("n\n", None).0);
        assert!(!answer("", None).0);
    }

    #[test]
    fn prompt_names_issue() {
        let (_, prompt) = answer("n\n", Some("Pothole"));
        assert_eq!(prompt, "Delete issue 5 'Pothole'? [y/N] ");
    }
}
