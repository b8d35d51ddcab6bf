//! `civic completions`: shell completion scripts.

use anyhow::Result;
use clap::Args;
use clap_complete::Shell;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute `civic completions`, writing the script to stdout.
pub fn run_completions(args: &CompletionsArgs, mut command: clap::Command) -> Result<()> {
    write_completions(args.shell, &mut command, &mut io::stdout().lock())
}

fn write_completions(shell: Shell, command: &mut clap::Command, out: &mut dyn Write) -> Result<()> {
    let name = command.get_name().to_string();
    clap_complete::generate(shell, command, name, out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bash_script_mentions_subcommands() {
        let mut command = clap::Command::new("civic")
            .subcommand(clap::Command::new("list"))
            .subcommand(clap::Command::new("delete"));
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut command, &mut buf).unwrap();
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("civic"));
        assert!(script.contains("delete"));
    }
}
