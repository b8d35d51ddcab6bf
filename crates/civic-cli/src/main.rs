#![forbid(unsafe_code)]

mod cmd;
mod context;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use context::{AppContext, Reported};
use std::env;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "civic: administer a civic issue tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Session",
        about = "Log in and store the session",
        long_about = "Authenticate against the tracker API and store the session token.",
        after_help = "EXAMPLES:\n    # Log in, reading the password from stdin\n    civic login --username admin\n\n    # Non-interactive login\n    civic login --username admin --password secret"
    )]
    Login(cmd::auth::LoginArgs),

    #[command(next_help_heading = "Session", about = "Forget the stored session")]
    Logout,

    #[command(
        next_help_heading = "Session",
        about = "Show the logged-in account",
        after_help = "EXAMPLES:\n    civic whoami\n\n    # Emit machine-readable output\n    civic whoami --json"
    )]
    Whoami,

    #[command(
        next_help_heading = "Read",
        about = "List issues",
        long_about = "Reload all issues and list the ones matching the filters, with summary counts.",
        after_help = "EXAMPLES:\n    # All issues\n    civic list\n\n    # Pending safety issues mentioning a street\n    civic list --status pending --category safety --search \"main st\"\n\n    # Emit machine-readable output\n    civic list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show issue counts",
        long_about = "Totals per status and per category over all issues, ignoring filters."
    )]
    Stats,

    #[command(
        next_help_heading = "Read",
        about = "Show one issue",
        after_help = "EXAMPLES:\n    civic show 42"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Moderation",
        about = "Change an issue's status",
        after_help = "EXAMPLES:\n    civic set-status 42 IN_PROGRESS\n    civic set-status 42 resolved"
    )]
    SetStatus(cmd::status::SetStatusArgs),

    #[command(
        next_help_heading = "Moderation",
        about = "Delete an issue",
        long_about = "Permanently delete an issue. Asks for confirmation unless --yes is given.",
        after_help = "EXAMPLES:\n    # Interactive confirmation\n    civic delete 42\n\n    # Scripted\n    civic delete 42 --yes"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Shell",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    civic completions bash\n    civic completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env("CIVIC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "civic_core=debug,civic_cli=debug,info"
        } else if quiet {
            "error"
        } else {
            "civic_core=info,civic_cli=info,warn"
        })
    });

    let format = env::var("CIVIC_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Completions need neither config nor session.
    let load = || AppContext::load(cli.json);
    match &cli.command {
        Commands::Completions(args) => cmd::completions::run_completions(args, Cli::command()),
        Commands::Login(args) => cmd::auth::run_login(args, &load()?),
        Commands::Logout => cmd::auth::run_logout(&load()?),
        Commands::Whoami => cmd::auth::run_whoami(&load()?),
        Commands::List(args) => cmd::list::run_list(args, &load()?),
        Commands::Stats => cmd::stats::run_stats(&load()?),
        Commands::Show(args) => cmd::show::run_show(args, &load()?),
        Commands::SetStatus(args) => cmd::status::run_set_status(args, &load()?),
        Commands::Delete(args) => cmd::delete::run_delete(args, &load()?),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is::<Reported>() => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
