//! wildlog CLI - Entry point
//!
//! Usage: wildlog [--db <file>] [command words...]
//!
//! With no command words the interactive shell starts; otherwise the
//! words are dispatched as a single command and the process exits.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wildlog::command::{dispatch, Context, Mode, Outcome, Registry};
use wildlog::{shell, CommandHistory, Config, Database};

#[derive(Parser)]
#[command(name = "wildlog", version, about = "Personal wildlife sighting records")]
struct Cli {
    /// Database file (defaults to .wildlog/wildlog.db, walking up from
    /// the current directory, then ~/.wildlog/wildlog.db)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=wildlog=debug)
    #[arg(short, long)]
    verbose: bool,

    /// Command to run, e.g. `add category Birds`. Omit it (or use
    /// `interactive`) to start the shell.
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("wildlog=debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    let config = Config::load()?;

    let db_path = cli.db.unwrap_or_else(|| config.database_path());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let db = Database::open(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;

    let history = CommandHistory::open(config.history_path())?;
    let registry = Registry::standard();
    let mut ctx = Context {
        db,
        config,
        history,
        mode: Mode::CommandLine,
    };

    if cli.command.is_empty() {
        shell::run(&registry, &mut ctx)?;
        return Ok(());
    }

    // Re-quote multi-word arguments so dispatch tokenizes them back
    let line = cli
        .command
        .iter()
        .map(|word| {
            if word.contains(char::is_whitespace) {
                format!("\"{}\"", word)
            } else {
                word.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    match dispatch(&registry, &mut ctx, &line)? {
        Outcome::EnterShell => shell::run(&registry, &mut ctx)?,
        Outcome::Done | Outcome::Exit => {}
    }

    Ok(())
}
