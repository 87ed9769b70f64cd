//! Interactive shell
//!
//! A read-dispatch loop over stdin. `!n` re-runs history entry `n`;
//! dispatched lines are appended to the history afterwards, except
//! lines that never parsed as a command, history housekeeping and
//! `exit`, which only add noise on recall.

use std::io::{self, BufRead, Write};

use colored::Colorize;
use tracing::debug;

use crate::command::{dispatch, tokenize, Context, Mode, Outcome, Registry};
use crate::error::{Error, Result};

const PROMPT: &str = "wildlog> ";

pub fn run(registry: &Registry, ctx: &mut Context) -> Result<()> {
    ctx.mode = Mode::Interactive;
    println!("Type 'help' for the command list, 'exit' to leave");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", PROMPT);
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            // EOF behaves like exit
            println!();
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let line = match expand_recall(ctx, line.trim()) {
            Ok(expanded) => expanded,
            Err(error) => {
                println!("{}", error.to_string().red());
                continue;
            }
        };

        let result = dispatch(registry, ctx, &line);
        if should_record(&line, &result) {
            ctx.history.add(&line)?;
        }

        match result {
            Ok(Outcome::Exit) => break,
            Ok(_) => {}
            Err(error) => {
                debug!(%error, command = %line, "command failed");
                println!("{}", error.to_string().red());
            }
        }
    }

    Ok(())
}

/// Rewrite `!n` to history entry `n`, echoing the recalled line the way
/// a shell does. Anything else passes through unchanged.
fn expand_recall(ctx: &Context, line: &str) -> Result<String> {
    let Some(reference) = line.strip_prefix('!') else {
        return Ok(line.to_string());
    };

    let index: usize = reference
        .trim()
        .parse()
        .map_err(|_| crate::error::Error::InvalidIdentifier(reference.trim().to_string()))?;
    let recalled = ctx.history.get(index)?.to_string();
    println!("{}", recalled);
    Ok(recalled)
}

/// History and exit lines are not worth recalling, and a line that
/// never resolved to a command must not be recallable either. Domain
/// failures (a lookup that missed, a guarded delete) still record: the
/// line itself was a valid command.
fn should_record(line: &str, result: &Result<Outcome>) -> bool {
    if matches!(result, Err(Error::UnknownCommand(_))) {
        return false;
    }
    let tokens = tokenize(line);
    !tokens.first().is_some_and(|name| {
        name.eq_ignore_ascii_case("history") || name.eq_ignore_ascii_case("exit")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandHistory;
    use crate::config::Config;
    use crate::db::Database;
    use crate::error::Error;

    fn context() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let history = CommandHistory::open(dir.path().join("history.txt")).unwrap();
        let ctx = Context {
            db: Database::open_memory().unwrap(),
            config: Config::default(),
            history,
            mode: Mode::Interactive,
        };
        (dir, ctx)
    }

    #[test]
    fn test_expand_recall() -> Result<()> {
        let (_dir, mut ctx) = context();
        ctx.history.add("list categories")?;

        assert_eq!(expand_recall(&ctx, "!1")?, "list categories");
        assert_eq!(expand_recall(&ctx, "help")?, "help");

        let result = expand_recall(&ctx, "!9");
        assert!(matches!(result, Err(Error::InvalidHistoryEntry(9))));

        let result = expand_recall(&ctx, "!abc");
        assert!(matches!(result, Err(Error::InvalidIdentifier(_))));

        Ok(())
    }

    #[test]
    fn test_should_record() {
        let done: Result<Outcome> = Ok(Outcome::Done);
        assert!(should_record("add category Birds", &done));
        assert!(should_record("list sightings", &done));
        assert!(!should_record("history", &done));
        assert!(!should_record("history clear", &done));
        assert!(!should_record("exit", &done));
        assert!(!should_record("HISTORY", &done));

        // A line that never resolved to a command is not recallable
        let unknown: Result<Outcome> = Err(Error::UnknownCommand("tabulate".to_string()));
        assert!(!should_record("tabulate the database", &unknown));

        // A command that failed on its domain still is
        let missing: Result<Outcome> = Err(Error::not_found("category", "Mammals"));
        assert!(should_record("delete category Mammals", &missing));
    }

    #[test]
    fn test_unknown_command_stays_out_of_history() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        for line in ["tabulate the database", "add category Birds"] {
            let result = dispatch(&registry, &mut ctx, line);
            if should_record(line, &result) {
                ctx.history.add(line)?;
            }
        }

        assert_eq!(ctx.history.count(), 1);
        assert_eq!(ctx.history.get(1)?, "add category Birds");

        Ok(())
    }
}
