//! Session commands: history, settings, connection, help, exit,
//! interactive, update

use colored::Colorize;

use crate::command::{Command, Context, Mode, Outcome, Registry};
use crate::error::{Error, Result};

/// ```text
/// history            list entries
/// history <n>        show one entry
/// history clear      forget everything
/// history location   where the file lives
/// ```
///
/// Recall itself (`!n`) is handled by the shell before dispatch.
pub struct HistoryCommand;

impl Command for HistoryCommand {
    fn name(&self) -> &'static str {
        "history"
    }

    fn mode(&self) -> Mode {
        Mode::Interactive
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (0, 1)
    }

    fn usage(&self) -> &'static str {
        "history [n|clear|location]"
    }

    fn summary(&self) -> &'static str {
        "Show, recall or clear the command history"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        match args.first().map(|a| a.to_lowercase()) {
            None => {
                if ctx.history.count() == 0 {
                    println!("{}", "History is empty".yellow());
                } else {
                    println!("{}", ctx.history.list());
                }
            }
            Some(arg) if arg == "clear" => {
                ctx.history.clear()?;
                println!("History cleared");
            }
            Some(arg) if arg == "location" => {
                println!("{}", ctx.history.location().display());
            }
            Some(arg) => {
                let index: usize = arg
                    .parse()
                    .map_err(|_| Error::InvalidIdentifier(arg.clone()))?;
                println!("{}", ctx.history.get(index)?);
            }
        }

        Ok(Outcome::Done)
    }
}

/// ```text
/// settings [list]             show current settings
/// settings location <name>    default location for sighting entry
/// settings clear              forget the default location
/// settings pagesize <n>       list page size (0 shows everything)
/// ```
pub struct SettingsCommand;

impl Command for SettingsCommand {
    fn name(&self) -> &'static str {
        "settings"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (0, 2)
    }

    fn usage(&self) -> &'static str {
        "settings [list | location <name> | clear | pagesize <n>]"
    }

    fn summary(&self) -> &'static str {
        "Show or change the stored settings"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        match args {
            [] => {
                print_settings(ctx);
                return Ok(Outcome::Done);
            }
            [keyword] if keyword.eq_ignore_ascii_case("list") => {
                print_settings(ctx);
                return Ok(Outcome::Done);
            }
            [keyword] if keyword.eq_ignore_ascii_case("clear") => {
                ctx.config.defaults.location = None;
                println!("Default location cleared");
            }
            [keyword, value] if keyword.eq_ignore_ascii_case("location") => {
                ctx.config.defaults.location = Some(value.clone());
                println!("Default location is now {}", value.green());
            }
            [keyword, value] if keyword.eq_ignore_ascii_case("pagesize") => {
                let size: usize = value
                    .parse()
                    .map_err(|_| Error::InvalidIdentifier(value.clone()))?;
                ctx.config.display.page_size = size;
                println!("Page size is now {}", size);
            }
            _ => {
                println!("{}", format!("Usage: {}", self.usage()).yellow());
                return Ok(Outcome::Done);
            }
        }

        ctx.config
            .save()
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        Ok(Outcome::Done)
    }
}

fn print_settings(ctx: &Context) {
    println!(
        "Default location: {}",
        ctx.config.defaults.location.as_deref().unwrap_or("(none)")
    );
    println!("Page size: {}", ctx.config.display.page_size);
}

/// `connection` — report which database file the session is using.
pub struct ConnectionCommand;

impl Command for ConnectionCommand {
    fn name(&self) -> &'static str {
        "connection"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (0, 0)
    }

    fn usage(&self) -> &'static str {
        "connection"
    }

    fn summary(&self) -> &'static str {
        "Show the database the session is connected to"
    }

    fn run(&self, ctx: &mut Context, _args: &[String]) -> Result<Outcome> {
        match ctx.db.path() {
            Some(path) => println!("Connected to {}", path.display()),
            None => println!("Connected to an in-memory database"),
        }
        Ok(Outcome::Done)
    }
}

pub struct HelpCommand;

impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (0, 0)
    }

    fn usage(&self) -> &'static str {
        "help"
    }

    fn summary(&self) -> &'static str {
        "List every command with its usage"
    }

    fn run(&self, _ctx: &mut Context, _args: &[String]) -> Result<Outcome> {
        let registry = Registry::standard();
        let width = registry
            .commands()
            .map(|c| c.usage().len())
            .max()
            .unwrap_or(0);

        for command in registry.commands() {
            println!("  {:<width$}  {}", command.usage(), command.summary());
        }

        Ok(Outcome::Done)
    }
}

/// `exit` — leave the interactive shell.
pub struct ExitCommand;

impl Command for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn mode(&self) -> Mode {
        Mode::Interactive
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (0, 0)
    }

    fn usage(&self) -> &'static str {
        "exit"
    }

    fn summary(&self) -> &'static str {
        "Leave the interactive shell"
    }

    fn run(&self, _ctx: &mut Context, _args: &[String]) -> Result<Outcome> {
        Ok(Outcome::Exit)
    }
}

/// `interactive` — switch a batch invocation into the shell.
pub struct InteractiveCommand;

impl Command for InteractiveCommand {
    fn name(&self) -> &'static str {
        "interactive"
    }

    fn mode(&self) -> Mode {
        Mode::CommandLine
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (0, 0)
    }

    fn usage(&self) -> &'static str {
        "interactive"
    }

    fn summary(&self) -> &'static str {
        "Start the interactive shell"
    }

    fn run(&self, _ctx: &mut Context, _args: &[String]) -> Result<Outcome> {
        Ok(Outcome::EnterShell)
    }
}

/// `update` — bring the database schema up to date. The DDL is
/// idempotent, so running it against a current database is harmless.
pub struct UpdateCommand;

impl Command for UpdateCommand {
    fn name(&self) -> &'static str {
        "update"
    }

    fn mode(&self) -> Mode {
        Mode::CommandLine
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (0, 0)
    }

    fn usage(&self) -> &'static str {
        "update"
    }

    fn summary(&self) -> &'static str {
        "Create or update the database schema"
    }

    fn run(&self, ctx: &mut Context, _args: &[String]) -> Result<Outcome> {
        ctx.db.init_schema()?;
        println!("Database schema is up to date");
        Ok(Outcome::Done)
    }
}
