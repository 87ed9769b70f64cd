//! Command framework
//!
//! One framework serves both front-ends: the one-shot command line and
//! the interactive shell. A raw line goes through
//! `Parse → ValidateMode → ValidateArgumentCount → Execute`; mode and
//! argument-count violations are reported and rejected before anything
//! runs, while domain errors raised during execution propagate to the
//! outermost loop.

use colored::Colorize;

use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};

pub mod handlers;
pub mod history;

pub use history::CommandHistory;

/// A command's declared execution context requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    CommandLine,
    Any,
}

impl Mode {
    /// Whether a command declaring `self` may run under `current`.
    pub fn allows(&self, current: Mode) -> bool {
        matches!(self, Mode::Any) || *self == current
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Interactive => write!(f, "interactive"),
            Mode::CommandLine => write!(f, "command line"),
            Mode::Any => write!(f, "any"),
        }
    }
}

/// What the runner should do after a command completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Carry on (batch exits anyway, the shell re-prompts)
    Done,
    /// Leave the interactive shell
    Exit,
    /// Switch from batch to the interactive shell
    EnterShell,
}

/// Everything a command needs to execute: the session context threaded
/// through every invocation instead of process-wide state.
pub struct Context {
    pub db: Database,
    pub config: Config,
    pub history: CommandHistory,
    pub mode: Mode,
}

/// The command contract: a dispatch name, a run-mode requirement,
/// `[min, max]` argument bounds and the logic itself. Commands taking a
/// sub-type argument declare the widest window here and refine it per
/// sub-type inside `run`.
pub trait Command {
    fn name(&self) -> &'static str;

    fn mode(&self) -> Mode {
        Mode::Any
    }

    /// Inclusive argument-count bounds.
    fn arg_bounds(&self) -> (usize, usize);

    fn usage(&self) -> &'static str;

    fn summary(&self) -> &'static str;

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome>;
}

/// The fixed registry of command implementations.
pub struct Registry {
    commands: Vec<Box<dyn Command>>,
}

impl Registry {
    pub fn standard() -> Self {
        Self {
            commands: handlers::all(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .map(|c| c.as_ref())
    }

    pub fn commands(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.iter().map(|c| c.as_ref())
    }
}

/// Split a command line into tokens, preserving double-quoted
/// substrings as single arguments.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Parse and execute one command line against the registry.
///
/// Unknown commands and domain errors surface as `Err` for the caller's
/// outer loop to report; mode and argument-count violations are printed
/// here and swallowed, since nothing has been executed.
pub fn dispatch(registry: &Registry, ctx: &mut Context, line: &str) -> Result<Outcome> {
    let tokens = tokenize(line);
    let Some((name, args)) = tokens.split_first() else {
        return Ok(Outcome::Done);
    };

    let command = registry
        .find(name)
        .ok_or_else(|| Error::UnknownCommand(name.clone()))?;

    if !command.mode().allows(ctx.mode) {
        println!(
            "{}",
            format!(
                "The '{}' command is only available in {} mode",
                command.name(),
                command.mode()
            )
            .yellow()
        );
        return Ok(Outcome::Done);
    }

    let (min, max) = command.arg_bounds();
    if args.len() < min || args.len() > max {
        println!(
            "{}",
            format!(
                "Wrong number of arguments for '{}'. Usage: {}",
                command.name(),
                command.usage()
            )
            .yellow()
        );
        return Ok(Outcome::Done);
    }

    command.run(ctx, args)
}
