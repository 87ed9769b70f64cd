//! wildlog - personal wildlife sighting records
//!
//! A sqlite-backed record of what was seen, where and when, plus the
//! conservation status history of each species. One command framework
//! serves both the one-shot command line and the interactive shell.
//!
//! ## Key Concepts
//!
//! - **Lookups on demand**: categories, locations and species are
//!   created idempotently the first time a record needs them
//! - **Sighting de-duplication**: (date, species, location) is the key;
//!   a repeat entry updates the existing sighting
//! - **Status supersede**: assigning a rating closes the current one,
//!   keeping the full history per species and scheme

pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod managers;
pub mod model;
pub mod report;
pub mod shell;
pub mod transfer;

pub use command::{dispatch, Command, CommandHistory, Context, Mode, Outcome, Registry};
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use report::Summary;
