//! Command implementations
//!
//! Each file holds one area of the command surface; `all()` assembles
//! the registry.

use std::str::FromStr;

use crate::error::{Error, Result};

pub mod add;
pub mod crud;
pub mod edit;
pub mod list;
pub mod report;
pub mod session;
pub mod transfer;
pub mod users;

use super::Command;

/// Every command the framework dispatches to.
pub fn all() -> Vec<Box<dyn Command>> {
    vec![
        Box::new(add::AddCommand),
        Box::new(crud::DeleteCommand),
        Box::new(crud::RenameCommand),
        Box::new(crud::MoveCommand),
        Box::new(edit::EditCommand),
        Box::new(list::ListCommand),
        Box::new(report::ReportCommand),
        Box::new(transfer::ExportCommand),
        Box::new(transfer::ImportCommand),
        Box::new(transfer::CheckCommand),
        Box::new(session::HistoryCommand),
        Box::new(session::SettingsCommand),
        Box::new(session::ConnectionCommand),
        Box::new(session::HelpCommand),
        Box::new(session::ExitCommand),
        Box::new(session::InteractiveCommand),
        Box::new(session::UpdateCommand),
        Box::new(users::AddUserCommand),
        Box::new(users::DeleteUserCommand),
        Box::new(users::SetPasswordCommand),
    ]
}

/// Entity-type discriminator shared by add/delete/rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Category,
    Location,
    Species,
    Sighting,
    Scheme,
    Rating,
    Status,
    User,
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "category" => Ok(EntityKind::Category),
            "location" => Ok(EntityKind::Location),
            "species" => Ok(EntityKind::Species),
            "sighting" => Ok(EntityKind::Sighting),
            "scheme" => Ok(EntityKind::Scheme),
            "rating" => Ok(EntityKind::Rating),
            "status" => Ok(EntityKind::Status),
            "user" => Ok(EntityKind::User),
            _ => Err(Error::UnknownEntityType(s.to_string())),
        }
    }
}

/// Parse a numeric id argument.
pub(crate) fn parse_id(value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidIdentifier(value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_from_str() {
        assert_eq!("category".parse::<EntityKind>().unwrap(), EntityKind::Category);
        assert_eq!("SPECIES".parse::<EntityKind>().unwrap(), EntityKind::Species);
        assert!(matches!(
            "widget".parse::<EntityKind>(),
            Err(Error::UnknownEntityType(_))
        ));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(
            parse_id("forty-two"),
            Err(Error::InvalidIdentifier(_))
        ));
    }
}
