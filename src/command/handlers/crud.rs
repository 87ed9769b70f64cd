//! `delete`, `rename` and `move` commands

use colored::Colorize;
use dialoguer::Confirm;

use crate::command::{Command, Context, Mode, Outcome};
use crate::error::{Error, Result};
use crate::managers::{
    Categories, Locations, Ratings, Schemes, Sightings, SpeciesManager, SpeciesRatings, Users,
};

use super::{parse_id, EntityKind};

/// ```text
/// delete category <name>
/// delete location <name>
/// delete species <name>
/// delete sighting <id>
/// delete scheme <name>
/// delete rating <name> <scheme>
/// delete status <species> <scheme>   (closes the current rating)
/// delete user <name>
/// ```
///
/// Deletions are guarded: an entity referenced by dependents is left
/// untouched and the command fails.
pub struct DeleteCommand;

impl Command for DeleteCommand {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (2, 3)
    }

    fn usage(&self) -> &'static str {
        "delete <entity-type> <name> [scheme]"
    }

    fn summary(&self) -> &'static str {
        "Delete an entity that is not referenced by anything else"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        let kind: EntityKind = args[0].parse()?;
        let name = &args[1];

        // Batch invocations already typed the whole command out; only
        // the shell double-checks
        if ctx.mode == Mode::Interactive && kind != EntityKind::Status {
            let confirmed = Confirm::new()
                .with_prompt(format!("Delete {} {}?", args[0].to_lowercase(), name))
                .default(false)
                .interact()
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            if !confirmed {
                println!("Cancelled");
                return Ok(Outcome::Done);
            }
        }

        match kind {
            EntityKind::Category => Categories::new(&ctx.db).delete(name)?,
            EntityKind::Location => Locations::new(&ctx.db).delete(name)?,
            EntityKind::Species => SpeciesManager::new(&ctx.db).delete(name)?,
            EntityKind::Sighting => Sightings::new(&ctx.db).delete(parse_id(name)?)?,
            EntityKind::Scheme => Schemes::new(&ctx.db).delete(name)?,
            EntityKind::Rating => {
                let Some(scheme) = args.get(2) else {
                    println!("{}", "Usage: delete rating <name> <scheme>".yellow());
                    return Ok(Outcome::Done);
                };
                Ratings::new(&ctx.db).delete(name, scheme)?;
            }
            EntityKind::Status => {
                let Some(scheme) = args.get(2) else {
                    println!("{}", "Usage: delete status <species> <scheme>".yellow());
                    return Ok(Outcome::Done);
                };
                SpeciesRatings::new(&ctx.db).clear_rating(name, scheme)?;
                println!("Cleared the current {} rating for {}", scheme, name);
                return Ok(Outcome::Done);
            }
            EntityKind::User => Users::new(&ctx.db).delete(name)?,
        }

        println!("Deleted {} {}", args[0].to_lowercase(), name.green());
        Ok(Outcome::Done)
    }
}

/// ```text
/// rename <category|location|species|scheme> <old> <new>
/// rename rating <old> <new> <scheme>
/// ```
pub struct RenameCommand;

impl Command for RenameCommand {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (3, 4)
    }

    fn usage(&self) -> &'static str {
        "rename <entity-type> <old> <new> [scheme]"
    }

    fn summary(&self) -> &'static str {
        "Rename an entity, provided the new name is free"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        let kind: EntityKind = args[0].parse()?;
        let old = &args[1];
        let new = &args[2];

        let renamed = match kind {
            EntityKind::Category => Categories::new(&ctx.db).rename(old, new)?.name,
            EntityKind::Location => Locations::new(&ctx.db).rename(old, new)?.name,
            EntityKind::Species => SpeciesManager::new(&ctx.db).rename(old, new)?.name,
            EntityKind::Scheme => Schemes::new(&ctx.db).rename(old, new)?.name,
            EntityKind::Rating => {
                let Some(scheme) = args.get(3) else {
                    println!("{}", "Usage: rename rating <old> <new> <scheme>".yellow());
                    return Ok(Outcome::Done);
                };
                Ratings::new(&ctx.db).rename(old, new, scheme)?.name
            }
            _ => return Err(Error::UnknownEntityType(args[0].clone())),
        };

        println!("Renamed {} to {}", old, renamed.green());
        Ok(Outcome::Done)
    }
}

/// `move species <name> <new-category>`
pub struct MoveCommand;

impl Command for MoveCommand {
    fn name(&self) -> &'static str {
        "move"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (3, 3)
    }

    fn usage(&self) -> &'static str {
        "move species <name> <new-category>"
    }

    fn summary(&self) -> &'static str {
        "Move a species to a different category"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        if !args[0].eq_ignore_ascii_case("species") {
            return Err(Error::UnknownEntityType(args[0].clone()));
        }

        let species = SpeciesManager::new(&ctx.db).move_to(&args[1], &args[2])?;
        println!(
            "Moved {} to category {}",
            species.name.green(),
            species.category.as_ref().map(|c| c.name.as_str()).unwrap_or("?")
        );
        Ok(Outcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{dispatch, CommandHistory, Mode, Registry};
    use crate::config::Config;
    use crate::db::Database;

    fn context() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let history = CommandHistory::open(dir.path().join("history.txt")).unwrap();
        let ctx = Context {
            db: Database::open_memory().unwrap(),
            config: Config::default(),
            history,
            mode: Mode::CommandLine,
        };
        (dir, ctx)
    }

    #[test]
    fn test_delete_category_in_use() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        dispatch(&registry, &mut ctx, "add species Robin Birds")?;

        let result = dispatch(&registry, &mut ctx, "delete category Birds");
        assert!(matches!(result, Err(Error::InUse { .. })));
        assert_eq!(Categories::new(&ctx.db).list(None, 1, 0)?.len(), 1);

        Ok(())
    }

    #[test]
    fn test_delete_sighting_requires_numeric_id() {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        let result = dispatch(&registry, &mut ctx, "delete sighting twelve");
        assert!(matches!(result, Err(Error::InvalidIdentifier(_))));
    }

    #[test]
    fn test_rename_via_dispatch() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        dispatch(&registry, &mut ctx, "add category Brids")?;
        dispatch(&registry, &mut ctx, "rename category Brids Birds")?;

        assert!(Categories::new(&ctx.db).get_by_name("Birds")?.is_some());
        assert!(Categories::new(&ctx.db).get_by_name("Brids")?.is_none());

        Ok(())
    }

    #[test]
    fn test_move_requires_species_keyword() {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        let result = dispatch(&registry, &mut ctx, "move category Birds Mammals");
        assert!(matches!(result, Err(Error::UnknownEntityType(_))));
    }

    #[test]
    fn test_delete_status_clears_current_rating() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        dispatch(&registry, &mut ctx, "add species Nightingale Birds")?;
        dispatch(&registry, &mut ctx, "add scheme BOCC4")?;
        dispatch(&registry, &mut ctx, "add rating Red BOCC4")?;
        dispatch(&registry, &mut ctx, "add status Nightingale Red BOCC4")?;

        dispatch(&registry, &mut ctx, "delete status Nightingale BOCC4")?;
        assert!(SpeciesRatings::new(&ctx.db)
            .get_current("Nightingale", "BOCC4")?
            .is_none());

        Ok(())
    }
}
