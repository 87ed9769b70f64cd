//! `add` command
//!
//! ```text
//! add category <name>
//! add location <name>
//! add species <name> <category>
//! add scheme <name>
//! add rating <name> <scheme>
//! add status <species> <rating> <scheme>
//! add sighting <date> <location> <species> <number> [gender] [withyoung]
//! add sighting              (interactive: prompts for each field)
//! ```
//!
//! Adds are idempotent by name: repeating one returns the stored
//! entity unchanged. `add status` assigns a conservation rating,
//! superseding the current one for that species and scheme.

use chrono::Local;
use colored::Colorize;
use dialoguer::{Confirm, Input};

use crate::command::{Command, Context, Mode, Outcome};
use crate::error::{Error, Result};
use crate::managers::{
    Categories, Locations, Ratings, Schemes, Sightings, SpeciesManager, SpeciesRatings,
};
use crate::model::{Gender, Location, SightingTemplate};
use crate::transfer::{parse_csv_date, CSV_DATE_FMT};

use super::EntityKind;

pub struct AddCommand;

impl Command for AddCommand {
    fn name(&self) -> &'static str {
        "add"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (1, 7)
    }

    fn usage(&self) -> &'static str {
        "add <category|location|species|sighting|scheme|rating|status|user> [...]"
    }

    fn summary(&self) -> &'static str {
        "Add an entity, creating it if it does not already exist"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        let kind: EntityKind = args[0].parse()?;
        let args = &args[1..];

        match kind {
            EntityKind::Category => {
                let Some([name]) = require(args, "add category <name>")? else {
                    return Ok(Outcome::Done);
                };
                let category = Categories::new(&ctx.db).add(name)?;
                println!("Added category {}", category.name.green());
            }
            EntityKind::Location => {
                let Some([name]) = require(args, "add location <name>")? else {
                    return Ok(Outcome::Done);
                };
                let location = Locations::new(&ctx.db).add(Location {
                    name: name.clone(),
                    ..Default::default()
                })?;
                println!(
                    "Added location {} (use 'edit location' to fill in the address)",
                    location.name.green()
                );
            }
            EntityKind::Species => {
                let Some([name, category]) = require(args, "add species <name> <category>")? else {
                    return Ok(Outcome::Done);
                };
                let species = SpeciesManager::new(&ctx.db).add(name, category)?;
                println!(
                    "Added species {} in category {}",
                    species.name.green(),
                    species.category.as_ref().map(|c| c.name.as_str()).unwrap_or("?")
                );
            }
            EntityKind::Scheme => {
                let Some([name]) = require(args, "add scheme <name>")? else {
                    return Ok(Outcome::Done);
                };
                let scheme = Schemes::new(&ctx.db).add(name)?;
                println!("Added status scheme {}", scheme.name.green());
            }
            EntityKind::Rating => {
                let Some([name, scheme]) = require(args, "add rating <name> <scheme>")? else {
                    return Ok(Outcome::Done);
                };
                let rating = Ratings::new(&ctx.db).add(name, scheme)?;
                println!("Added rating {} to scheme {}", rating.name.green(), scheme);
            }
            EntityKind::Status => {
                let Some([species, rating, scheme]) =
                    require(args, "add status <species> <rating> <scheme>")?
                else {
                    return Ok(Outcome::Done);
                };
                let record = SpeciesRatings::new(&ctx.db).set_rating(species, rating, scheme)?;
                println!(
                    "{} is now rated {} on {}",
                    record.species.as_ref().map(|s| s.name.as_str()).unwrap_or("?").green(),
                    record.rating.as_ref().map(|r| r.name.as_str()).unwrap_or("?"),
                    scheme
                );
            }
            EntityKind::Sighting => {
                return add_sighting(ctx, args);
            }
            EntityKind::User => {
                let Some([name, password]) = require(args, "add user <name> <password>")? else {
                    return Ok(Outcome::Done);
                };
                let user = crate::managers::Users::new(&ctx.db).add(name, password)?;
                println!("Added user {}", user.name.green());
            }
        }

        Ok(Outcome::Done)
    }
}

/// Check the per-subtype argument count, printing usage and signalling
/// rejection with `None` when it does not match.
fn require<'a, const N: usize>(args: &'a [String], usage: &str) -> Result<Option<[&'a String; N]>> {
    match <&[String; N]>::try_from(args) {
        Ok(exact) => Ok(Some(exact.each_ref())),
        Err(_) => {
            println!("{}", format!("Usage: {}", usage).yellow());
            Ok(None)
        }
    }
}

fn add_sighting(ctx: &mut Context, args: &[String]) -> Result<Outcome> {
    if args.is_empty() {
        if ctx.mode == Mode::Interactive {
            return add_sighting_prompted(ctx);
        }
        println!(
            "{}",
            "Usage: add sighting <date> <location> <species> <number> [gender] [withyoung]"
                .yellow()
        );
        return Ok(Outcome::Done);
    }

    if args.len() < 4 {
        println!(
            "{}",
            "Usage: add sighting <date> <location> <species> <number> [gender] [withyoung]"
                .yellow()
        );
        return Ok(Outcome::Done);
    }

    let date = parse_csv_date(&args[0])?;
    let location = Locations::new(&ctx.db)
        .get_by_name(&args[1])?
        .ok_or_else(|| Error::not_found("location", args[1].clone()))?;
    let species = SpeciesManager::new(&ctx.db)
        .get_by_name(&args[2])?
        .ok_or_else(|| Error::not_found("species", args[2].clone()))?;
    let number: u32 = args[3]
        .parse()
        .map_err(|_| Error::InvalidIdentifier(args[3].clone()))?;
    let gender: Gender = args
        .get(4)
        .map(|g| {
            g.parse::<Gender>()
                .map_err(|_| Error::InvalidIdentifier(g.clone()))
        })
        .transpose()?
        .unwrap_or_default();
    let with_young = args
        .get(5)
        .map(|w| matches!(w.to_lowercase().as_str(), "yes" | "true" | "y" | "1"))
        .unwrap_or(false);

    let sighting = Sightings::new(&ctx.db).add(
        number,
        gender,
        with_young,
        date,
        location.id,
        species.id,
    )?;
    print_sighting(&sighting);

    Ok(Outcome::Done)
}

/// Field-by-field interactive entry. New locations and species are
/// created on the fly through the template path, so a brand-new
/// species prompts for its category too.
fn add_sighting_prompted(ctx: &mut Context) -> Result<Outcome> {
    let today = Local::now().date_naive().format(CSV_DATE_FMT).to_string();
    let date_text: String = Input::new()
        .with_prompt("Date")
        .default(today)
        .interact_text()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let date = parse_csv_date(&date_text)?;

    let mut location_prompt = Input::<String>::new().with_prompt("Location");
    if let Some(default) = &ctx.config.defaults.location {
        location_prompt = location_prompt.default(default.clone());
    }
    let location_name = location_prompt
        .interact_text()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let species_name: String = Input::new()
        .with_prompt("Species")
        .interact_text()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    // Only a species the store has never seen needs a category
    let category = match SpeciesManager::new(&ctx.db).get_by_name(&species_name)? {
        Some(species) => species
            .category
            .map(|c| c.name)
            .unwrap_or_else(|| "Unknown".to_string()),
        None => Input::new()
            .with_prompt("Category (new species)")
            .interact_text()
            .map_err(|e| std::io::Error::other(e.to_string()))?,
    };

    let number: u32 = Input::new()
        .with_prompt("Number seen")
        .default(1)
        .interact_text()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let gender_text: String = Input::new()
        .with_prompt("Gender (unknown/male/female/both)")
        .default("unknown".to_string())
        .interact_text()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let gender: Gender = gender_text
        .parse()
        .map_err(|_| Error::InvalidIdentifier(gender_text.clone()))?;

    let with_young = Confirm::new()
        .with_prompt("With young?")
        .default(false)
        .interact()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let sighting = Sightings::new(&ctx.db).add_from_template(&SightingTemplate {
        species: species_name,
        category,
        number,
        gender,
        with_young,
        date,
        location: Location {
            name: location_name,
            ..Default::default()
        },
    })?;
    print_sighting(&sighting);

    Ok(Outcome::Done)
}

fn print_sighting(sighting: &crate::model::Sighting) {
    println!(
        "Recorded {} x {} at {} on {}",
        sighting.number,
        sighting
            .species
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("?")
            .green(),
        sighting
            .location
            .as_ref()
            .map(|l| l.name.as_str())
            .unwrap_or("?"),
        sighting.date.format(CSV_DATE_FMT)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{dispatch, CommandHistory, Registry};
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
    fn test_add_category_via_dispatch() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        dispatch(&registry, &mut ctx, "add category birds")?;

        let all = Categories::new(&ctx.db).list(None, 1, 0)?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Birds");

        Ok(())
    }

    #[test]
    fn test_add_sighting_batch_form() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        dispatch(&registry, &mut ctx, "add species Robin Birds")?;
        dispatch(&registry, &mut ctx, "add location \"Bagley Wood\"")?;
        dispatch(
            &registry,
            &mut ctx,
            "add sighting 01/05/2024 \"Bagley Wood\" Robin 2 male yes",
        )?;

        let sightings = Sightings::new(&ctx.db).list(None, 1, 0)?;
        assert_eq!(sightings.len(), 1);
        assert_eq!(sightings[0].number, 2);
        assert_eq!(sightings[0].gender, Gender::Male);
        assert!(sightings[0].with_young);

        Ok(())
    }

    #[test]
    fn test_add_sighting_unknown_location() {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        dispatch(&registry, &mut ctx, "add species Robin Birds").unwrap();
        let result = dispatch(&registry, &mut ctx, "add sighting 01/05/2024 Nowhere Robin 1");
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_add_status_supersedes() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        dispatch(&registry, &mut ctx, "add species Nightingale Birds")?;
        dispatch(&registry, &mut ctx, "add scheme BOCC4")?;
        dispatch(&registry, &mut ctx, "add rating Red BOCC4")?;
        dispatch(&registry, &mut ctx, "add rating Amber BOCC4")?;

        dispatch(&registry, &mut ctx, "add status Nightingale Red BOCC4")?;
        dispatch(&registry, &mut ctx, "add status Nightingale Amber BOCC4")?;

        let current = SpeciesRatings::new(&ctx.db)
            .get_current("Nightingale", "BOCC4")?
            .unwrap();
        assert_eq!(current.rating.as_ref().unwrap().name, "Amber");

        Ok(())
    }

    #[test]
    fn test_add_unknown_entity_type() {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        let result = dispatch(&registry, &mut ctx, "add widget Foo");
        assert!(matches!(result, Err(Error::UnknownEntityType(_))));
    }
}
