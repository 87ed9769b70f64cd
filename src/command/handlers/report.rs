//! `report` command
//!
//! ```text
//! report summary <from> <to> [location|-] [category|-] [species|-]
//! report location <name> [from] [to]
//! report category <name> [from] [to]
//! report species <name> [from] [to]
//! report status <species> [scheme]
//! ```
//!
//! Dates use DD/MM/YYYY; a `-` placeholder skips a summary filter so a
//! later one can still be given.

use chrono::NaiveDate;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::command::{Command, Context, Outcome};
use crate::error::{Error, Result};
use crate::managers::{Categories, Locations, Sightings, SpeciesManager, SpeciesRatings};
use crate::report::Summary;
use crate::transfer::{parse_csv_date, CSV_DATE_FMT, CSV_DATETIME_FMT};

pub struct ReportCommand;

impl Command for ReportCommand {
    fn name(&self) -> &'static str {
        "report"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (2, 6)
    }

    fn usage(&self) -> &'static str {
        "report <summary|location|category|species|status> [...]"
    }

    fn summary(&self) -> &'static str {
        "Report on sightings over a date range, or on conservation status"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        match args[0].to_lowercase().as_str() {
            "summary" => report_summary(ctx, &args[1..]),
            "location" => report_filtered(ctx, &args[1..], Filter::Location),
            "category" => report_filtered(ctx, &args[1..], Filter::Category),
            "species" => report_filtered(ctx, &args[1..], Filter::Species),
            "status" => report_status(ctx, &args[1..]),
            _ => Err(Error::UnknownReportType(args[0].clone())),
        }
    }
}

enum Filter {
    Location,
    Category,
    Species,
}

fn report_summary(ctx: &mut Context, args: &[String]) -> Result<Outcome> {
    let [from, to, rest @ ..] = args else {
        println!(
            "{}",
            "Usage: report summary <from> <to> [location|-] [category|-] [species|-]".yellow()
        );
        return Ok(Outcome::Done);
    };
    let from = parse_csv_date(from)?;
    let to = parse_csv_date(to)?;

    // "-" holds a filter slot open without applying it
    let slot = |i: usize| rest.get(i).filter(|v| v.as_str() != "-");

    let location_id = match slot(0) {
        Some(name) => Some(
            Locations::new(&ctx.db)
                .get_by_name(name)?
                .ok_or_else(|| Error::not_found("location", name.clone()))?
                .id,
        ),
        None => None,
    };
    let category_id = match slot(1) {
        Some(name) => Some(
            Categories::new(&ctx.db)
                .get_by_name(name)?
                .ok_or_else(|| Error::not_found("category", name.clone()))?
                .id,
        ),
        None => None,
    };
    let species_id = match slot(2) {
        Some(name) => Some(
            SpeciesManager::new(&ctx.db)
                .get_by_name(name)?
                .ok_or_else(|| Error::not_found("species", name.clone()))?
                .id,
        ),
        None => None,
    };

    let summary =
        Sightings::new(&ctx.db).summarise(from, to, location_id, category_id, species_id)?;
    print_summary(&summary);

    Ok(Outcome::Done)
}

/// Sightings for one location, category or species, optionally bounded
/// by dates (unbounded ends default wide open).
fn report_filtered(ctx: &mut Context, args: &[String], filter: Filter) -> Result<Outcome> {
    let [name, rest @ ..] = args else {
        println!("{}", "Usage: report <location|category|species> <name> [from] [to]".yellow());
        return Ok(Outcome::Done);
    };

    let from = rest.first().map(|d| parse_csv_date(d)).transpose()?;
    let to = rest.get(1).map(|d| parse_csv_date(d)).transpose()?;
    let from = from.unwrap_or(NaiveDate::MIN);
    let to = to.unwrap_or(NaiveDate::MAX);

    let sightings = Sightings::new(&ctx.db);
    let summary = match filter {
        Filter::Location => {
            let location = Locations::new(&ctx.db)
                .get_by_name(name)?
                .ok_or_else(|| Error::not_found("location", name.clone()))?;
            sightings.summarise(from, to, Some(location.id), None, None)?
        }
        Filter::Category => {
            let category = Categories::new(&ctx.db)
                .get_by_name(name)?
                .ok_or_else(|| Error::not_found("category", name.clone()))?;
            sightings.summarise(from, to, None, Some(category.id), None)?
        }
        Filter::Species => {
            let species = SpeciesManager::new(&ctx.db)
                .get_by_name(name)?
                .ok_or_else(|| Error::not_found("species", name.clone()))?;
            sightings.summarise(from, to, None, None, Some(species.id))?
        }
    };
    print_summary(&summary);

    Ok(Outcome::Done)
}

fn report_status(ctx: &mut Context, args: &[String]) -> Result<Outcome> {
    let [species, rest @ ..] = args else {
        println!("{}", "Usage: report status <species> [scheme]".yellow());
        return Ok(Outcome::Done);
    };

    let manager = SpeciesRatings::new(&ctx.db);
    let records = match rest.first() {
        Some(scheme) => match manager.get_current(species, scheme)? {
            Some(current) => vec![current],
            None => Vec::new(),
        },
        None => manager.list_by_species(species, 1, 0)?,
    };

    if records.is_empty() {
        println!("{}", format!("No status ratings recorded for {}", species).yellow());
        return Ok(Outcome::Done);
    }

    let rows: Vec<_> = records
        .iter()
        .map(|r| StatusRow {
            rating: r
                .rating
                .as_ref()
                .map(|rating| rating.name.clone())
                .unwrap_or_default(),
            scheme: r
                .rating
                .as_ref()
                .and_then(|rating| rating.scheme.as_ref())
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            region: r.region.clone(),
            start: r.start.format(CSV_DATETIME_FMT).to_string(),
            end: r
                .end
                .map(|e| e.format(CSV_DATETIME_FMT).to_string())
                .unwrap_or_else(|| "current".to_string()),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    Ok(Outcome::Done)
}

fn print_summary(summary: &Summary) {
    let Some((from, to)) = summary.date_range() else {
        println!("{}", "No sightings match".yellow());
        return;
    };

    println!(
        "{} sightings of {} species across {} locations, {} to {}",
        summary.sightings.len(),
        summary.species().len(),
        summary.locations().len(),
        from.format(CSV_DATE_FMT),
        to.format(CSV_DATE_FMT)
    );
    println!(
        "{} individuals in {} categories",
        summary.total_individuals(),
        summary.categories().len()
    );

    let rows: Vec<_> = summary
        .species()
        .iter()
        .map(|species| {
            let matching: Vec<_> = summary
                .sightings
                .iter()
                .filter(|s| s.species_id == species.id)
                .collect();
            SpeciesSummaryRow {
                species: species.name.clone(),
                category: species
                    .category
                    .as_ref()
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                sightings: matching.len(),
                individuals: matching.iter().map(|s| s.number as u64).sum(),
            }
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Tabled)]
struct SpeciesSummaryRow {
    #[tabled(rename = "Species")]
    species: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Sightings")]
    sightings: usize,
    #[tabled(rename = "Individuals")]
    individuals: u64,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Scheme")]
    scheme: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
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

    fn seed(ctx: &mut Context, registry: &Registry) -> Result<()> {
        dispatch(registry, ctx, "add species Robin Birds")?;
        dispatch(registry, ctx, "add location \"Bagley Wood\"")?;
        dispatch(registry, ctx, "add sighting 01/05/2024 \"Bagley Wood\" Robin 2")?;
        Ok(())
    }

    #[test]
    fn test_report_summary_runs() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();
        seed(&mut ctx, &registry)?;

        let outcome = dispatch(&registry, &mut ctx, "report summary 01/01/2024 31/12/2024")?;
        assert_eq!(outcome, Outcome::Done);

        // Placeholder keeps the category slot usable without a location
        let outcome = dispatch(
            &registry,
            &mut ctx,
            "report summary 01/01/2024 31/12/2024 - Birds",
        )?;
        assert_eq!(outcome, Outcome::Done);

        Ok(())
    }

    #[test]
    fn test_report_summary_unknown_filter() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();
        seed(&mut ctx, &registry)?;

        let result = dispatch(
            &registry,
            &mut ctx,
            "report summary 01/01/2024 31/12/2024 Nowhere",
        );
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[test]
    fn test_report_species_without_dates() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();
        seed(&mut ctx, &registry)?;

        let outcome = dispatch(&registry, &mut ctx, "report species Robin")?;
        assert_eq!(outcome, Outcome::Done);

        Ok(())
    }

    #[test]
    fn test_report_status_history() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        dispatch(&registry, &mut ctx, "add species Nightingale Birds")?;
        dispatch(&registry, &mut ctx, "add scheme BOCC4")?;
        dispatch(&registry, &mut ctx, "add rating Red BOCC4")?;
        dispatch(&registry, &mut ctx, "add status Nightingale Red BOCC4")?;

        assert_eq!(
            dispatch(&registry, &mut ctx, "report status Nightingale")?,
            Outcome::Done
        );
        assert_eq!(
            dispatch(&registry, &mut ctx, "report status Nightingale BOCC4")?,
            Outcome::Done
        );

        Ok(())
    }

    #[test]
    fn test_report_unknown_type() {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        let result = dispatch(&registry, &mut ctx, "report averages 2024");
        assert!(matches!(result, Err(Error::UnknownReportType(_))));
    }
}
