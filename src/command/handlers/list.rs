//! `list` command
//!
//! ```text
//! list categories [page]
//! list locations [page]
//! list species [category] [page]
//! list schemes [page]
//! list ratings <scheme> [page]
//! list sightings [location] [page]
//! list users
//! ```
//!
//! Output is rendered as a table; the page size comes from the
//! `display.page_size` setting (0 shows everything).

use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::command::{Command, Context, Outcome};
use crate::error::{Error, Result};
use crate::managers::{
    Categories, Locations, Ratings, Schemes, Sightings, SpeciesManager, Users,
};
use crate::model::Sighting;
use crate::transfer::CSV_DATE_FMT;

pub struct ListCommand;

impl Command for ListCommand {
    fn name(&self) -> &'static str {
        "list"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (1, 3)
    }

    fn usage(&self) -> &'static str {
        "list <categories|locations|species|schemes|ratings|sightings|users> [filter] [page]"
    }

    fn summary(&self) -> &'static str {
        "List entities of one type, optionally filtered and paged"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        let (filter, page) = split_filter_and_page(&args[1..]);
        let page_size = ctx.config.display.page_size;

        match args[0].to_lowercase().as_str() {
            "categories" => {
                let rows: Vec<_> = Categories::new(&ctx.db)
                    .list(None, page, page_size)?
                    .into_iter()
                    .map(|c| NameRow { id: c.id, name: c.name })
                    .collect();
                render(rows);
            }
            "locations" => {
                let rows: Vec<_> = Locations::new(&ctx.db)
                    .list(None, page, page_size)?
                    .into_iter()
                    .map(|l| LocationRow {
                        id: l.id,
                        name: l.name,
                        city: l.city.unwrap_or_default(),
                        county: l.county.unwrap_or_default(),
                        postcode: l.postcode.unwrap_or_default(),
                    })
                    .collect();
                render(rows);
            }
            "species" => {
                let manager = SpeciesManager::new(&ctx.db);
                let all = match filter {
                    Some(category) => manager.list_by_category(category, page, page_size)?,
                    None => manager.list(None, page, page_size)?,
                };
                let rows: Vec<_> = all
                    .into_iter()
                    .map(|s| SpeciesRow {
                        id: s.id,
                        name: s.name,
                        category: s.category.map(|c| c.name).unwrap_or_default(),
                    })
                    .collect();
                render(rows);
            }
            "schemes" => {
                let rows: Vec<_> = Schemes::new(&ctx.db)
                    .list(None, page, page_size)?
                    .into_iter()
                    .map(|s| NameRow { id: s.id, name: s.name })
                    .collect();
                render(rows);
            }
            "ratings" => {
                let Some(scheme) = filter else {
                    println!("{}", "Usage: list ratings <scheme> [page]".yellow());
                    return Ok(Outcome::Done);
                };
                let rows: Vec<_> = Ratings::new(&ctx.db)
                    .list_by_scheme(scheme, page, page_size)?
                    .into_iter()
                    .map(|r| RatingRow {
                        id: r.id,
                        name: r.name,
                        scheme: r.scheme.map(|s| s.name).unwrap_or_default(),
                    })
                    .collect();
                render(rows);
            }
            "sightings" => {
                let manager = Sightings::new(&ctx.db);
                let all = match filter {
                    Some(location) => manager.list_by_location(location, page, page_size)?,
                    None => manager.list(None, page, page_size)?,
                };
                let rows: Vec<_> = all.iter().map(sighting_row).collect();
                render(rows);
            }
            "users" => {
                let rows: Vec<_> = Users::new(&ctx.db)
                    .list(None, page, page_size)?
                    .into_iter()
                    .map(|u| NameRow { id: u.id, name: u.name })
                    .collect();
                render(rows);
            }
            _ => return Err(Error::UnknownEntityType(args[0].clone())),
        }

        Ok(Outcome::Done)
    }
}

/// The trailing arguments are `[filter] [page]`; a bare number is a
/// page, anything else is a filter.
fn split_filter_and_page(rest: &[String]) -> (Option<&String>, usize) {
    match rest {
        [] => (None, 1),
        [one] => match one.parse() {
            Ok(page) => (None, page),
            Err(_) => (Some(one), 1),
        },
        [filter, page, ..] => (Some(filter), page.parse().unwrap_or(1)),
    }
}

fn render<R: Tabled>(rows: Vec<R>) {
    if rows.is_empty() {
        println!("{}", "Nothing to list".yellow());
        return;
    }
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Tabled)]
struct NameRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "County")]
    county: String,
    #[tabled(rename = "Postcode")]
    postcode: String,
}

#[derive(Tabled)]
struct SpeciesRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
}

#[derive(Tabled)]
struct RatingRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Scheme")]
    scheme: String,
}

#[derive(Tabled)]
struct SightingRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Species")]
    species: String,
    #[tabled(rename = "Number")]
    number: u32,
    #[tabled(rename = "Gender")]
    gender: String,
    #[tabled(rename = "Young")]
    with_young: String,
    #[tabled(rename = "Location")]
    location: String,
}

fn sighting_row(s: &Sighting) -> SightingRow {
    SightingRow {
        id: s.id,
        date: s.date.format(CSV_DATE_FMT).to_string(),
        species: s
            .species
            .as_ref()
            .map(|sp| sp.name.clone())
            .unwrap_or_default(),
        number: s.number,
        gender: s.gender.to_string(),
        with_young: if s.with_young { "Yes" } else { "No" }.to_string(),
        location: s
            .location
            .as_ref()
            .map(|l| l.name.clone())
            .unwrap_or_default(),
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
    fn test_split_filter_and_page() {
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert_eq!(split_filter_and_page(&args(&[])), (None, 1));

        let rest = args(&["2"]);
        assert_eq!(split_filter_and_page(&rest), (None, 2));

        let rest = args(&["Birds"]);
        assert_eq!(split_filter_and_page(&rest), (Some(&rest[0]), 1));

        let rest = args(&["Birds", "3"]);
        assert_eq!(split_filter_and_page(&rest), (Some(&rest[0]), 3));
    }

    #[test]
    fn test_list_runs_for_each_type() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        dispatch(&registry, &mut ctx, "add species Robin Birds")?;
        dispatch(&registry, &mut ctx, "add scheme BOCC4")?;
        dispatch(&registry, &mut ctx, "add rating Red BOCC4")?;

        for line in [
            "list categories",
            "list locations",
            "list species",
            "list species Birds",
            "list schemes",
            "list ratings BOCC4",
            "list sightings",
            "list users",
        ] {
            assert_eq!(dispatch(&registry, &mut ctx, line)?, Outcome::Done);
        }

        Ok(())
    }

    #[test]
    fn test_list_unknown_type() {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        let result = dispatch(&registry, &mut ctx, "list widgets");
        assert!(matches!(result, Err(Error::UnknownEntityType(_))));
    }
}
