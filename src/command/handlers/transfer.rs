//! `export`, `import` and `check` commands

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::command::{Command, Context, Outcome};
use crate::error::{Error, Result};
use crate::managers::{Sightings, SpeciesRatings};
use crate::transfer::{
    parse_csv_date, NewSightingLookups, NewStatusLookups, SightingsTransfer, StatusTransfer,
};

/// ```text
/// export all <file> [from] [to]
/// export location <name> <file> [from] [to]
/// export category <name> <file> [from] [to]
/// export species <name> <file> [from] [to]
/// export status <file>
/// ```
pub struct ExportCommand;

impl Command for ExportCommand {
    fn name(&self) -> &'static str {
        "export"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (2, 5)
    }

    fn usage(&self) -> &'static str {
        "export <all|location|category|species|status> [name] <file> [from] [to]"
    }

    fn summary(&self) -> &'static str {
        "Export sightings or status ratings to a CSV file"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        let kind = args[0].to_lowercase();

        if kind == "status" {
            let path = PathBuf::from(&args[1]);
            let records = SpeciesRatings::new(&ctx.db).list(None, 1, 0)?;
            let count = StatusTransfer::new(&ctx.db).export(&records, &path, |_, _| {})?;
            println!("Exported {} status records to {}", count, path.display());
            return Ok(Outcome::Done);
        }

        let sightings = Sightings::new(&ctx.db);
        let (mut selected, path, dates) = match kind.as_str() {
            "all" => (
                sightings.list(None, 1, 0)?,
                PathBuf::from(&args[1]),
                &args[2..],
            ),
            "location" | "category" | "species" => {
                let Some(file) = args.get(2) else {
                    println!(
                        "{}",
                        format!("Usage: export {} <name> <file> [from] [to]", kind).yellow()
                    );
                    return Ok(Outcome::Done);
                };
                let name = &args[1];
                let selected = match kind.as_str() {
                    "location" => sightings.list_by_location(name, 1, 0)?,
                    "category" => sightings.list_by_category(name, 1, 0)?,
                    _ => sightings.list_by_species(name, 1, 0)?,
                };
                (selected, PathBuf::from(file), &args[3..])
            }
            _ => return Err(Error::UnknownExportType(args[0].clone())),
        };

        if let Some(from) = dates.first().map(|d| parse_csv_date(d)).transpose()? {
            selected.retain(|s| s.date >= from);
        }
        if let Some(to) = dates.get(1).map(|d| parse_csv_date(d)).transpose()? {
            selected.retain(|s| s.date <= to);
        }

        let count = SightingsTransfer::new(&ctx.db).export(&selected, &path, |index, _| {
            print!("\rExporting record {}", index);
        })?;
        println!("\rExported {} sightings to {}", count, path.display());

        Ok(Outcome::Done)
    }
}

/// `import <file>` — the file type is recognised from its header line,
/// so sighting and status rating files go through the same command.
/// New lookup values are reported before any record is written.
pub struct ImportCommand;

impl Command for ImportCommand {
    fn name(&self) -> &'static str {
        "import"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (1, 1)
    }

    fn usage(&self) -> &'static str {
        "import <file>"
    }

    fn summary(&self) -> &'static str {
        "Import sightings or status ratings from a CSV file"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        let path = PathBuf::from(&args[0]);

        if is_status_file(&path)? {
            let transfer = StatusTransfer::new(&ctx.db);
            print_new_status_lookups(&transfer.detect_new_lookups(&path)?);
            let inserted = transfer.import(&path, |index, _| {
                print!("\rImporting record {}", index);
            })?;
            println!("\rImported {} status records from {}", inserted, path.display());
        } else {
            let transfer = SightingsTransfer::new(&ctx.db);
            print_new_sighting_lookups(&transfer.detect_new_lookups(&path)?);
            let count = transfer.import(&path, |index, _| {
                print!("\rImporting record {}", index);
            })?;
            println!("\rImported {} sightings from {}", count, path.display());
        }

        Ok(Outcome::Done)
    }
}

/// `check [sightings|status] <file>` — preview which lookup values an
/// import would create, without importing anything. With the type
/// omitted it is recognised from the header line.
pub struct CheckCommand;

impl Command for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (1, 2)
    }

    fn usage(&self) -> &'static str {
        "check [sightings|status] <file>"
    }

    fn summary(&self) -> &'static str {
        "Preview the lookup values an import would create"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        let (status, path) = match args {
            [file] => (is_status_file(Path::new(file))?, PathBuf::from(file)),
            [kind, file] => match kind.to_lowercase().as_str() {
                "sightings" => (false, PathBuf::from(file)),
                "status" => (true, PathBuf::from(file)),
                _ => return Err(Error::UnknownEntityType(kind.clone())),
            },
            _ => unreachable!("arg bounds"),
        };

        if status {
            let new = StatusTransfer::new(&ctx.db).detect_new_lookups(&path)?;
            if new.is_empty() {
                println!("No new lookup values: every name is already known");
            } else {
                print_new_status_lookups(&new);
            }
        } else {
            let new = SightingsTransfer::new(&ctx.db).detect_new_lookups(&path)?;
            if new.is_empty() {
                println!("No new lookup values: every name is already known");
            } else {
                print_new_sighting_lookups(&new);
            }
        }

        Ok(Outcome::Done)
    }
}

/// Status rating files lead with `Species,Category,Scheme`; sighting
/// files with `Species,Category,Number`.
fn is_status_file(path: &Path) -> Result<bool> {
    let mut first_line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut first_line)?;
    Ok(first_line.trim_end().starts_with("Species,Category,Scheme"))
}

fn print_new_sighting_lookups(new: &NewSightingLookups) {
    print_names("New locations", &new.locations);
    print_names("New categories", &new.categories);
    print_names("New species", &new.species);
}

fn print_new_status_lookups(new: &NewStatusLookups) {
    print_names("New categories", &new.categories);
    print_names("New species", &new.species);
    print_names("New schemes", &new.schemes);
    if !new.ratings.is_empty() {
        let pairs: Vec<String> = new
            .ratings
            .iter()
            .map(|(scheme, rating)| format!("{}/{}", scheme, rating))
            .collect();
        print_names("New ratings", &pairs);
    }
}

fn print_names(label: &str, names: &[String]) {
    if !names.is_empty() {
        println!("{}: {}", label.yellow(), names.join(", "));
    }
}
