//! `edit` command

use colored::Colorize;
use dialoguer::Input;

use crate::command::{Command, Context, Mode, Outcome};
use crate::error::{Error, Result};
use crate::managers::Locations;

/// `edit location <name>` — interactive only. Walks through the
/// address fields one at a time, offering the stored value as the
/// default; entering nothing clears a field.
pub struct EditCommand;

impl Command for EditCommand {
    fn name(&self) -> &'static str {
        "edit"
    }

    fn mode(&self) -> Mode {
        Mode::Interactive
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (2, 2)
    }

    fn usage(&self) -> &'static str {
        "edit location <name>"
    }

    fn summary(&self) -> &'static str {
        "Edit a location's address details field by field"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        if !args[0].eq_ignore_ascii_case("location") {
            return Err(Error::UnknownEntityType(args[0].clone()));
        }

        let locations = Locations::new(&ctx.db);
        let mut location = locations
            .get_by_name(&args[1])?
            .ok_or_else(|| Error::not_found("location", args[1].clone()))?;

        location.address = prompt_text("Address", &location.address)?;
        location.city = prompt_text("City", &location.city)?;
        location.county = prompt_text("County", &location.county)?;
        location.postcode = prompt_text("Postcode", &location.postcode)?;
        location.country = prompt_text("Country", &location.country)?;
        location.latitude = prompt_coordinate("Latitude", &location.latitude)?;
        location.longitude = prompt_coordinate("Longitude", &location.longitude)?;

        locations.update(&location)?;
        println!("Updated location {}", location.name.green());

        Ok(Outcome::Done)
    }
}

fn prompt_text(label: &str, current: &Option<String>) -> Result<Option<String>> {
    let entered: String = Input::new()
        .with_prompt(label)
        .allow_empty(true)
        .default(current.clone().unwrap_or_default())
        .interact_text()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let entered = entered.trim().to_string();
    Ok(if entered.is_empty() { None } else { Some(entered) })
}

fn prompt_coordinate(label: &str, current: &Option<f64>) -> Result<Option<f64>> {
    let entered: String = Input::new()
        .with_prompt(label)
        .allow_empty(true)
        .default(current.map(|v| v.to_string()).unwrap_or_default())
        .interact_text()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let entered = entered.trim();
    if entered.is_empty() {
        return Ok(None);
    }
    entered
        .parse()
        .map(Some)
        .map_err(|_| Error::InvalidIdentifier(entered.to_string()))
}
