//! Location manager

use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::model::{names_match, title_case, Location};

use super::paginate;

pub struct Locations<'a> {
    db: &'a Database,
}

impl<'a> Locations<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self, predicate: impl Fn(&Location) -> bool) -> Result<Option<Location>> {
        Ok(self.db.locations()?.into_iter().find(|l| predicate(l)))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Location>> {
        self.get(|l| names_match(&l.name, name))
    }

    pub fn list(
        &self,
        predicate: Option<&dyn Fn(&Location) -> bool>,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Location>> {
        let mut all = self.db.locations()?;
        if let Some(predicate) = predicate {
            all.retain(|l| predicate(l));
        }
        Ok(paginate(all, page, page_size))
    }

    /// Add a location, idempotently by name. A repeat add returns the
    /// stored entity unchanged: no field update occurs, even when the
    /// template carries different address details.
    pub fn add(&self, template: Location) -> Result<Location> {
        let name = title_case(&template.name);
        if let Some(existing) = self.get_by_name(&name)? {
            return Ok(existing);
        }

        let location = self.db.insert_location(&Location { name, ..template })?;
        debug!(location = %location.name, id = location.id, "added location");
        Ok(location)
    }

    /// Update an existing location's detail fields in place.
    /// The name itself only changes through `rename`.
    pub fn update(&self, location: &Location) -> Result<()> {
        self.get(|l| l.id == location.id)?
            .ok_or_else(|| Error::not_found("location", location.name.clone()))?;
        self.db.update_location(location)?;
        debug!(id = location.id, "updated location");
        Ok(())
    }

    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<Location> {
        let new_name = title_case(new_name);
        if self.get_by_name(&new_name)?.is_some() {
            return Err(Error::already_exists("location", new_name));
        }

        let mut location = self
            .get_by_name(old_name)?
            .ok_or_else(|| Error::not_found("location", title_case(old_name)))?;

        location.name = new_name;
        self.db.update_location(&location)?;
        debug!(id = location.id, location = %location.name, "renamed location");
        Ok(location)
    }

    /// Delete a location. Fails while any sighting still references it.
    pub fn delete(&self, name: &str) -> Result<()> {
        let location = self
            .get_by_name(name)?
            .ok_or_else(|| Error::not_found("location", title_case(name)))?;

        let in_use = self
            .db
            .sightings()?
            .iter()
            .any(|s| s.location_id == location.id);
        if in_use {
            return Err(Error::in_use("location", location.name));
        }

        self.db.delete_location(location.id)?;
        debug!(id = location.id, "deleted location");
        Ok(())
    }
}
