//! Species manager

use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::model::{names_match, title_case, Species};

use super::{paginate, Categories};

pub struct SpeciesManager<'a> {
    db: &'a Database,
}

impl<'a> SpeciesManager<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self, predicate: impl Fn(&Species) -> bool) -> Result<Option<Species>> {
        Ok(self.db.species()?.into_iter().find(|s| predicate(s)))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Species>> {
        self.get(|s| names_match(&s.name, name))
    }

    pub fn list(
        &self,
        predicate: Option<&dyn Fn(&Species) -> bool>,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Species>> {
        let mut all = self.db.species()?;
        if let Some(predicate) = predicate {
            all.retain(|s| predicate(s));
        }
        Ok(paginate(all, page, page_size))
    }

    /// Species filtered by the joined category name.
    pub fn list_by_category(
        &self,
        category_name: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Species>> {
        let category_name = title_case(category_name);
        self.list(
            Some(&|s: &Species| {
                s.category
                    .as_ref()
                    .is_some_and(|c| names_match(&c.name, &category_name))
            }),
            page,
            page_size,
        )
    }

    /// Add a species, idempotently by name. The category is resolved or
    /// created idempotently too, and the returned species carries it.
    pub fn add(&self, name: &str, category_name: &str) -> Result<Species> {
        let name = title_case(name);
        if let Some(existing) = self.get_by_name(&name)? {
            return Ok(existing);
        }

        let category = Categories::new(self.db).add(category_name)?;
        let id = self.db.insert_species(&name, category.id)?;
        debug!(species = %name, id, category = %category.name, "added species");

        Ok(Species {
            id,
            name,
            category_id: category.id,
            category: Some(category),
        })
    }

    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<Species> {
        let new_name = title_case(new_name);
        if self.get_by_name(&new_name)?.is_some() {
            return Err(Error::already_exists("species", new_name));
        }

        let mut species = self
            .get_by_name(old_name)?
            .ok_or_else(|| Error::not_found("species", title_case(old_name)))?;

        species.name = new_name;
        self.db.update_species(&species)?;
        debug!(id = species.id, species = %species.name, "renamed species");
        Ok(species)
    }

    /// Move a species to another existing category. The target category
    /// is not created on demand here, unlike `add`.
    pub fn move_to(&self, species_name: &str, category_name: &str) -> Result<Species> {
        let mut species = self
            .get_by_name(species_name)?
            .ok_or_else(|| Error::not_found("species", title_case(species_name)))?;

        let category = Categories::new(self.db)
            .get_by_name(category_name)?
            .ok_or_else(|| Error::not_found("category", title_case(category_name)))?;

        if species.category_id == category.id {
            return Err(Error::AlreadyInCategory {
                species: species.name,
                category: category.name,
            });
        }

        species.category_id = category.id;
        self.db.update_species(&species)?;
        debug!(id = species.id, category = %category.name, "moved species");

        species.category = Some(category);
        Ok(species)
    }

    /// Delete a species. Fails while any sighting or status rating
    /// still references it.
    pub fn delete(&self, name: &str) -> Result<()> {
        let species = self
            .get_by_name(name)?
            .ok_or_else(|| Error::not_found("species", title_case(name)))?;

        let sighted = self
            .db
            .sightings()?
            .iter()
            .any(|s| s.species_id == species.id);
        let rated = self
            .db
            .species_ratings()?
            .iter()
            .any(|r| r.species_id == species.id);
        if sighted || rated {
            return Err(Error::in_use("species", species.name));
        }

        self.db.delete_species(species.id)?;
        debug!(id = species.id, "deleted species");
        Ok(())
    }
}
