//! Species status rating manager
//!
//! Assignments of a conservation rating to a species are time-bounded;
//! a record with no end is the one currently in effect. At most one
//! open record may exist per (species, scheme): `set_rating` closes the
//! prior open record before inserting the new one.

use chrono::{Duration, Local};
use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::model::{names_match, title_case, SpeciesStatusRating, StatusRatingTemplate};

use super::{paginate, Ratings, Schemes, SpeciesManager};

pub struct SpeciesRatings<'a> {
    db: &'a Database,
}

impl<'a> SpeciesRatings<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(
        &self,
        predicate: impl Fn(&SpeciesStatusRating) -> bool,
    ) -> Result<Option<SpeciesStatusRating>> {
        Ok(self.db.species_ratings()?.into_iter().find(|r| predicate(r)))
    }

    pub fn list(
        &self,
        predicate: Option<&dyn Fn(&SpeciesStatusRating) -> bool>,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<SpeciesStatusRating>> {
        let mut all = self.db.species_ratings()?;
        if let Some(predicate) = predicate {
            all.retain(|r| predicate(r));
        }
        Ok(paginate(all, page, page_size))
    }

    pub fn list_by_species(
        &self,
        species_name: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<SpeciesStatusRating>> {
        let name = title_case(species_name);
        self.list(
            Some(&|r: &SpeciesStatusRating| {
                r.species.as_ref().is_some_and(|s| names_match(&s.name, &name))
            }),
            page,
            page_size,
        )
    }

    /// The open-ended rating for a species under a scheme, if any.
    /// Unknown species or scheme is an error; having no current rating
    /// is not.
    pub fn get_current(
        &self,
        species_name: &str,
        scheme_name: &str,
    ) -> Result<Option<SpeciesStatusRating>> {
        let species = SpeciesManager::new(self.db)
            .get_by_name(species_name)?
            .ok_or_else(|| Error::not_found("species", title_case(species_name)))?;
        let scheme = Schemes::new(self.db)
            .get_by_name(scheme_name)?
            .ok_or_else(|| Error::SchemeNotFound(title_case(scheme_name)))?;

        self.get(|r| {
            r.species_id == species.id
                && r.end.is_none()
                && r.rating
                    .as_ref()
                    .is_some_and(|rating| rating.scheme_id == scheme.id)
        })
    }

    /// Assign a rating to a species, superseding the current one: the
    /// prior open record is closed at yesterday 23:59:59, collapsing
    /// its start to match when that would invert the range (a rating
    /// replaced on the day it started). The new record starts today at
    /// midnight and is open-ended.
    pub fn set_rating(
        &self,
        species_name: &str,
        rating_name: &str,
        scheme_name: &str,
    ) -> Result<SpeciesStatusRating> {
        let species = SpeciesManager::new(self.db)
            .get_by_name(species_name)?
            .ok_or_else(|| Error::not_found("species", title_case(species_name)))?;
        let scheme = Schemes::new(self.db)
            .get_by_name(scheme_name)?
            .ok_or_else(|| Error::SchemeNotFound(title_case(scheme_name)))?;
        let rating = Ratings::new(self.db)
            .get_by_name(rating_name, &scheme.name)?
            .ok_or_else(|| Error::RatingNotFound {
                rating: title_case(rating_name),
                scheme: scheme.name.clone(),
            })?;

        let today = Local::now().date_naive();

        let open = self.get(|r| {
            r.species_id == species.id
                && r.end.is_none()
                && r.rating
                    .as_ref()
                    .is_some_and(|rating| rating.scheme_id == scheme.id)
        })?;

        // Close-then-insert must land together or not at all
        let id = self.db.transaction(|| {
            let mut region = String::new();

            if let Some(mut previous) = open {
                let end_of_yesterday =
                    (today - Duration::days(1)).and_hms_opt(23, 59, 59).unwrap();
                previous.end = Some(end_of_yesterday);
                if end_of_yesterday < previous.start {
                    previous.start = end_of_yesterday;
                }
                region = previous.region.clone();
                self.db.update_species_rating(&previous)?;
                debug!(id = previous.id, "closed superseded rating");
            }

            self.db.insert_species_rating(&SpeciesStatusRating {
                id: 0,
                species_id: species.id,
                rating_id: rating.id,
                region,
                start: today.and_hms_opt(0, 0, 0).unwrap(),
                end: None,
                species: None,
                rating: None,
            })
        })?;
        debug!(id, species = %species.name, rating = %rating.name, scheme = %scheme.name, "set rating");

        self.get(|r| r.id == id)?
            .ok_or_else(|| Error::not_found("species status rating", id.to_string()))
    }

    /// Close the current rating for a species under a scheme, ending it
    /// now. Doing nothing when there is no current rating is not an
    /// error.
    pub fn clear_rating(&self, species_name: &str, scheme_name: &str) -> Result<()> {
        if let Some(mut current) = self.get_current(species_name, scheme_name)? {
            current.end = Some(Local::now().naive_local());
            self.db.update_species_rating(&current)?;
            debug!(id = current.id, "cleared current rating");
        }
        Ok(())
    }

    /// Insert a rating record verbatim from a template, creating any
    /// missing species, scheme or rating idempotently. No supersede
    /// logic runs: bulk/historical import expects overlapping and
    /// closed records exactly as supplied.
    pub fn add_from_template(&self, template: &StatusRatingTemplate) -> Result<SpeciesStatusRating> {
        let species =
            SpeciesManager::new(self.db).add(&template.species, &template.category)?;
        Schemes::new(self.db).add(&template.scheme)?;
        let rating = Ratings::new(self.db).add(&template.rating, &template.scheme)?;

        let start = template
            .start
            .unwrap_or_else(|| Local::now().date_naive().and_hms_opt(0, 0, 0).unwrap());

        let id = self.db.insert_species_rating(&SpeciesStatusRating {
            id: 0,
            species_id: species.id,
            rating_id: rating.id,
            region: template.region.trim().to_string(),
            start,
            end: template.end,
            species: None,
            rating: None,
        })?;
        debug!(id, species = %species.name, rating = %rating.name, "imported rating record");

        self.get(|r| r.id == id)?
            .ok_or_else(|| Error::not_found("species status rating", id.to_string()))
    }

    /// Remove a single rating record by id.
    pub fn delete(&self, id: i64) -> Result<()> {
        self.get(|r| r.id == id)?
            .ok_or_else(|| Error::not_found("species status rating", id.to_string()))?;
        self.db.delete_species_rating(id)?;
        debug!(id, "deleted species status rating");
        Ok(())
    }
}
