//! Sighting manager

use chrono::NaiveDate;
use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::model::{names_match, title_case, Gender, Sighting, SightingTemplate};
use crate::report::Summary;

use super::{paginate, Locations, SpeciesManager};

pub struct Sightings<'a> {
    db: &'a Database,
}

impl<'a> Sightings<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self, predicate: impl Fn(&Sighting) -> bool) -> Result<Option<Sighting>> {
        Ok(self.db.sightings()?.into_iter().find(|s| predicate(s)))
    }

    pub fn list(
        &self,
        predicate: Option<&dyn Fn(&Sighting) -> bool>,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Sighting>> {
        let mut all = self.db.sightings()?;
        if let Some(predicate) = predicate {
            all.retain(|s| predicate(s));
        }
        Ok(paginate(all, page, page_size))
    }

    /// Record a sighting. The de-duplication key is (date, species,
    /// location): a repeat entry updates the existing sighting's
    /// number, gender and with-young flag rather than duplicating it.
    /// The returned sighting has location, species and category loaded.
    pub fn add(
        &self,
        number: u32,
        gender: Gender,
        with_young: bool,
        date: NaiveDate,
        location_id: i64,
        species_id: i64,
    ) -> Result<Sighting> {
        if let Some(mut existing) = self.get(|s| {
            s.date == date && s.species_id == species_id && s.location_id == location_id
        })? {
            existing.number = number;
            existing.gender = gender;
            existing.with_young = with_young;
            self.db.update_sighting(&existing)?;
            debug!(id = existing.id, "updated existing sighting");
            return Ok(existing);
        }

        let id = self.db.insert_sighting(&Sighting {
            id: 0,
            location_id,
            species_id,
            date,
            number,
            gender,
            with_young,
            location: None,
            species: None,
        })?;
        debug!(id, species_id, location_id, %date, "added sighting");

        // Reload so the relations come back populated
        self.get(|s| s.id == id)?
            .ok_or_else(|| Error::not_found("sighting", id.to_string()))
    }

    /// Record a sighting from a template carrying nested location and
    /// species names: the lookups are resolved or created idempotently
    /// first. This is the composition point used by CSV import.
    pub fn add_from_template(&self, template: &SightingTemplate) -> Result<Sighting> {
        let location = Locations::new(self.db).add(template.location.clone())?;
        let species = SpeciesManager::new(self.db).add(&template.species, &template.category)?;

        self.add(
            template.number,
            template.gender,
            template.with_young,
            template.date,
            location.id,
            species.id,
        )
    }

    pub fn list_by_location(
        &self,
        location_name: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Sighting>> {
        let name = title_case(location_name);
        self.list(
            Some(&|s: &Sighting| {
                s.location.as_ref().is_some_and(|l| names_match(&l.name, &name))
            }),
            page,
            page_size,
        )
    }

    pub fn list_by_species(
        &self,
        species_name: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Sighting>> {
        let name = title_case(species_name);
        self.list(
            Some(&|s: &Sighting| {
                s.species.as_ref().is_some_and(|sp| names_match(&sp.name, &name))
            }),
            page,
            page_size,
        )
    }

    pub fn list_by_category(
        &self,
        category_name: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Sighting>> {
        let name = title_case(category_name);
        self.list(
            Some(&|s: &Sighting| {
                s.species
                    .as_ref()
                    .and_then(|sp| sp.category.as_ref())
                    .is_some_and(|c| names_match(&c.name, &name))
            }),
            page,
            page_size,
        )
    }

    pub fn list_by_date(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Sighting>> {
        self.list(
            Some(&|s: &Sighting| s.date >= from && s.date <= to),
            page,
            page_size,
        )
    }

    /// Build a summary of the sightings in `[from, to]` inclusive,
    /// narrowed by the optional filters (all combined with AND).
    pub fn summarise(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        location_id: Option<i64>,
        category_id: Option<i64>,
        species_id: Option<i64>,
    ) -> Result<Summary> {
        let matches = self.list(
            Some(&|s: &Sighting| {
                s.date >= from
                    && s.date <= to
                    && location_id.is_none_or(|id| s.location_id == id)
                    && species_id.is_none_or(|id| s.species_id == id)
                    && category_id.is_none_or(|id| {
                        s.species.as_ref().is_some_and(|sp| sp.category_id == id)
                    })
            }),
            1,
            0,
        )?;

        Ok(Summary::new(matches))
    }

    /// Delete a sighting by id.
    pub fn delete(&self, id: i64) -> Result<()> {
        self.get(|s| s.id == id)?
            .ok_or_else(|| Error::not_found("sighting", id.to_string()))?;

        self.db.delete_sighting(id)?;
        debug!(id, "deleted sighting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::Categories;
    use crate::model::Location;

    fn seed(db: &Database) -> Result<(i64, i64)> {
        let robin = SpeciesManager::new(db).add("Robin", "Birds")?;
        let wood = Locations::new(db).add(Location {
            name: "Bagley Wood".to_string(),
            ..Default::default()
        })?;
        Ok((wood.id, robin.id))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_loads_relations() -> Result<()> {
        let db = Database::open_memory()?;
        let (location_id, species_id) = seed(&db)?;

        let sighting = Sightings::new(&db).add(
            2,
            Gender::Both,
            false,
            date(2024, 5, 1),
            location_id,
            species_id,
        )?;

        assert_eq!(sighting.location.as_ref().unwrap().name, "Bagley Wood");
        let species = sighting.species.as_ref().unwrap();
        assert_eq!(species.name, "Robin");
        assert_eq!(species.category.as_ref().unwrap().name, "Birds");

        Ok(())
    }

    #[test]
    fn test_add_same_key_updates_in_place() -> Result<()> {
        let db = Database::open_memory()?;
        let (location_id, species_id) = seed(&db)?;
        let sightings = Sightings::new(&db);

        let first = sightings.add(
            1,
            Gender::Unknown,
            false,
            date(2024, 5, 1),
            location_id,
            species_id,
        )?;
        let second = sightings.add(
            3,
            Gender::Male,
            true,
            date(2024, 5, 1),
            location_id,
            species_id,
        )?;

        assert_eq!(first.id, second.id);
        assert_eq!(sightings.list(None, 1, 0)?.len(), 1);

        let stored = sightings.get(|s| s.id == first.id)?.unwrap();
        assert_eq!(stored.number, 3);
        assert_eq!(stored.gender, Gender::Male);
        assert!(stored.with_young);

        Ok(())
    }

    #[test]
    fn test_different_date_is_a_new_sighting() -> Result<()> {
        let db = Database::open_memory()?;
        let (location_id, species_id) = seed(&db)?;
        let sightings = Sightings::new(&db);

        sightings.add(1, Gender::Unknown, false, date(2024, 5, 1), location_id, species_id)?;
        sightings.add(1, Gender::Unknown, false, date(2024, 5, 2), location_id, species_id)?;
        assert_eq!(sightings.list(None, 1, 0)?.len(), 2);

        Ok(())
    }

    #[test]
    fn test_add_from_template_creates_lookups() -> Result<()> {
        let db = Database::open_memory()?;
        let sightings = Sightings::new(&db);

        let sighting = sightings.add_from_template(&SightingTemplate {
            species: "red kite".to_string(),
            category: "birds".to_string(),
            number: 1,
            gender: Gender::Unknown,
            with_young: false,
            date: date(2024, 6, 10),
            location: Location {
                name: "port meadow".to_string(),
                city: Some("Oxford".to_string()),
                ..Default::default()
            },
        })?;

        assert_eq!(sighting.species.as_ref().unwrap().name, "Red Kite");
        assert_eq!(sighting.location.as_ref().unwrap().name, "Port Meadow");
        assert!(Categories::new(&db).get_by_name("Birds")?.is_some());

        Ok(())
    }

    #[test]
    fn test_list_filters() -> Result<()> {
        let db = Database::open_memory()?;
        let sightings = Sightings::new(&db);

        sightings.add_from_template(&SightingTemplate {
            species: "Robin".to_string(),
            category: "Birds".to_string(),
            number: 1,
            gender: Gender::Unknown,
            with_young: false,
            date: date(2024, 5, 1),
            location: Location {
                name: "Bagley Wood".to_string(),
                ..Default::default()
            },
        })?;
        sightings.add_from_template(&SightingTemplate {
            species: "Badger".to_string(),
            category: "Mammals".to_string(),
            number: 2,
            gender: Gender::Unknown,
            with_young: false,
            date: date(2024, 5, 3),
            location: Location {
                name: "Port Meadow".to_string(),
                ..Default::default()
            },
        })?;

        assert_eq!(sightings.list_by_location("bagley wood", 1, 0)?.len(), 1);
        assert_eq!(sightings.list_by_species("badger", 1, 0)?.len(), 1);
        assert_eq!(sightings.list_by_category("birds", 1, 0)?.len(), 1);
        assert_eq!(
            sightings
                .list_by_date(date(2024, 5, 1), date(2024, 5, 2), 1, 0)?
                .len(),
            1
        );
        assert_eq!(
            sightings
                .list_by_date(date(2024, 5, 1), date(2024, 5, 3), 1, 0)?
                .len(),
            2
        );

        Ok(())
    }

    #[test]
    fn test_summarise_combines_filters() -> Result<()> {
        let db = Database::open_memory()?;
        let sightings = Sightings::new(&db);

        let robin = sightings.add_from_template(&SightingTemplate {
            species: "Robin".to_string(),
            category: "Birds".to_string(),
            number: 1,
            gender: Gender::Unknown,
            with_young: false,
            date: date(2024, 5, 1),
            location: Location {
                name: "Bagley Wood".to_string(),
                ..Default::default()
            },
        })?;
        sightings.add_from_template(&SightingTemplate {
            species: "Wren".to_string(),
            category: "Birds".to_string(),
            number: 1,
            gender: Gender::Unknown,
            with_young: false,
            date: date(2024, 5, 2),
            location: Location {
                name: "Port Meadow".to_string(),
                ..Default::default()
            },
        })?;

        let summary = sightings.summarise(
            date(2024, 5, 1),
            date(2024, 5, 31),
            Some(robin.location_id),
            None,
            None,
        )?;
        assert_eq!(summary.sightings.len(), 1);
        assert_eq!(summary.species().len(), 1);
        assert_eq!(summary.species()[0].name, "Robin");

        let all = sightings.summarise(date(2024, 5, 1), date(2024, 5, 31), None, None, None)?;
        assert_eq!(all.sightings.len(), 2);

        Ok(())
    }

    #[test]
    fn test_delete_by_id() -> Result<()> {
        let db = Database::open_memory()?;
        let (location_id, species_id) = seed(&db)?;
        let sightings = Sightings::new(&db);

        let sighting = sightings.add(
            1,
            Gender::Unknown,
            false,
            date(2024, 5, 1),
            location_id,
            species_id,
        )?;
        sightings.delete(sighting.id)?;
        assert!(sightings.list(None, 1, 0)?.is_empty());

        let result = sightings.delete(sighting.id);
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }
}
