//! Sighting CSV import/export

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::managers::{Categories, Locations, Sightings, SpeciesManager};
use crate::model::{names_match, title_case, Location, Sighting, SightingTemplate};

use super::{optional, parse_bool, parse_csv_date, CSV_DATE_FMT};

/// Fixed column layout for sighting files.
pub const SIGHTING_HEADER: [&str; 14] = [
    "Species",
    "Category",
    "Number",
    "Gender",
    "WithYoung",
    "Date",
    "Location",
    "Address",
    "City",
    "County",
    "Postcode",
    "Country",
    "Latitude",
    "Longitude",
];

/// Lookup values present in a file but not yet in the store.
#[derive(Debug, Default, Clone)]
pub struct NewSightingLookups {
    pub locations: Vec<String>,
    pub categories: Vec<String>,
    pub species: Vec<String>,
}

impl NewSightingLookups {
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty() && self.categories.is_empty() && self.species.is_empty()
    }
}

pub struct SightingsTransfer<'a> {
    db: &'a Database,
}

impl<'a> SightingsTransfer<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Read and convert all records, without touching the store.
    fn read_records(&self, path: &Path) -> Result<Vec<SightingTemplate>> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let mut templates = Vec::new();

        for record in reader.records() {
            let record = record?;
            let field = |i: usize| record.get(i).unwrap_or("").to_string();

            templates.push(SightingTemplate {
                species: field(0),
                category: field(1),
                number: field(2)
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidNumber(field(2).trim().to_string()))?,
                gender: field(3).parse().unwrap_or_default(),
                with_young: parse_bool(&field(4)),
                date: parse_csv_date(&field(5))?,
                location: Location {
                    id: 0,
                    name: field(6),
                    address: optional(&field(7)),
                    city: optional(&field(8)),
                    county: optional(&field(9)),
                    postcode: optional(&field(10)),
                    country: optional(&field(11)),
                    latitude: field(12).trim().parse().ok(),
                    longitude: field(13).trim().parse().ok(),
                },
            });
        }

        Ok(templates)
    }

    /// Diff the file's lookup values against the store, returning only
    /// the names an import would create.
    pub fn detect_new_lookups(&self, path: &Path) -> Result<NewSightingLookups> {
        let templates = self.read_records(path)?;

        let locations = Locations::new(self.db).list(None, 1, 0)?;
        let categories = Categories::new(self.db).list(None, 1, 0)?;
        let species = SpeciesManager::new(self.db).list(None, 1, 0)?;

        let mut new = NewSightingLookups::default();
        for template in &templates {
            let location_name = title_case(&template.location.name);
            if !locations.iter().any(|l| names_match(&l.name, &location_name))
                && !new.locations.contains(&location_name)
            {
                new.locations.push(location_name);
            }

            let category_name = title_case(&template.category);
            if !categories.iter().any(|c| names_match(&c.name, &category_name))
                && !new.categories.contains(&category_name)
            {
                new.categories.push(category_name);
            }

            let species_name = title_case(&template.species);
            if !species.iter().any(|s| names_match(&s.name, &species_name))
                && !new.species.contains(&species_name)
            {
                new.species.push(species_name);
            }
        }

        Ok(new)
    }

    /// Import every record, creating dependent lookups idempotently.
    /// The progress callback fires once per record processed.
    pub fn import(
        &self,
        path: &Path,
        mut progress: impl FnMut(usize, &Sighting),
    ) -> Result<usize> {
        let templates = self.read_records(path)?;
        let sightings = Sightings::new(self.db);

        for (index, template) in templates.iter().enumerate() {
            let sighting = sightings.add_from_template(template)?;
            progress(index + 1, &sighting);
        }

        debug!(count = templates.len(), file = %path.display(), "imported sightings");
        Ok(templates.len())
    }

    /// Write one header line then one line per sighting, in the order
    /// supplied by the caller.
    pub fn export(
        &self,
        sightings: &[Sighting],
        path: &Path,
        mut progress: impl FnMut(usize, &Sighting),
    ) -> Result<usize> {
        let mut writer = WriterBuilder::new().from_path(path)?;
        writer.write_record(SIGHTING_HEADER)?;

        for (index, sighting) in sightings.iter().enumerate() {
            let species = sighting.species.as_ref();
            let category = species.and_then(|s| s.category.as_ref());
            let location = sighting.location.as_ref();
            let blank = String::new();

            writer.write_record([
                species.map(|s| s.name.clone()).unwrap_or_default(),
                category.map(|c| c.name.clone()).unwrap_or_default(),
                sighting.number.to_string(),
                sighting.gender.to_string(),
                if sighting.with_young { "Yes" } else { "No" }.to_string(),
                sighting.date.format(CSV_DATE_FMT).to_string(),
                location.map(|l| l.name.clone()).unwrap_or_default(),
                location.and_then(|l| l.address.clone()).unwrap_or_default(),
                location.and_then(|l| l.city.clone()).unwrap_or_default(),
                location.and_then(|l| l.county.clone()).unwrap_or_default(),
                location.and_then(|l| l.postcode.clone()).unwrap_or_default(),
                location.and_then(|l| l.country.clone()).unwrap_or_default(),
                location
                    .and_then(|l| l.latitude.map(|v| v.to_string()))
                    .unwrap_or_else(|| blank.clone()),
                location
                    .and_then(|l| l.longitude.map(|v| v.to_string()))
                    .unwrap_or_else(|| blank.clone()),
            ])?;
            progress(index + 1, sighting);
        }

        writer.flush()?;
        debug!(count = sightings.len(), file = %path.display(), "exported sightings");
        Ok(sightings.len())
    }
}
