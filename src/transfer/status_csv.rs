//! Species status rating CSV import/export

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::managers::{Categories, Ratings, Schemes, SpeciesManager, SpeciesRatings};
use crate::model::{names_match, title_case, SpeciesStatusRating, StatusRatingTemplate};

use super::{parse_csv_datetime, CSV_DATETIME_FMT};

/// Fixed column layout for status rating files.
pub const STATUS_HEADER: [&str; 7] = [
    "Species", "Category", "Scheme", "Rating", "Region", "Start", "End",
];

/// Lookup values present in a file but not yet in the store. Ratings
/// are reported per existing scheme only: a scheme that is itself new
/// implies all its ratings, so they are not double-reported.
#[derive(Debug, Default, Clone)]
pub struct NewStatusLookups {
    pub categories: Vec<String>,
    pub species: Vec<String>,
    pub schemes: Vec<String>,
    /// (scheme, rating) pairs for ratings new to an existing scheme
    pub ratings: Vec<(String, String)>,
}

impl NewStatusLookups {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.species.is_empty()
            && self.schemes.is_empty()
            && self.ratings.is_empty()
    }
}

pub struct StatusTransfer<'a> {
    db: &'a Database,
}

impl<'a> StatusTransfer<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn read_records(&self, path: &Path) -> Result<Vec<StatusRatingTemplate>> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let mut templates = Vec::new();

        for record in reader.records() {
            let record = record?;
            let field = |i: usize| record.get(i).unwrap_or("").to_string();

            templates.push(StatusRatingTemplate {
                species: field(0),
                category: field(1),
                scheme: field(2),
                rating: field(3),
                region: field(4).trim().to_string(),
                start: parse_csv_datetime(&field(5))?,
                end: parse_csv_datetime(&field(6))?,
            });
        }

        Ok(templates)
    }

    pub fn detect_new_lookups(&self, path: &Path) -> Result<NewStatusLookups> {
        let templates = self.read_records(path)?;

        let categories = Categories::new(self.db).list(None, 1, 0)?;
        let species = SpeciesManager::new(self.db).list(None, 1, 0)?;
        let schemes = Schemes::new(self.db).list(None, 1, 0)?;
        let ratings = Ratings::new(self.db).list(None, 1, 0)?;

        let mut new = NewStatusLookups::default();
        for template in &templates {
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

            let scheme_name = title_case(&template.scheme);
            let scheme_exists = schemes.iter().any(|s| names_match(&s.name, &scheme_name));
            if !scheme_exists {
                if !new.schemes.contains(&scheme_name) {
                    new.schemes.push(scheme_name);
                }
                // Ratings under a new scheme are implied by it
                continue;
            }

            let rating_name = title_case(&template.rating);
            let rating_exists = ratings.iter().any(|r| {
                names_match(&r.name, &rating_name)
                    && r.scheme
                        .as_ref()
                        .is_some_and(|s| names_match(&s.name, &scheme_name))
            });
            let pair = (scheme_name, rating_name);
            if !rating_exists && !new.ratings.contains(&pair) {
                new.ratings.push(pair);
            }
        }

        Ok(new)
    }

    /// Null-safe duplicate check across species, rating (within its
    /// scheme), region, start and end. Region is compared trimmed and
    /// case-insensitively, consistent with name handling elsewhere.
    fn is_duplicate(
        existing: &[SpeciesStatusRating],
        template: &StatusRatingTemplate,
    ) -> bool {
        existing.iter().any(|record| {
            record
                .species
                .as_ref()
                .is_some_and(|s| names_match(&s.name, &template.species))
                && record.rating.as_ref().is_some_and(|r| {
                    names_match(&r.name, &template.rating)
                        && r.scheme
                            .as_ref()
                            .is_some_and(|s| names_match(&s.name, &template.scheme))
                })
                && record.region.trim().eq_ignore_ascii_case(template.region.trim())
                && template.start.is_some_and(|s| s == record.start)
                && record.end == template.end
        })
    }

    /// Import every record through the historical add path (no
    /// supersede), skipping records already present verbatim.
    /// Returns the number of records inserted.
    pub fn import(
        &self,
        path: &Path,
        mut progress: impl FnMut(usize, &SpeciesStatusRating),
    ) -> Result<usize> {
        let templates = self.read_records(path)?;
        let manager = SpeciesRatings::new(self.db);
        let mut inserted = 0;

        for (index, template) in templates.iter().enumerate() {
            let existing = manager.list(None, 1, 0)?;
            if Self::is_duplicate(&existing, template) {
                debug!(index = index + 1, "skipped duplicate rating record");
                continue;
            }

            let record = manager.add_from_template(template)?;
            inserted += 1;
            progress(index + 1, &record);
        }

        debug!(count = inserted, file = %path.display(), "imported status ratings");
        Ok(inserted)
    }

    pub fn export(
        &self,
        records: &[SpeciesStatusRating],
        path: &Path,
        mut progress: impl FnMut(usize, &SpeciesStatusRating),
    ) -> Result<usize> {
        let mut writer = WriterBuilder::new().from_path(path)?;
        writer.write_record(STATUS_HEADER)?;

        for (index, record) in records.iter().enumerate() {
            let species = record.species.as_ref();
            let rating = record.rating.as_ref();

            writer.write_record([
                species.map(|s| s.name.clone()).unwrap_or_default(),
                species
                    .and_then(|s| s.category.as_ref())
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                rating
                    .and_then(|r| r.scheme.as_ref())
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
                rating.map(|r| r.name.clone()).unwrap_or_default(),
                record.region.clone(),
                record.start.format(CSV_DATETIME_FMT).to_string(),
                record
                    .end
                    .map(|e| e.format(CSV_DATETIME_FMT).to_string())
                    .unwrap_or_default(),
            ])?;
            progress(index + 1, record);
        }

        writer.flush()?;
        debug!(count = records.len(), file = %path.display(), "exported status ratings");
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    const SAMPLE: &str = "\
Species,Category,Scheme,Rating,Region,Start,End
Nightingale,Birds,BOCC4,Red,United Kingdom,01/01/2015 00:00:00,
Curlew,Birds,BOCC4,Red,United Kingdom,01/01/2015 00:00:00,31/12/2020 23:59:59
";

    #[test]
    fn test_detect_new_scheme_implies_ratings() -> Result<()> {
        let db = Database::open_memory()?;
        let file = write_csv(SAMPLE);

        let new = StatusTransfer::new(&db).detect_new_lookups(file.path())?;
        assert_eq!(new.categories, vec!["Birds"]);
        assert_eq!(new.species, vec!["Nightingale", "Curlew"]);
        assert_eq!(new.schemes, vec!["BOCC4"]);
        // The scheme is new, so its ratings are implied rather than listed
        assert!(new.ratings.is_empty());

        Ok(())
    }

    #[test]
    fn test_detect_ratings_scoped_to_existing_scheme() -> Result<()> {
        let db = Database::open_memory()?;
        Schemes::new(&db).add("BOCC4")?;
        Ratings::new(&db).add("Amber", "BOCC4")?;

        let file = write_csv(SAMPLE);
        let new = StatusTransfer::new(&db).detect_new_lookups(file.path())?;

        assert!(new.schemes.is_empty());
        assert_eq!(new.ratings, vec![("BOCC4".to_string(), "Red".to_string())]);

        Ok(())
    }

    #[test]
    fn test_import_inserts_verbatim() -> Result<()> {
        let db = Database::open_memory()?;
        let file = write_csv(SAMPLE);

        let inserted = StatusTransfer::new(&db).import(file.path(), |_, _| {})?;
        assert_eq!(inserted, 2);

        let all = SpeciesRatings::new(&db).list(None, 1, 0)?;
        assert_eq!(all.len(), 2);

        let curlew = all
            .iter()
            .find(|r| r.species.as_ref().unwrap().name == "Curlew")
            .unwrap();
        assert!(curlew.end.is_some());

        Ok(())
    }

    #[test]
    fn test_import_skips_duplicates() -> Result<()> {
        let db = Database::open_memory()?;
        let file = write_csv(SAMPLE);
        let transfer = StatusTransfer::new(&db);

        transfer.import(file.path(), |_, _| {})?;
        // Importing the same file again inserts nothing
        let second = transfer.import(file.path(), |_, _| {})?;
        assert_eq!(second, 0);
        assert_eq!(SpeciesRatings::new(&db).list(None, 1, 0)?.len(), 2);

        Ok(())
    }

    #[test]
    fn test_duplicate_region_is_case_insensitive() -> Result<()> {
        let db = Database::open_memory()?;
        let transfer = StatusTransfer::new(&db);

        let first = write_csv(SAMPLE);
        transfer.import(first.path(), |_, _| {})?;

        let shouting = SAMPLE.replace("United Kingdom", "UNITED KINGDOM");
        let second = write_csv(&shouting);
        let inserted = transfer.import(second.path(), |_, _| {})?;
        assert_eq!(inserted, 0);

        Ok(())
    }

    #[test]
    fn test_export_round_trip() -> Result<()> {
        let db = Database::open_memory()?;
        let transfer = StatusTransfer::new(&db);
        let file = write_csv(SAMPLE);
        transfer.import(file.path(), |_, _| {})?;

        let records = SpeciesRatings::new(&db).list(None, 1, 0)?;
        let out = tempfile::NamedTempFile::new().unwrap();
        transfer.export(&records, out.path(), |_, _| {})?;

        let content = std::fs::read_to_string(out.path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Species,Category,Scheme,Rating,Region,Start,End"
        );
        assert_eq!(lines.count(), 2);

        // And a fresh import of the export is all duplicates
        let db2 = Database::open_memory()?;
        StatusTransfer::new(&db2).import(out.path(), |_, _| {})?;
        let again = StatusTransfer::new(&db2).import(out.path(), |_, _| {})?;
        assert_eq!(again, 0);

        Ok(())
    }
}
