//! Conservation status scheme and rating managers
//!
//! A scheme (e.g. "BOCC4") owns its rating values (e.g. "Red", "Amber",
//! "Green"). Deleting a scheme cascades to its ratings, but is blocked
//! outright while any of those ratings is assigned to a species.

use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::model::{names_match, title_case, StatusRating, StatusScheme};

use super::paginate;

pub struct Schemes<'a> {
    db: &'a Database,
}

impl<'a> Schemes<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self, predicate: impl Fn(&StatusScheme) -> bool) -> Result<Option<StatusScheme>> {
        Ok(self.db.schemes()?.into_iter().find(|s| predicate(s)))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<StatusScheme>> {
        self.get(|s| names_match(&s.name, name))
    }

    pub fn list(
        &self,
        predicate: Option<&dyn Fn(&StatusScheme) -> bool>,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<StatusScheme>> {
        let mut all = self.db.schemes()?;
        if let Some(predicate) = predicate {
            all.retain(|s| predicate(s));
        }
        Ok(paginate(all, page, page_size))
    }

    pub fn add(&self, name: &str) -> Result<StatusScheme> {
        let name = title_case(name);
        if let Some(existing) = self.get_by_name(&name)? {
            return Ok(existing);
        }

        let scheme = self.db.insert_scheme(&name)?;
        debug!(scheme = %scheme.name, id = scheme.id, "added status scheme");
        Ok(scheme)
    }

    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<StatusScheme> {
        let new_name = title_case(new_name);
        if self.get_by_name(&new_name)?.is_some() {
            return Err(Error::already_exists("status scheme", new_name));
        }

        let mut scheme = self
            .get_by_name(old_name)?
            .ok_or_else(|| Error::not_found("status scheme", title_case(old_name)))?;

        scheme.name = new_name;
        self.db.update_scheme(&scheme)?;
        debug!(id = scheme.id, scheme = %scheme.name, "renamed status scheme");
        Ok(scheme)
    }

    /// Delete a scheme and cascade to its ratings. Blocked while any of
    /// the scheme's ratings is referenced by a species status rating.
    pub fn delete(&self, name: &str) -> Result<()> {
        let scheme = self
            .get_by_name(name)?
            .ok_or_else(|| Error::not_found("status scheme", title_case(name)))?;

        let ratings: Vec<StatusRating> = self
            .db
            .ratings()?
            .into_iter()
            .filter(|r| r.scheme_id == scheme.id)
            .collect();

        let assignments = self.db.species_ratings()?;
        let in_use = ratings
            .iter()
            .any(|r| assignments.iter().any(|a| a.rating_id == r.id));
        if in_use {
            return Err(Error::in_use("status scheme", scheme.name));
        }

        self.db.transaction(|| {
            for rating in &ratings {
                self.db.delete_rating(rating.id)?;
            }
            self.db.delete_scheme(scheme.id)
        })?;
        debug!(id = scheme.id, ratings = ratings.len(), "deleted status scheme");
        Ok(())
    }
}

pub struct Ratings<'a> {
    db: &'a Database,
}

impl<'a> Ratings<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self, predicate: impl Fn(&StatusRating) -> bool) -> Result<Option<StatusRating>> {
        Ok(self.db.ratings()?.into_iter().find(|r| predicate(r)))
    }

    /// Rating with the given name under the given scheme. Rating names
    /// are only unique within their scheme.
    pub fn get_by_name(&self, name: &str, scheme_name: &str) -> Result<Option<StatusRating>> {
        self.get(|r| {
            names_match(&r.name, name)
                && r.scheme
                    .as_ref()
                    .is_some_and(|s| names_match(&s.name, scheme_name))
        })
    }

    pub fn list(
        &self,
        predicate: Option<&dyn Fn(&StatusRating) -> bool>,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<StatusRating>> {
        let mut all = self.db.ratings()?;
        if let Some(predicate) = predicate {
            all.retain(|r| predicate(r));
        }
        Ok(paginate(all, page, page_size))
    }

    pub fn list_by_scheme(
        &self,
        scheme_name: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<StatusRating>> {
        let scheme_name = title_case(scheme_name);
        self.list(
            Some(&|r: &StatusRating| {
                r.scheme
                    .as_ref()
                    .is_some_and(|s| names_match(&s.name, &scheme_name))
            }),
            page,
            page_size,
        )
    }

    /// Add a rating to an existing scheme, idempotently per scheme.
    pub fn add(&self, name: &str, scheme_name: &str) -> Result<StatusRating> {
        let scheme = Schemes::new(self.db)
            .get_by_name(scheme_name)?
            .ok_or_else(|| Error::SchemeNotFound(title_case(scheme_name)))?;

        let name = title_case(name);
        if let Some(existing) = self.get_by_name(&name, &scheme.name)? {
            return Ok(existing);
        }

        let id = self.db.insert_rating(&name, scheme.id)?;
        debug!(rating = %name, id, scheme = %scheme.name, "added status rating");

        Ok(StatusRating {
            id,
            name,
            scheme_id: scheme.id,
            scheme: Some(scheme),
        })
    }

    pub fn rename(&self, old_name: &str, new_name: &str, scheme_name: &str) -> Result<StatusRating> {
        let new_name = title_case(new_name);
        if self.get_by_name(&new_name, scheme_name)?.is_some() {
            return Err(Error::already_exists("status rating", new_name));
        }

        let mut rating = self.get_by_name(old_name, scheme_name)?.ok_or_else(|| {
            Error::RatingNotFound {
                rating: title_case(old_name),
                scheme: title_case(scheme_name),
            }
        })?;

        rating.name = new_name;
        self.db.update_rating(&rating)?;
        debug!(id = rating.id, rating = %rating.name, "renamed status rating");
        Ok(rating)
    }

    /// Delete a rating. Blocked while any species status rating uses it.
    pub fn delete(&self, name: &str, scheme_name: &str) -> Result<()> {
        let rating = self.get_by_name(name, scheme_name)?.ok_or_else(|| {
            Error::RatingNotFound {
                rating: title_case(name),
                scheme: title_case(scheme_name),
            }
        })?;

        let in_use = self
            .db
            .species_ratings()?
            .iter()
            .any(|a| a.rating_id == rating.id);
        if in_use {
            return Err(Error::in_use("status rating", rating.name));
        }

        self.db.delete_rating(rating.id)?;
        debug!(id = rating.id, "deleted status rating");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::{SpeciesManager, SpeciesRatings};

    #[test]
    fn test_scheme_add_idempotent() -> Result<()> {
        let db = Database::open_memory()?;
        let schemes = Schemes::new(&db);

        let first = schemes.add("bocc4")?;
        let second = schemes.add(" BOCC4 ")?;
        assert_eq!(first.id, second.id);
        assert_eq!(first.name, "BOCC4");

        Ok(())
    }

    #[test]
    fn test_rating_scoped_to_scheme() -> Result<()> {
        let db = Database::open_memory()?;
        let schemes = Schemes::new(&db);
        let ratings = Ratings::new(&db);

        schemes.add("BOCC4")?;
        schemes.add("BOCC5")?;

        // Same rating name under two schemes is two distinct ratings
        let red4 = ratings.add("Red", "BOCC4")?;
        let red5 = ratings.add("Red", "BOCC5")?;
        assert_ne!(red4.id, red5.id);

        // But a repeat under the same scheme is idempotent
        let again = ratings.add("red", "bocc4")?;
        assert_eq!(again.id, red4.id);

        Ok(())
    }

    #[test]
    fn test_rating_unknown_scheme() -> Result<()> {
        let db = Database::open_memory()?;
        let ratings = Ratings::new(&db);

        let result = ratings.add("Red", "BOCC4");
        assert!(matches!(result, Err(Error::SchemeNotFound(_))));

        Ok(())
    }

    #[test]
    fn test_list_by_scheme() -> Result<()> {
        let db = Database::open_memory()?;
        let schemes = Schemes::new(&db);
        let ratings = Ratings::new(&db);

        schemes.add("BOCC4")?;
        schemes.add("IUCN")?;
        ratings.add("Red", "BOCC4")?;
        ratings.add("Amber", "BOCC4")?;
        ratings.add("Least Concern", "IUCN")?;

        let bocc = ratings.list_by_scheme("bocc4", 1, 0)?;
        assert_eq!(bocc.len(), 2);

        Ok(())
    }

    #[test]
    fn test_scheme_delete_cascades_ratings() -> Result<()> {
        let db = Database::open_memory()?;
        let schemes = Schemes::new(&db);
        let ratings = Ratings::new(&db);

        schemes.add("BOCC4")?;
        ratings.add("Red", "BOCC4")?;
        ratings.add("Amber", "BOCC4")?;

        schemes.delete("BOCC4")?;
        assert!(schemes.get_by_name("BOCC4")?.is_none());
        assert_eq!(ratings.list(None, 1, 0)?.len(), 0);

        Ok(())
    }

    #[test]
    fn test_scheme_delete_blocked_when_rating_in_use() -> Result<()> {
        let db = Database::open_memory()?;
        let schemes = Schemes::new(&db);
        let ratings = Ratings::new(&db);

        SpeciesManager::new(&db).add("Nightingale", "Birds")?;
        schemes.add("BOCC4")?;
        ratings.add("Red", "BOCC4")?;
        SpeciesRatings::new(&db).set_rating("Nightingale", "Red", "BOCC4")?;

        let result = schemes.delete("BOCC4");
        assert!(matches!(result, Err(Error::InUse { .. })));

        // Nothing was cascaded
        assert!(schemes.get_by_name("BOCC4")?.is_some());
        assert_eq!(ratings.list_by_scheme("BOCC4", 1, 0)?.len(), 1);

        Ok(())
    }

    #[test]
    fn test_rating_delete_blocked_when_in_use() -> Result<()> {
        let db = Database::open_memory()?;

        SpeciesManager::new(&db).add("Nightingale", "Birds")?;
        Schemes::new(&db).add("BOCC4")?;
        Ratings::new(&db).add("Red", "BOCC4")?;
        SpeciesRatings::new(&db).set_rating("Nightingale", "Red", "BOCC4")?;

        let result = Ratings::new(&db).delete("Red", "BOCC4");
        assert!(matches!(result, Err(Error::InUse { .. })));

        Ok(())
    }
}
