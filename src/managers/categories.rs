//! Category manager

use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::model::{names_match, title_case, Category};

use super::paginate;

pub struct Categories<'a> {
    db: &'a Database,
}

impl<'a> Categories<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// First category matching the predicate. Not finding one is a
    /// normal outcome for lookup-style callers.
    pub fn get(&self, predicate: impl Fn(&Category) -> bool) -> Result<Option<Category>> {
        Ok(self.db.categories()?.into_iter().find(|c| predicate(c)))
    }

    /// Category with the given (normalized) name.
    pub fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.get(|c| names_match(&c.name, name))
    }

    pub fn list(
        &self,
        predicate: Option<&dyn Fn(&Category) -> bool>,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Category>> {
        let mut all = self.db.categories()?;
        if let Some(predicate) = predicate {
            all.retain(|c| predicate(c));
        }
        Ok(paginate(all, page, page_size))
    }

    /// Add a category, idempotently: a repeat add returns the stored
    /// entity unchanged.
    pub fn add(&self, name: &str) -> Result<Category> {
        let name = title_case(name);
        if let Some(existing) = self.get_by_name(&name)? {
            return Ok(existing);
        }

        let category = self.db.insert_category(&name)?;
        debug!(category = %category.name, id = category.id, "added category");
        Ok(category)
    }

    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<Category> {
        let new_name = title_case(new_name);
        if self.get_by_name(&new_name)?.is_some() {
            return Err(Error::already_exists("category", new_name));
        }

        let mut category = self
            .get_by_name(old_name)?
            .ok_or_else(|| Error::not_found("category", title_case(old_name)))?;

        category.name = new_name;
        self.db.update_category(&category)?;
        debug!(id = category.id, category = %category.name, "renamed category");
        Ok(category)
    }

    /// Delete a category. Fails while any species still references it.
    pub fn delete(&self, name: &str) -> Result<()> {
        let category = self
            .get_by_name(name)?
            .ok_or_else(|| Error::not_found("category", title_case(name)))?;

        let in_use = self
            .db
            .species()?
            .iter()
            .any(|s| s.category_id == category.id);
        if in_use {
            return Err(Error::in_use("category", category.name));
        }

        self.db.delete_category(category.id)?;
        debug!(id = category.id, "deleted category");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::SpeciesManager;

    #[test]
    fn test_add_title_cases_name() -> Result<()> {
        let db = Database::open_memory()?;
        let categories = Categories::new(&db);

        let category = categories.add("birds")?;
        assert_eq!(category.name, "Birds");

        let all = categories.list(None, 1, 0)?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Birds");

        Ok(())
    }

    #[test]
    fn test_add_is_idempotent() -> Result<()> {
        let db = Database::open_memory()?;
        let categories = Categories::new(&db);

        let first = categories.add("Birds")?;
        let second = categories.add("  birds ")?;
        assert_eq!(first.id, second.id);
        assert_eq!(categories.list(None, 1, 0)?.len(), 1);

        Ok(())
    }

    #[test]
    fn test_get_normalizes_lookup() -> Result<()> {
        let db = Database::open_memory()?;
        let categories = Categories::new(&db);

        categories.add("  birds ")?;
        let found = categories.get_by_name("BIRDS")?;
        assert!(found.is_some());
        assert_eq!(found.unwrap().name, "Birds");

        Ok(())
    }

    #[test]
    fn test_rename() -> Result<()> {
        let db = Database::open_memory()?;
        let categories = Categories::new(&db);

        categories.add("Brids")?;
        let renamed = categories.rename("brids", "birds")?;
        assert_eq!(renamed.name, "Birds");
        assert!(categories.get_by_name("Brids")?.is_none());

        Ok(())
    }

    #[test]
    fn test_rename_missing_is_not_found() -> Result<()> {
        let db = Database::open_memory()?;
        let categories = Categories::new(&db);

        let result = categories.rename("Mammals", "Beasts");
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[test]
    fn test_rename_conflict_leaves_both_unchanged() -> Result<()> {
        let db = Database::open_memory()?;
        let categories = Categories::new(&db);

        categories.add("Birds")?;
        categories.add("Mammals")?;

        let result = categories.rename("Mammals", "birds");
        assert!(matches!(result, Err(Error::AlreadyExists { .. })));

        assert!(categories.get_by_name("Birds")?.is_some());
        assert!(categories.get_by_name("Mammals")?.is_some());

        Ok(())
    }

    #[test]
    fn test_delete() -> Result<()> {
        let db = Database::open_memory()?;
        let categories = Categories::new(&db);

        categories.add("Birds")?;
        categories.delete("birds")?;
        assert!(categories.get_by_name("Birds")?.is_none());

        Ok(())
    }

    #[test]
    fn test_delete_in_use_is_blocked() -> Result<()> {
        let db = Database::open_memory()?;
        let categories = Categories::new(&db);
        let species = SpeciesManager::new(&db);

        categories.add("Birds")?;
        species.add("Robin", "Birds")?;

        let result = categories.delete("Birds");
        assert!(matches!(result, Err(Error::InUse { .. })));
        assert_eq!(categories.list(None, 1, 0)?.len(), 1);

        Ok(())
    }

    #[test]
    fn test_delete_missing_is_not_found() -> Result<()> {
        let db = Database::open_memory()?;
        let categories = Categories::new(&db);

        let result = categories.delete("Birds");
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }
}
