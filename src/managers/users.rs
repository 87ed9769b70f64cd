//! User manager
//!
//! User names are normalized the same way as entity names; passwords
//! are stored as SHA-256 hashes, never in the clear.

use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::model::{hash_password, names_match, title_case, User};

use super::paginate;

pub struct Users<'a> {
    db: &'a Database,
}

impl<'a> Users<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self, predicate: impl Fn(&User) -> bool) -> Result<Option<User>> {
        Ok(self.db.users()?.into_iter().find(|u| predicate(u)))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<User>> {
        self.get(|u| names_match(&u.name, name))
    }

    pub fn list(
        &self,
        predicate: Option<&dyn Fn(&User) -> bool>,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<User>> {
        let mut all = self.db.users()?;
        if let Some(predicate) = predicate {
            all.retain(|u| predicate(u));
        }
        Ok(paginate(all, page, page_size))
    }

    /// Add a user, idempotently by name. A repeat add returns the
    /// stored user without touching the existing password.
    pub fn add(&self, name: &str, password: &str) -> Result<User> {
        let name = title_case(name);
        if let Some(existing) = self.get_by_name(&name)? {
            return Ok(existing);
        }

        let user = self.db.insert_user(&name, &hash_password(password))?;
        debug!(user = %user.name, id = user.id, "added user");
        Ok(user)
    }

    pub fn set_password(&self, name: &str, password: &str) -> Result<User> {
        let mut user = self
            .get_by_name(name)?
            .ok_or_else(|| Error::not_found("user", title_case(name)))?;

        user.password_hash = hash_password(password);
        self.db.update_user(&user)?;
        debug!(id = user.id, "password changed");
        Ok(user)
    }

    /// Check a name/password pair against the stored hash.
    pub fn authenticate(&self, name: &str, password: &str) -> Result<bool> {
        Ok(self
            .get_by_name(name)?
            .is_some_and(|u| u.password_hash == hash_password(password)))
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let user = self
            .get_by_name(name)?
            .ok_or_else(|| Error::not_found("user", title_case(name)))?;

        self.db.delete_user(user.id)?;
        debug!(id = user.id, "deleted user");
        Ok(())
    }
}
