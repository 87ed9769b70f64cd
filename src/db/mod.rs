//! Data store - SQLite backend
//!
//! A thin persistence wrapper: per-entity insert/update/delete plus
//! load-with-relations. No business rules live here; normalization,
//! uniqueness and in-use checks belong to the managers.
//!
//! # Key Points
//! - Related entities (species→category, sighting→location/species) are
//!   loaded eagerly via JOINs, so callers never see dangling ids.
//! - Dates are stored as ISO-8601 text and parsed back on load.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OpenFlags, Row};

use crate::error::Result;
use crate::model::{
    Category, Location, Sighting, Species, SpeciesStatusRating, StatusRating, StatusScheme, User,
};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Database storage
pub struct Database {
    conn: Connection,
    path: Option<std::path::PathBuf>,
}

impl Database {
    /// Open or create a database
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;

        let db = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.init_schema()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn, path: None };
        db.init_schema()?;
        Ok(db)
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` inside a transaction: committed when it returns Ok,
    /// rolled back when it returns Err. Callers compose multi-statement
    /// mutations (supersede, cascade delete) through this so a failure
    /// part-way leaves the store unchanged.
    pub fn transaction<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        match f() {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(error) => {
                tx.rollback()?;
                Err(error)
            }
        }
    }

    /// Initialize database schema. The DDL is idempotent so this can be
    /// re-run against an existing database to pick up new tables.
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                address TEXT,
                city TEXT,
                county TEXT,
                postcode TEXT,
                country TEXT,
                latitude REAL,
                longitude REAL
            );

            CREATE TABLE IF NOT EXISTS species (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                category_id INTEGER NOT NULL REFERENCES categories(id)
            );

            CREATE INDEX IF NOT EXISTS idx_species_category ON species(category_id);

            CREATE TABLE IF NOT EXISTS sightings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location_id INTEGER NOT NULL REFERENCES locations(id),
                species_id INTEGER NOT NULL REFERENCES species(id),
                date TEXT NOT NULL,
                number INTEGER NOT NULL DEFAULT 0,
                gender TEXT NOT NULL DEFAULT 'unknown',
                with_young INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_sightings_date ON sightings(date);
            CREATE INDEX IF NOT EXISTS idx_sightings_species ON sightings(species_id);
            CREATE INDEX IF NOT EXISTS idx_sightings_location ON sightings(location_id);

            CREATE TABLE IF NOT EXISTS status_schemes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS status_ratings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                scheme_id INTEGER NOT NULL REFERENCES status_schemes(id)
            );

            CREATE INDEX IF NOT EXISTS idx_ratings_scheme ON status_ratings(scheme_id);

            CREATE TABLE IF NOT EXISTS species_status_ratings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                species_id INTEGER NOT NULL REFERENCES species(id),
                rating_id INTEGER NOT NULL REFERENCES status_ratings(id),
                region TEXT NOT NULL DEFAULT '',
                start TEXT NOT NULL,
                end TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_ssr_species ON species_status_ratings(species_id);

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    // --- categories -------------------------------------------------------

    pub fn insert_category(&self, name: &str) -> Result<Category> {
        self.conn
            .execute("INSERT INTO categories (name) VALUES (?1)", params![name])?;
        Ok(Category {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub fn update_category(&self, category: &Category) -> Result<()> {
        self.conn.execute(
            "UPDATE categories SET name = ?2 WHERE id = ?1",
            params![category.id, category.name],
        )?;
        Ok(())
    }

    pub fn delete_category(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // --- locations --------------------------------------------------------

    pub fn insert_location(&self, location: &Location) -> Result<Location> {
        self.conn.execute(
            r#"
            INSERT INTO locations (name, address, city, county, postcode, country, latitude, longitude)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                location.name,
                location.address,
                location.city,
                location.county,
                location.postcode,
                location.country,
                location.latitude,
                location.longitude,
            ],
        )?;
        let mut stored = location.clone();
        stored.id = self.conn.last_insert_rowid();
        Ok(stored)
    }

    pub fn update_location(&self, location: &Location) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE locations
            SET name = ?2, address = ?3, city = ?4, county = ?5,
                postcode = ?6, country = ?7, latitude = ?8, longitude = ?9
            WHERE id = ?1
            "#,
            params![
                location.id,
                location.name,
                location.address,
                location.city,
                location.county,
                location.postcode,
                location.country,
                location.latitude,
                location.longitude,
            ],
        )?;
        Ok(())
    }

    pub fn delete_location(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM locations WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn locations(&self) -> Result<Vec<Location>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, address, city, county, postcode, country, latitude, longitude
             FROM locations ORDER BY name",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_location)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_location(row: &Row) -> rusqlite::Result<Location> {
        Ok(Location {
            id: row.get(0)?,
            name: row.get(1)?,
            address: row.get(2)?,
            city: row.get(3)?,
            county: row.get(4)?,
            postcode: row.get(5)?,
            country: row.get(6)?,
            latitude: row.get(7)?,
            longitude: row.get(8)?,
        })
    }

    // --- species ----------------------------------------------------------

    pub fn insert_species(&self, name: &str, category_id: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO species (name, category_id) VALUES (?1, ?2)",
            params![name, category_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_species(&self, species: &Species) -> Result<()> {
        self.conn.execute(
            "UPDATE species SET name = ?2, category_id = ?3 WHERE id = ?1",
            params![species.id, species.name, species.category_id],
        )?;
        Ok(())
    }

    pub fn delete_species(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM species WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// All species with their category loaded.
    pub fn species(&self) -> Result<Vec<Species>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.name, s.category_id, c.name
            FROM species s
            JOIN categories c ON c.id = s.category_id
            ORDER BY s.name
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Species {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category_id: row.get(2)?,
                    category: Some(Category {
                        id: row.get(2)?,
                        name: row.get(3)?,
                    }),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // --- sightings --------------------------------------------------------

    pub fn insert_sighting(&self, sighting: &Sighting) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO sightings (location_id, species_id, date, number, gender, with_young)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                sighting.location_id,
                sighting.species_id,
                sighting.date.format(DATE_FMT).to_string(),
                sighting.number,
                sighting.gender.to_string().to_lowercase(),
                sighting.with_young as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_sighting(&self, sighting: &Sighting) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE sightings
            SET location_id = ?2, species_id = ?3, date = ?4,
                number = ?5, gender = ?6, with_young = ?7
            WHERE id = ?1
            "#,
            params![
                sighting.id,
                sighting.location_id,
                sighting.species_id,
                sighting.date.format(DATE_FMT).to_string(),
                sighting.number,
                sighting.gender.to_string().to_lowercase(),
                sighting.with_young as i64,
            ],
        )?;
        Ok(())
    }

    pub fn delete_sighting(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM sightings WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// All sightings with location, species and species category loaded.
    pub fn sightings(&self) -> Result<Vec<Sighting>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT si.id, si.location_id, si.species_id, si.date,
                   si.number, si.gender, si.with_young,
                   l.name, l.address, l.city, l.county, l.postcode, l.country,
                   l.latitude, l.longitude,
                   sp.name, sp.category_id, c.name
            FROM sightings si
            JOIN locations l ON l.id = si.location_id
            JOIN species sp ON sp.id = si.species_id
            JOIN categories c ON c.id = sp.category_id
            ORDER BY si.date, si.id
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                let date_str: String = row.get(3)?;
                let gender_str: String = row.get(5)?;
                Ok(Sighting {
                    id: row.get(0)?,
                    location_id: row.get(1)?,
                    species_id: row.get(2)?,
                    date: NaiveDate::parse_from_str(&date_str, DATE_FMT)
                        .unwrap_or_default(),
                    number: row.get(4)?,
                    gender: gender_str.parse().unwrap_or_default(),
                    with_young: row.get::<_, i64>(6)? != 0,
                    location: Some(Location {
                        id: row.get(1)?,
                        name: row.get(7)?,
                        address: row.get(8)?,
                        city: row.get(9)?,
                        county: row.get(10)?,
                        postcode: row.get(11)?,
                        country: row.get(12)?,
                        latitude: row.get(13)?,
                        longitude: row.get(14)?,
                    }),
                    species: Some(Species {
                        id: row.get(2)?,
                        name: row.get(15)?,
                        category_id: row.get(16)?,
                        category: Some(Category {
                            id: row.get(16)?,
                            name: row.get(17)?,
                        }),
                    }),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // --- status schemes and ratings --------------------------------------

    pub fn insert_scheme(&self, name: &str) -> Result<StatusScheme> {
        self.conn.execute(
            "INSERT INTO status_schemes (name) VALUES (?1)",
            params![name],
        )?;
        Ok(StatusScheme {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub fn update_scheme(&self, scheme: &StatusScheme) -> Result<()> {
        self.conn.execute(
            "UPDATE status_schemes SET name = ?2 WHERE id = ?1",
            params![scheme.id, scheme.name],
        )?;
        Ok(())
    }

    pub fn delete_scheme(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM status_schemes WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn schemes(&self) -> Result<Vec<StatusScheme>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM status_schemes ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StatusScheme {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn insert_rating(&self, name: &str, scheme_id: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO status_ratings (name, scheme_id) VALUES (?1, ?2)",
            params![name, scheme_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_rating(&self, rating: &StatusRating) -> Result<()> {
        self.conn.execute(
            "UPDATE status_ratings SET name = ?2, scheme_id = ?3 WHERE id = ?1",
            params![rating.id, rating.name, rating.scheme_id],
        )?;
        Ok(())
    }

    pub fn delete_rating(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM status_ratings WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// All ratings with their scheme loaded.
    pub fn ratings(&self) -> Result<Vec<StatusRating>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT r.id, r.name, r.scheme_id, s.name
            FROM status_ratings r
            JOIN status_schemes s ON s.id = r.scheme_id
            ORDER BY s.name, r.name
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StatusRating {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    scheme_id: row.get(2)?,
                    scheme: Some(StatusScheme {
                        id: row.get(2)?,
                        name: row.get(3)?,
                    }),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // --- species status ratings ------------------------------------------

    pub fn insert_species_rating(&self, rating: &SpeciesStatusRating) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO species_status_ratings (species_id, rating_id, region, start, end)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                rating.species_id,
                rating.rating_id,
                rating.region,
                rating.start.format(DATETIME_FMT).to_string(),
                rating.end.map(|e| e.format(DATETIME_FMT).to_string()),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_species_rating(&self, rating: &SpeciesStatusRating) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE species_status_ratings
            SET species_id = ?2, rating_id = ?3, region = ?4, start = ?5, end = ?6
            WHERE id = ?1
            "#,
            params![
                rating.id,
                rating.species_id,
                rating.rating_id,
                rating.region,
                rating.start.format(DATETIME_FMT).to_string(),
                rating.end.map(|e| e.format(DATETIME_FMT).to_string()),
            ],
        )?;
        Ok(())
    }

    pub fn delete_species_rating(&self, id: i64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM species_status_ratings WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    /// All species status ratings with species (incl. category) and
    /// rating (incl. scheme) loaded.
    pub fn species_ratings(&self) -> Result<Vec<SpeciesStatusRating>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT ssr.id, ssr.species_id, ssr.rating_id, ssr.region, ssr.start, ssr.end,
                   sp.name, sp.category_id, c.name,
                   r.name, r.scheme_id, sc.name
            FROM species_status_ratings ssr
            JOIN species sp ON sp.id = ssr.species_id
            JOIN categories c ON c.id = sp.category_id
            JOIN status_ratings r ON r.id = ssr.rating_id
            JOIN status_schemes sc ON sc.id = r.scheme_id
            ORDER BY ssr.start, ssr.id
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                let start_str: String = row.get(4)?;
                let end_str: Option<String> = row.get(5)?;
                Ok(SpeciesStatusRating {
                    id: row.get(0)?,
                    species_id: row.get(1)?,
                    rating_id: row.get(2)?,
                    region: row.get(3)?,
                    start: NaiveDateTime::parse_from_str(&start_str, DATETIME_FMT)
                        .unwrap_or_default(),
                    end: end_str
                        .and_then(|s| NaiveDateTime::parse_from_str(&s, DATETIME_FMT).ok()),
                    species: Some(Species {
                        id: row.get(1)?,
                        name: row.get(6)?,
                        category_id: row.get(7)?,
                        category: Some(Category {
                            id: row.get(7)?,
                            name: row.get(8)?,
                        }),
                    }),
                    rating: Some(StatusRating {
                        id: row.get(2)?,
                        name: row.get(9)?,
                        scheme_id: row.get(10)?,
                        scheme: Some(StatusScheme {
                            id: row.get(10)?,
                            name: row.get(11)?,
                        }),
                    }),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // --- users ------------------------------------------------------------

    pub fn insert_user(&self, name: &str, password_hash: &str) -> Result<User> {
        self.conn.execute(
            "INSERT INTO users (name, password_hash) VALUES (?1, ?2)",
            params![name, password_hash],
        )?;
        Ok(User {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    pub fn update_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET name = ?2, password_hash = ?3 WHERE id = ?1",
            params![user.id, user.name, user.password_hash],
        )?;
        Ok(())
    }

    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, password_hash FROM users ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
