//! Entity model
//!
//! The eight record kinds held by the data store, plus the name
//! normalization rule shared by every manager.
//!
//! # Key Properties
//! - **id**: SQLite rowid, 0 until the store assigns one
//! - **name**: always stored trimmed and title-cased
//! - related entities (`category`, `location`, ...) are populated eagerly
//!   by the store on load; they are `None` only on freshly built templates

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Normalize a name for comparison and storage: trim, then title-case
/// each whitespace-separated word. Words containing a digit are codes
/// like "BOCC4" and go fully uppercase instead.
pub fn title_case(name: &str) -> String {
    name.trim()
        .split_whitespace()
        .map(|word| {
            if word.chars().any(|c| c.is_ascii_digit()) {
                return word.to_uppercase();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive comparison of two already-trimmed names.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Hash a password for storage (hex-encoded SHA-256).
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Sighting gender observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
    Both,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Unknown => write!(f, "Unknown"),
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
            Gender::Both => write!(f, "Both"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unknown" | "" => Ok(Gender::Unknown),
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "both" => Ok(Gender::Both),
            _ => Err(format!("Unknown gender: {}", s)),
        }
    }
}

/// A species category, e.g. "Birds"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A place where sightings are recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A species, belonging to exactly one category at a time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub category: Option<Category>,
}

/// A recorded sighting of a species at a location on a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub id: i64,
    pub location_id: i64,
    pub species_id: i64,
    pub date: NaiveDate,
    pub number: u32,
    pub gender: Gender,
    pub with_young: bool,
    pub location: Option<Location>,
    pub species: Option<Species>,
}

/// A named conservation-status classification scheme, e.g. "BOCC4"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusScheme {
    pub id: i64,
    pub name: String,
}

/// A rating value scoped to one scheme, e.g. "Red"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRating {
    pub id: i64,
    pub name: String,
    pub scheme_id: i64,
    pub scheme: Option<StatusScheme>,
}

/// A time-bounded assignment of a rating to a species.
/// `end == None` means the rating is currently in effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesStatusRating {
    pub id: i64,
    pub species_id: i64,
    pub rating_id: i64,
    pub region: String,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub species: Option<Species>,
    pub rating: Option<StatusRating>,
}

/// A registered user of the tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub password_hash: String,
}

/// Everything needed to build a sighting plus its lookups in one call.
/// Used by the CSV importer: the sighting manager resolves or creates
/// the location and species before inserting the sighting itself.
#[derive(Debug, Clone)]
pub struct SightingTemplate {
    pub species: String,
    pub category: String,
    pub number: u32,
    pub gender: Gender,
    pub with_young: bool,
    pub date: NaiveDate,
    pub location: Location,
}

/// Template for a historical status-rating record.
#[derive(Debug, Clone)]
pub struct StatusRatingTemplate {
    pub species: String,
    pub category: String,
    pub scheme: String,
    pub rating: String,
    pub region: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}
