//! Summary builder
//!
//! Derives reporting aggregates from an already-filtered sighting
//! collection without going back to the store.

use chrono::NaiveDate;

use crate::model::{Category, Location, Sighting, Species};

/// Report-ready aggregate over a set of sightings.
///
/// The derived values are computed from the input on demand, not
/// stored. An empty input has no date range: `date_range` returns
/// `None` rather than defaulting to "now".
#[derive(Debug, Clone)]
pub struct Summary {
    pub sightings: Vec<Sighting>,
}

impl Summary {
    pub fn new(sightings: Vec<Sighting>) -> Self {
        Self { sightings }
    }

    /// Min and max sighting date, or `None` for an empty set.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let from = self.sightings.iter().map(|s| s.date).min()?;
        let to = self.sightings.iter().map(|s| s.date).max()?;
        Some((from, to))
    }

    /// Distinct locations referenced by the sightings.
    pub fn locations(&self) -> Vec<Location> {
        let mut seen = Vec::new();
        for sighting in &self.sightings {
            if let Some(location) = &sighting.location {
                if !seen.iter().any(|l: &Location| l.id == location.id) {
                    seen.push(location.clone());
                }
            }
        }
        seen
    }

    /// Distinct species referenced by the sightings.
    pub fn species(&self) -> Vec<Species> {
        let mut seen = Vec::new();
        for sighting in &self.sightings {
            if let Some(species) = &sighting.species {
                if !seen.iter().any(|s: &Species| s.id == species.id) {
                    seen.push(species.clone());
                }
            }
        }
        seen
    }

    /// Distinct categories of the species referenced by the sightings.
    pub fn categories(&self) -> Vec<Category> {
        let mut seen = Vec::new();
        for sighting in &self.sightings {
            if let Some(category) = sighting.species.as_ref().and_then(|s| s.category.as_ref()) {
                if !seen.iter().any(|c: &Category| c.id == category.id) {
                    seen.push(category.clone());
                }
            }
        }
        seen
    }

    /// Total number of individuals across all sightings.
    pub fn total_individuals(&self) -> u64 {
        self.sightings.iter().map(|s| s.number as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Gender;

    fn sighting(id: i64, date: NaiveDate, species_id: i64, location_id: i64) -> Sighting {
        Sighting {
            id,
            location_id,
            species_id,
            date,
            number: 1,
            gender: Gender::Unknown,
            with_young: false,
            location: Some(Location {
                id: location_id,
                name: format!("Location {}", location_id),
                ..Default::default()
            }),
            species: Some(Species {
                id: species_id,
                name: format!("Species {}", species_id),
                category_id: 1,
                category: Some(Category {
                    id: 1,
                    name: "Birds".to_string(),
                }),
            }),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_empty_summary_has_no_range() {
        let summary = Summary::new(Vec::new());
        assert!(summary.date_range().is_none());
        assert!(summary.locations().is_empty());
        assert!(summary.species().is_empty());
        assert!(summary.categories().is_empty());
        assert_eq!(summary.total_individuals(), 0);
    }

    #[test]
    fn test_date_range_is_min_max() {
        let summary = Summary::new(vec![
            sighting(1, date(10), 1, 1),
            sighting(2, date(3), 1, 1),
            sighting(3, date(21), 2, 1),
        ]);
        assert_eq!(summary.date_range(), Some((date(3), date(21))));
    }

    #[test]
    fn test_distinct_related_entities() {
        let summary = Summary::new(vec![
            sighting(1, date(1), 1, 1),
            sighting(2, date(2), 1, 2),
            sighting(3, date(3), 2, 1),
        ]);

        assert_eq!(summary.species().len(), 2);
        assert_eq!(summary.locations().len(), 2);
        assert_eq!(summary.categories().len(), 1);
        // Cardinality never exceeds the sighting count
        assert!(summary.species().len() <= summary.sightings.len());
    }
}
