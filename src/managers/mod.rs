//! Entity managers
//!
//! One manager per entity kind. Managers own name normalization and the
//! referential rules (uniqueness, existence, in-use guards); the data
//! store below them is deliberately rule-free.
//!
//! Queries take closure predicates over the loaded entities, including
//! joined fields, so callers can filter on anything without the store
//! growing a query language.

pub mod categories;
pub mod locations;
pub mod schemes;
pub mod sightings;
pub mod species;
pub mod species_ratings;
pub mod users;

pub use categories::Categories;
pub use locations::Locations;
pub use schemes::{Ratings, Schemes};
pub use sightings::Sightings;
pub use species::SpeciesManager;
pub use species_ratings::SpeciesRatings;
pub use users::Users;

/// Subset a match set by 1-based page number. A `page_size` of 0 means
/// no pagination (everything on page 1).
pub(crate) fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Vec<T> {
    if page_size == 0 {
        return items;
    }
    let start = page.saturating_sub(1) * page_size;
    items.into_iter().skip(start).take(page_size).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_pages() {
        let items: Vec<u32> = (1..=10).collect();
        assert_eq!(paginate(items.clone(), 1, 4), vec![1, 2, 3, 4]);
        assert_eq!(paginate(items.clone(), 2, 4), vec![5, 6, 7, 8]);
        assert_eq!(paginate(items.clone(), 3, 4), vec![9, 10]);
        assert_eq!(paginate(items.clone(), 4, 4), Vec::<u32>::new());
    }

    #[test]
    fn test_paginate_zero_size_returns_all() {
        let items: Vec<u32> = (1..=10).collect();
        assert_eq!(paginate(items.clone(), 1, 0).len(), 10);
        assert_eq!(paginate(items, 7, 0).len(), 10);
    }
}
