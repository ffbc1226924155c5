//! Catalog filtering, sorting, and facet derivation.
//!
//! Everything here is a pure function of its inputs: no I/O, no shared state.
//! Safe to recompute from scratch on every filter change.

pub mod facets;
pub mod filter;
pub mod sort;

pub use facets::Facets;
pub use filter::{filter, FilterSpec, PriceRange, ProductMatcher};
pub use sort::{sort_products, SortKey};
