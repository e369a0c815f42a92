//! Multi-criteria quote search.
//!
//! # Responsibility
//! - Expose union/intersection composition of per-criterion quote sets.
//! - Keep search result shaping inside the core.

pub mod quote_search;
