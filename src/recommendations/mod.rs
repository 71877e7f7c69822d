//! Buyer-criteria matching and ranking.
//!
//! - [`engine`]: pure filter / score / rank over a catalog snapshot
//! - [`service`]: reads the snapshot from the store and records submissions

pub mod engine;
pub mod service;

pub use engine::{CATALOG_QUERY_LIMIT, SHORTLIST_SIZE, recommend};
pub use service::RecommendationService;
