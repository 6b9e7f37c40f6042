//! Data ingestion and storage
//!
//! Page fetching and extraction, row normalization and SQLite persistence.

pub mod database;
pub mod normalize;
pub mod scrapers;

pub use database::{Database, StatSink};
pub use normalize::{normalize_row, CANONICAL_COLUMNS};
