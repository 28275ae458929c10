//! Input tables.

pub mod loader;

pub use loader::{load_season, DataError};
