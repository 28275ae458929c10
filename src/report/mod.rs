//! Dashboard rendering.

pub mod generator;
pub mod palette;

pub use generator::*;
