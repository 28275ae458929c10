//! Analysis modules.
//!
//! The aggregator holds the pure derived-metric functions; the dashboard
//! module composes them into the simple and extensive views.

pub mod aggregator;
pub mod dashboard;

pub use aggregator::*;
pub use dashboard::{build_dashboard, DashboardOptions};
