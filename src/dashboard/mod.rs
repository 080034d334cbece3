//! Dashboard module
//!
//! Provides the overview page for the current month (budget vs actual,
//! sinking funds and recent transactions) and the analytics page with charts.

mod aggregation;
mod cards;
mod charts;
mod handlers;
mod tables;

pub use aggregation::fund_progress;
pub use handlers::{get_analytics_page, get_dashboard_page};
