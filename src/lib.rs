//! Exploratory analysis of Indian EV charging infrastructure.
//!
//! Loads charging-station, EV-sales and population CSVs, snaps their state
//! names onto a canonical list, aggregates chargers and sales per state,
//! and writes supply/demand and per-capita tables.
pub mod aggregate;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod types;
pub mod util;
