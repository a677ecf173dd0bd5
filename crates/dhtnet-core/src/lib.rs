//! Query engine, statistics presentation and dashboard aggregation for DHT
//! sensor networks.
//!
//! This crate is the service's brain: it sits between the raw store
//! ([`dhtnet_store`]) and the HTTP surface, and owns the semantics that
//! make device data trustworthy to display:
//!
//! - [`get_history`] resolves a [`HistorySelector`] into normalized,
//!   canonically ordered readings, keeping bad-clock records visible but
//!   flagged.
//! - [`format_statistics`] renders firmware aggregates, keeping the
//!   wall-clock `last_update` and the uptime `session_duration` on their
//!   separate clocks.
//! - [`sensor_dashboard`] and [`overview`] fan out store reads
//!   concurrently and degrade partially instead of failing whole pages.

mod dashboard;
mod error;
mod history;
mod stats;

pub use dashboard::{SensorDashboard, overview, sensor_dashboard};
pub use error::{QueryError, Result};
pub use history::{HistorySelector, get_history};
pub use stats::{FormattedStatistics, format_duration, format_statistics};
