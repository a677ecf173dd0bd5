//! HTTP REST surface for DHT sensor networks.
//!
//! Thin axum layer over [`dhtnet_core`]: route handlers translate query
//! parameters into selectors, run the core operations against the shared
//! [`SensorStore`](dhtnet_store::SensorStore), and wrap every result in the
//! service's response envelope.

pub mod api;
pub mod config;
pub mod state;

pub use api::{ApiResponse, AppError};
pub use config::{Config, ConfigError};
pub use state::AppState;
