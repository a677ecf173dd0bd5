//! Keyed realtime-store access for DHT sensor data.
//!
//! The external realtime database is treated as an opaque keyed JSON tree
//! with three read primitives (subtree get, range query over the raw
//! `timestamp` child index, last-N by insertion). [`KeyedStore`] is the seam:
//! [`RtdbClient`] talks to a Firebase-style REST surface over HTTP, and
//! [`MemoryStore`] backs tests.
//!
//! [`SensorStore`] is the typed adapter on top: it decodes payloads strictly
//! at this boundary (malformed data is an [`Error`], never a silently
//! propagated null) and exposes the per-sensor read operations the query
//! engine and dashboard aggregator consume.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dhtnet_store::{RtdbClient, SensorStore, HistoryWindow};
//!
//! # async fn run() -> dhtnet_store::Result<()> {
//! let client = RtdbClient::new("https://example-db.firebaseio.com", None)?;
//! let store = SensorStore::new(Arc::new(client));
//!
//! let current = store.get_current("sensor1").await?;
//! let recent = store
//!     .query_history("sensor1", HistoryWindow::latest(24))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod adapter;
mod client;
mod error;
mod memory;

pub use adapter::{HISTORY_QUERY_CEILING, HistoryWindow, SensorStore};
pub use client::{KeyedStore, RangeBounds, RtdbClient};
pub use error::{Error, Result};
pub use memory::MemoryStore;
