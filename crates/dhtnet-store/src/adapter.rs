//! Typed per-sensor read operations over a [`KeyedStore`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use dhtnet_types::{Device, Reading, Statistics};

use crate::client::{KeyedStore, RangeBounds};
use crate::error::{Error, Result};

/// Hard cap on entries fetched per history query, regardless of what the
/// caller asks for.
pub const HISTORY_QUERY_CEILING: u32 = 1000;

/// What slice of a sensor's history to fetch.
///
/// Bounds are canonical epoch milliseconds. The store's index holds raw
/// device timestamps in either seconds or milliseconds, so the adapter
/// widens the scan to cover both encodings; callers re-filter by canonical
/// timestamp after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub limit: u32,
}

impl HistoryWindow {
    /// The most recent `limit` entries, unbounded in time.
    #[must_use]
    pub fn latest(limit: u32) -> Self {
        Self {
            start_ms: None,
            end_ms: None,
            limit,
        }
    }
}

/// Typed read access to one realtime database of DHT sensors.
///
/// The tree layout is one subtree per sensor id, each with `current`,
/// `statistics` and `history` children, plus an optional top-level
/// `devices` tree of actuators. Payload decoding is strict for the
/// singleton nodes and tolerant for history entries, where one corrupt
/// record must not fail the whole query.
#[derive(Clone)]
pub struct SensorStore {
    client: Arc<dyn KeyedStore>,
}

impl SensorStore {
    pub fn new(client: Arc<dyn KeyedStore>) -> Self {
        Self { client }
    }

    /// Latest snapshot written by the device, if any.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or when the stored payload does not decode
    /// as a reading.
    pub async fn get_current(&self, sensor_id: &str) -> Result<Option<Reading>> {
        let path = format!("{sensor_id}/current");
        match self.client.get(&path).await? {
            None => Ok(None),
            Some(value) => {
                let reading: Reading = serde_json::from_value(value)
                    .map_err(|e| Error::malformed(&path, e.to_string()))?;
                Ok(Some(reading))
            }
        }
    }

    /// Firmware-maintained running statistics, if any.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or a payload that does not decode as
    /// statistics.
    pub async fn get_statistics(&self, sensor_id: &str) -> Result<Option<Statistics>> {
        let path = format!("{sensor_id}/statistics");
        match self.client.get(&path).await? {
            None => Ok(None),
            Some(value) => {
                let stats: Statistics = serde_json::from_value(value)
                    .map_err(|e| Error::malformed(&path, e.to_string()))?;
                Ok(Some(stats))
            }
        }
    }

    /// Fetch history entries inside `window`, returned as `(key, reading)`
    /// pairs in ascending key order.
    ///
    /// The index is over raw timestamps, so a bounded scan runs from
    /// `start_ms / 1000` (covers seconds-encoded entries) to `end_ms`
    /// (covers milliseconds-encoded ones). Entries that fail to decode are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Fails on transport errors only.
    pub async fn query_history(
        &self,
        sensor_id: &str,
        window: HistoryWindow,
    ) -> Result<Vec<(String, Reading)>> {
        let path = format!("{sensor_id}/history");
        let limit = window.limit.min(HISTORY_QUERY_CEILING);

        let raw = if window.start_ms.is_none() && window.end_ms.is_none() {
            self.client.query_last(&path, limit).await?
        } else {
            let bounds = RangeBounds {
                start_at: window.start_ms.map(|ms| ms / 1000),
                end_at: window.end_ms,
            };
            self.client.query_by_timestamp(&path, bounds, limit).await?
        };

        let Some(Value::Object(entries)) = raw else {
            return Ok(Vec::new());
        };

        let mut readings: Vec<(String, Reading)> = entries
            .into_iter()
            .filter_map(
                |(key, value)| match serde_json::from_value::<Reading>(value) {
                    Ok(reading) => Some((key, reading)),
                    Err(e) => {
                        warn!(sensor_id, key, error = %e, "skipping undecodable history entry");
                        None
                    }
                },
            )
            .collect();
        readings.sort_by(|a, b| a.0.cmp(&b.0));

        debug!(sensor_id, count = readings.len(), "history fetched");
        Ok(readings)
    }

    /// Whether any data at all exists for this sensor id.
    ///
    /// A sensor is known if it has a current snapshot, statistics, or at
    /// least one history entry. Malformed singleton payloads still count
    /// as existence.
    ///
    /// # Errors
    ///
    /// Fails on transport errors only.
    pub async fn sensor_exists(&self, sensor_id: &str) -> Result<bool> {
        if self
            .client
            .get(&format!("{sensor_id}/current"))
            .await?
            .is_some()
        {
            return Ok(true);
        }
        if self
            .client
            .get(&format!("{sensor_id}/statistics"))
            .await?
            .is_some()
        {
            return Ok(true);
        }
        let history = self
            .client
            .query_last(&format!("{sensor_id}/history"), 1)
            .await?;
        Ok(history.is_some())
    }

    /// Ids of every active sensor in the store, ascending.
    ///
    /// Reads the tree root and keeps keys whose subtree has a `current`
    /// child. A sensor that has only stale history exists (see
    /// [`sensor_exists`](Self::sensor_exists)) but is not listed; the
    /// `devices` tree is excluded by the same shape check.
    ///
    /// # Errors
    ///
    /// Fails on transport errors only.
    pub async fn list_sensor_ids(&self) -> Result<Vec<String>> {
        let Some(Value::Object(root)) = self.client.get("").await? else {
            return Ok(Vec::new());
        };

        let mut ids: Vec<String> = root
            .into_iter()
            .filter(|(_, value)| {
                value
                    .as_object()
                    .is_some_and(|subtree| subtree.contains_key("current"))
            })
            .map(|(key, _)| key)
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// All registered actuators, ascending by id. An absent `devices` tree
    /// is an empty fleet, not an error.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or a tree entry that does not decode as a
    /// device.
    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let Some(Value::Object(entries)) = self.client.get("devices").await? else {
            return Ok(Vec::new());
        };

        let mut devices = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let device: Device = serde_json::from_value(value)
                .map_err(|e| Error::malformed(&format!("devices/{key}"), e.to_string()))?;
            devices.push(device);
        }
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(devices)
    }
}
