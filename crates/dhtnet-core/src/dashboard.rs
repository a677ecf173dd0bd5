//! Dashboard aggregation.
//!
//! Fan-out reads with partial-availability semantics: a dashboard is only
//! an error when the sensor is entirely unknown. Any individual sub-fetch
//! failure degrades that field to null and is logged, so one flaky store
//! path cannot blank the whole page.

use std::collections::BTreeMap;

use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use dhtnet_store::{HistoryWindow, SensorStore};
use dhtnet_types::AnnotatedReading;

use crate::error::{QueryError, Result};
use crate::stats::{FormattedStatistics, format_statistics};

/// How many recent readings a dashboard carries.
const DASHBOARD_HISTORY_LIMIT: u32 = 24;

/// Everything one sensor's dashboard shows.
///
/// Each field is independently nullable; `None` means "unavailable right
/// now", not "the sensor does not exist".
#[derive(Debug, Clone, Serialize)]
pub struct SensorDashboard {
    pub current: Option<AnnotatedReading>,
    pub statistics: Option<FormattedStatistics>,
    pub history: Option<Vec<AnnotatedReading>>,
}

/// Assemble one sensor's dashboard with concurrent sub-fetches.
///
/// # Errors
///
/// [`QueryError::NotFound`] when no field yields any data, meaning the
/// sensor id is unknown. Sub-fetch failures never error; they null the
/// field.
pub async fn sensor_dashboard(store: &SensorStore, sensor_id: &str) -> Result<SensorDashboard> {
    let (current, statistics, history) = tokio::join!(
        store.get_current(sensor_id),
        store.get_statistics(sensor_id),
        store.query_history(sensor_id, HistoryWindow::latest(DASHBOARD_HISTORY_LIMIT)),
    );

    let mut degraded = false;

    let current = match current {
        Ok(reading) => reading.map(|r| AnnotatedReading::new(None, r)),
        Err(e) => {
            warn!(sensor_id, error = %e, "dashboard current fetch degraded");
            degraded = true;
            None
        }
    };
    let statistics = match statistics {
        Ok(stats) => stats.map(format_statistics),
        Err(e) => {
            warn!(sensor_id, error = %e, "dashboard statistics fetch degraded");
            degraded = true;
            None
        }
    };
    let history = match history {
        Ok(entries) => {
            let mut readings: Vec<AnnotatedReading> = entries
                .into_iter()
                .map(|(key, reading)| AnnotatedReading::new(Some(key), reading))
                .collect();
            readings.sort_by_key(|r| r.canonical_ms.unwrap_or(i64::MIN));
            Some(readings)
        }
        Err(e) => {
            warn!(sensor_id, error = %e, "dashboard history fetch degraded");
            degraded = true;
            None
        }
    };

    // Empty answers from a healthy store mean the sensor does not exist;
    // empty answers caused by fetch failures are an outage, not absence.
    let no_data = current.is_none()
        && statistics.is_none()
        && history.as_ref().is_none_or(|h| h.is_empty());
    if no_data && !degraded {
        return Err(QueryError::NotFound(sensor_id.to_string()));
    }

    Ok(SensorDashboard {
        current,
        statistics,
        history,
    })
}

/// Current snapshot of every listed sensor, fetched concurrently.
///
/// Per-sensor failures are logged and omitted from the map rather than
/// failing the overview.
///
/// # Errors
///
/// Fails only when the sensor listing itself cannot be fetched.
pub async fn overview(store: &SensorStore) -> Result<BTreeMap<String, AnnotatedReading>> {
    let ids = store.list_sensor_ids().await?;

    let fetches = ids.iter().map(|id| async move {
        let result = store.get_current(id).await;
        (id.clone(), result)
    });
    let results = join_all(fetches).await;

    let mut sensors = BTreeMap::new();
    for (id, result) in results {
        match result {
            Ok(Some(reading)) => {
                sensors.insert(id, AnnotatedReading::new(None, reading));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(sensor_id = %id, error = %e, "overview fetch skipped sensor");
            }
        }
    }
    Ok(sensors)
}
