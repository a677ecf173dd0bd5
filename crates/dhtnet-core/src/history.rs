//! Historical query engine.
//!
//! Turns a caller-facing selector into a store scan, then normalizes,
//! filters and orders the result. The store index is over raw device
//! timestamps; everything the caller sees here is in canonical epoch
//! milliseconds.

use time::Date;
use tracing::debug;

use dhtnet_store::{HISTORY_QUERY_CEILING, HistoryWindow, SensorStore};
use dhtnet_types::AnnotatedReading;

use crate::error::{QueryError, Result};

/// Which slice of a sensor's history a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySelector {
    /// Canonical epoch-millisecond window, either side optional.
    Range {
        start_ms: Option<i64>,
        end_ms: Option<i64>,
        limit: u32,
    },
    /// Inclusive UTC calendar-day window.
    DateRange { start: Date, end: Date },
    /// The most recent `limit` entries.
    Latest { limit: u32 },
}

const DAY_MS: i64 = 86_400_000;

fn day_start_ms(date: Date) -> i64 {
    date.midnight().assume_utc().unix_timestamp() * 1000
}

/// Fetch and canonicalize a sensor's history.
///
/// Records are annotated with the normalizer's verdict. Records whose
/// timestamp is valid but falls outside the requested canonical window are
/// dropped (the raw index can match on the wrong encoding); records without
/// a trustworthy timestamp are kept and flagged rather than hidden. The
/// result is stably sorted ascending by canonical timestamp, with
/// non-canonical records first in store insertion order.
///
/// # Errors
///
/// - [`QueryError::InvalidArgument`] for a zero limit.
/// - [`QueryError::NotFound`] when the sensor has no data at all.
/// - [`QueryError::Store`] on store failures.
pub async fn get_history(
    store: &SensorStore,
    sensor_id: &str,
    selector: HistorySelector,
) -> Result<Vec<AnnotatedReading>> {
    let (window, canonical_bounds) = match selector {
        HistorySelector::Range {
            start_ms,
            end_ms,
            limit,
        } => {
            if limit == 0 {
                return Err(QueryError::InvalidArgument("limit must be positive".into()));
            }
            if let (Some(start), Some(end)) = (start_ms, end_ms)
                && start > end
            {
                return Ok(Vec::new());
            }
            (
                HistoryWindow {
                    start_ms,
                    end_ms,
                    limit,
                },
                (start_ms, end_ms),
            )
        }
        HistorySelector::DateRange { start, end } => {
            if start > end {
                return Ok(Vec::new());
            }
            let start_ms = day_start_ms(start);
            let end_ms = day_start_ms(end) + DAY_MS - 1;
            (
                HistoryWindow {
                    start_ms: Some(start_ms),
                    end_ms: Some(end_ms),
                    limit: HISTORY_QUERY_CEILING,
                },
                (Some(start_ms), Some(end_ms)),
            )
        }
        HistorySelector::Latest { limit } => {
            if limit == 0 {
                return Err(QueryError::InvalidArgument("limit must be positive".into()));
            }
            (HistoryWindow::latest(limit), (None, None))
        }
    };

    let entries = store.query_history(sensor_id, window).await?;
    if entries.is_empty() {
        if !store.sensor_exists(sensor_id).await? {
            return Err(QueryError::NotFound(sensor_id.to_string()));
        }
        return Ok(Vec::new());
    }

    let (start_ms, end_ms) = canonical_bounds;
    let mut readings: Vec<AnnotatedReading> = entries
        .into_iter()
        .map(|(key, reading)| AnnotatedReading::new(Some(key), reading))
        .filter(|annotated| match annotated.canonical_ms {
            Some(ms) if annotated.valid => {
                start_ms.is_none_or(|start| ms >= start) && end_ms.is_none_or(|end| ms <= end)
            }
            // No trustworthy timestamp: keep, flagged.
            _ => true,
        })
        .collect();

    readings.sort_by_key(|annotated| annotated.canonical_ms.unwrap_or(i64::MIN));

    debug!(sensor_id, count = readings.len(), "history query resolved");
    Ok(readings)
}
