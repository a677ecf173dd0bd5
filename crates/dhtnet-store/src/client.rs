//! The keyed-store seam and its HTTP implementation.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Inclusive bounds for a range query over the raw `timestamp` child index.
///
/// The index holds the device's unvalidated raw values, so these bounds are
/// expressed in whatever encoding the caller expects the index to contain;
/// canonical validation happens above this layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeBounds {
    pub start_at: Option<i64>,
    pub end_at: Option<i64>,
}

/// Read primitives of the external realtime keyed store.
///
/// Implementations are connection handles: constructed once at process
/// start, injected into [`SensorStore`](crate::SensorStore), and held for
/// the process lifetime. Timeouts and transport retries are the client's
/// concern; callers see a single [`Error`] per failed call.
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Fetch the JSON subtree at `path`. `Ok(None)` when nothing is stored.
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Range query over the collection at `path`, ordered by the raw
    /// `timestamp` child with inclusive bounds, keeping the last `limit`
    /// entries in index order.
    async fn query_by_timestamp(
        &self,
        path: &str,
        bounds: RangeBounds,
        limit: u32,
    ) -> Result<Option<Value>>;

    /// Last `limit` entries of the collection at `path` by key order
    /// (push-id keys sort chronologically, so this is insertion order).
    async fn query_last(&self, path: &str, limit: u32) -> Result<Option<Value>>;
}

/// HTTP client for a Firebase-style realtime database REST surface.
///
/// Every tree path maps to `<base>/<path>.json`; queries use the `orderBy` /
/// `startAt` / `endAt` / `limitToLast` parameters. The optional `auth`
/// database secret is appended to every request.
pub struct RtdbClient {
    http: reqwest::Client,
    base_url: String,
    auth: Option<String>,
}

impl RtdbClient {
    /// Create a client for the database rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, auth: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("{}/.json", self.base_url)
        } else {
            format!("{}/{}.json", self.base_url, path)
        }
    }

    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Result<Option<Value>> {
        let mut request = self.http.get(self.url(path));
        if let Some(auth) = &self.auth {
            request = request.query(&[("auth", auth.as_str())]);
        }
        if !params.is_empty() {
            request = request.query(params);
        }

        debug!(path, params = ?params, "store fetch");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Backend {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let value: Value = response.json().await?;
        Ok((!value.is_null()).then_some(value))
    }
}

#[async_trait]
impl KeyedStore for RtdbClient {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.fetch(path, &[]).await
    }

    async fn query_by_timestamp(
        &self,
        path: &str,
        bounds: RangeBounds,
        limit: u32,
    ) -> Result<Option<Value>> {
        // REST query parameter values are JSON-encoded, hence the quoted
        // child name.
        let mut params = vec![("orderBy", "\"timestamp\"".to_string())];
        if let Some(start) = bounds.start_at {
            params.push(("startAt", start.to_string()));
        }
        if let Some(end) = bounds.end_at {
            params.push(("endAt", end.to_string()));
        }
        params.push(("limitToLast", limit.to_string()));
        self.fetch(path, &params).await
    }

    async fn query_last(&self, path: &str, limit: u32) -> Result<Option<Value>> {
        let params = vec![
            ("orderBy", "\"$key\"".to_string()),
            ("limitToLast", limit.to_string()),
        ];
        self.fetch(path, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_and_trims() {
        let client = RtdbClient::new("https://db.example.com/", None).unwrap();
        assert_eq!(client.url("sensor1/current"), "https://db.example.com/sensor1/current.json");
        assert_eq!(client.url("/sensor1/history/"), "https://db.example.com/sensor1/history.json");
        assert_eq!(client.url(""), "https://db.example.com/.json");
    }

    #[test]
    fn range_bounds_default_is_unbounded() {
        let bounds = RangeBounds::default();
        assert_eq!(bounds.start_at, None);
        assert_eq!(bounds.end_at, None);
    }
}
