//! In-memory store backend for tests.

use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::client::{KeyedStore, RangeBounds};
use crate::error::Result;

/// In-memory JSON tree implementing [`KeyedStore`].
///
/// Mirrors the realtime database's query semantics closely enough for
/// tests: range queries order by the numeric `timestamp` child, `last N`
/// queries order by key (push-id keys sort chronologically).
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: RwLock<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(json!({})),
        }
    }

    /// Insert a value at a slash-separated path, creating intermediate
    /// objects as needed. Test seeding only; the served core is read-only.
    pub fn put(&self, path: &str, value: Value) {
        let mut root = self.root.write().expect("store lock poisoned");
        let mut node = &mut *root;
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        for (i, segment) in segments.iter().enumerate() {
            let map = node
                .as_object_mut()
                .expect("intermediate path segment is not an object");
            if i == segments.len() - 1 {
                map.insert((*segment).to_string(), value);
                return;
            }
            node = map
                .entry((*segment).to_string())
                .or_insert_with(|| json!({}));
        }
    }

    fn lookup(&self, path: &str) -> Option<Value> {
        let root = self.root.read().expect("store lock poisoned");
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Some(root.clone());
        }
        let mut node = &*root;
        for segment in path.split('/') {
            node = node.as_object()?.get(segment)?;
        }
        Some(node.clone())
    }
}

#[async_trait]
impl KeyedStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        Ok(self.lookup(path))
    }

    async fn query_by_timestamp(
        &self,
        path: &str,
        bounds: RangeBounds,
        limit: u32,
    ) -> Result<Option<Value>> {
        let Some(Value::Object(collection)) = self.lookup(path) else {
            return Ok(None);
        };

        let mut matched: Vec<(String, Value, f64)> = collection
            .into_iter()
            .filter_map(|(key, value)| {
                let ts = value.get("timestamp")?.as_f64()?;
                Some((key, value, ts))
            })
            .filter(|(_, _, ts)| {
                bounds.start_at.is_none_or(|start| *ts >= start as f64)
                    && bounds.end_at.is_none_or(|end| *ts <= end as f64)
            })
            .collect();

        // Index order: timestamp value, then key.
        matched.sort_by(|a, b| a.2.total_cmp(&b.2).then_with(|| a.0.cmp(&b.0)));
        let skip = matched.len().saturating_sub(limit as usize);

        let result: Map<String, Value> = matched
            .into_iter()
            .skip(skip)
            .map(|(key, value, _)| (key, value))
            .collect();
        Ok((!result.is_empty()).then_some(Value::Object(result)))
    }

    async fn query_last(&self, path: &str, limit: u32) -> Result<Option<Value>> {
        let Some(Value::Object(collection)) = self.lookup(path) else {
            return Ok(None);
        };

        let mut entries: Vec<(String, Value)> = collection.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let skip = entries.len().saturating_sub(limit as usize);

        let result: Map<String, Value> = entries.into_iter().skip(skip).collect();
        Ok((!result.is_empty()).then_some(Value::Object(result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_and_get_nested_paths() {
        let store = MemoryStore::new();
        store.put("sensor1/current", json!({"temperature": 21.0}));

        let value = store.get("sensor1/current").await.unwrap().unwrap();
        assert_eq!(value["temperature"], 21.0);
        assert!(store.get("sensor1/statistics").await.unwrap().is_none());

        let root = store.get("").await.unwrap().unwrap();
        assert!(root["sensor1"]["current"].is_object());
    }

    #[tokio::test]
    async fn timestamp_query_filters_and_caps() {
        let store = MemoryStore::new();
        for (key, ts) in [("a", 100), ("b", 200), ("c", 300), ("d", 400)] {
            store.put(&format!("s/history/{key}"), json!({"timestamp": ts}));
        }

        let bounds = RangeBounds {
            start_at: Some(150),
            end_at: Some(400),
        };
        let result = store
            .query_by_timestamp("s/history", bounds, 2)
            .await
            .unwrap()
            .unwrap();
        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
        // Last 2 of [b, c, d] in index order.
        assert_eq!(keys, ["c", "d"]);
    }

    #[tokio::test]
    async fn entries_without_timestamp_are_excluded_from_range() {
        let store = MemoryStore::new();
        store.put("s/history/a", json!({"timestamp": 100}));
        store.put("s/history/junk", json!({"note": "no timestamp"}));

        let result = store
            .query_by_timestamp("s/history", RangeBounds::default(), 10)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn query_last_takes_tail_by_key() {
        let store = MemoryStore::new();
        for key in ["k1", "k2", "k3"] {
            store.put(&format!("s/history/{key}"), json!({"timestamp": 1}));
        }

        let result = store.query_last("s/history", 2).await.unwrap().unwrap();
        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["k2", "k3"]);
    }

    #[tokio::test]
    async fn missing_collection_is_none() {
        let store = MemoryStore::new();
        assert!(store.query_last("nope", 5).await.unwrap().is_none());
        assert!(
            store
                .query_by_timestamp("nope", RangeBounds::default(), 5)
                .await
                .unwrap()
                .is_none()
        );
    }
}
