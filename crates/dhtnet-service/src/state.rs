//! Shared application state.

use std::sync::Arc;

use dhtnet_store::{KeyedStore, SensorStore};

/// State shared by every request handler.
///
/// [`SensorStore`] is a cheap clone over an `Arc`'d client, so the state
/// needs no interior locking; the service is read-only over the store.
pub struct AppState {
    pub store: SensorStore,
}

impl AppState {
    pub fn new(client: Arc<dyn KeyedStore>) -> Arc<Self> {
        Arc::new(Self {
            store: SensorStore::new(client),
        })
    }
}
