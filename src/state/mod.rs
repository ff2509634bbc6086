//! Heartbeat stores.
//!
//! Every backend applies the same write: upsert the heartbeat, purge
//! resources past the retention window, persist the whole log. Writes are
//! serialized across the whole log; reads never fail and fall back to an
//! empty log when the backing data cannot be read.

pub mod file_store;
pub mod memory_store;
pub mod redis_state;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{PresenceConfig, StoreBackend};
use crate::error::StoreError;
use crate::models::{HeartbeatLog, ResourceLog, Timestamp};

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use redis_state::RedisStore;

pub type SharedStore = Arc<dyn HeartbeatStore>;

#[async_trait]
pub trait HeartbeatStore: Send + Sync {
    /// Upsert `log[resource][actor] = now`, purge expired resources and
    /// persist atomically with respect to other writers.
    async fn record_heartbeat(
        &self,
        resource: &str,
        actor: &str,
        now: Timestamp,
    ) -> Result<(), StoreError>;

    /// Current entries for `resource`, empty when unknown or unreadable.
    async fn get_log(&self, resource: &str) -> ResourceLog {
        self.snapshot()
            .await
            .resource(resource)
            .cloned()
            .unwrap_or_default()
    }

    /// The whole log, empty when unreadable.
    async fn snapshot(&self) -> HeartbeatLog;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Build the store selected by `config.backend`.
pub async fn open_store(config: &PresenceConfig) -> Result<SharedStore, StoreError> {
    let store: SharedStore = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new(config.retention_window)),
        StoreBackend::File => Arc::new(FileStore::open(
            &config.log_location,
            config.retention_window,
        )?),
        StoreBackend::Redis => Arc::new(
            RedisStore::connect(&config.redis_url(), &config.redis_key, config.retention_window)
                .await?,
        ),
    };
    Ok(store)
}
