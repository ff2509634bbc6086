use async_trait::async_trait;
use parking_lot::Mutex;

use super::HeartbeatStore;
use crate::error::StoreError;
use crate::models::{HeartbeatLog, ResourceLog, Timestamp};
use crate::utils::logger::log_purged;

/// In-process heartbeat log guarded by a single mutex.
#[derive(Debug)]
pub struct MemoryStore {
    log: Mutex<HeartbeatLog>,
    retention_window: Timestamp,
}

impl MemoryStore {
    pub fn new(retention_window: Timestamp) -> Self {
        Self::with_log(HeartbeatLog::new(), retention_window)
    }

    pub fn with_log(log: HeartbeatLog, retention_window: Timestamp) -> Self {
        Self {
            log: Mutex::new(log),
            retention_window,
        }
    }
}

#[async_trait]
impl HeartbeatStore for MemoryStore {
    async fn record_heartbeat(
        &self,
        resource: &str,
        actor: &str,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let purged = self
            .log
            .lock()
            .apply_heartbeat(resource, actor, now, self.retention_window);
        log_purged(&purged);
        Ok(())
    }

    async fn get_log(&self, resource: &str) -> ResourceLog {
        self.log.lock().resource(resource).cloned().unwrap_or_default()
    }

    async fn snapshot(&self) -> HeartbeatLog {
        self.log.lock().clone()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
