use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use fs2::FileExt;
use tempfile::NamedTempFile;

use super::HeartbeatStore;
use crate::error::StoreError;
use crate::models::{HeartbeatLog, Timestamp};
use crate::utils::logger::{log_purged, log_store_degraded};

/// JSON document on disk, written wholesale on every heartbeat.
///
/// Mutual exclusion uses `flock` on a sidecar `<log>.lock` file: writers
/// hold it exclusively for the whole read-modify-write, readers hold it
/// shared. Each operation opens its own handle, so the lock serializes
/// threads of one process as well as separate processes. The document is
/// replaced by rename, so readers never observe a torn write.
#[derive(Debug, Clone)]
pub struct FileStore {
    inner: Arc<FileStoreInner>,
}

#[derive(Debug)]
struct FileStoreInner {
    path: PathBuf,
    lock_path: PathBuf,
    retention_window: Timestamp,
}

impl FileStore {
    /// Prepare a store at `path`, creating the parent directory if needed.
    /// The log file itself is created lazily by the first heartbeat.
    pub fn open(path: impl AsRef<Path>, retention_window: Timestamp) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);

        Ok(Self {
            inner: Arc::new(FileStoreInner {
                path,
                lock_path,
                retention_window,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }
}

impl FileStoreInner {
    fn open_lock_file(&self) -> Result<File, StoreError> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|source| StoreError::Lock {
                path: self.lock_path.clone(),
                source,
            })
    }

    /// Closing the handle drops the flock as well, so a failed unlock is
    /// only reported.
    fn release(&self, lock: &File) {
        if let Err(e) = lock.unlock() {
            log_store_degraded("file", &format!("{}: {}", self.lock_path.display(), e));
        }
    }

    /// Missing, unreadable and malformed documents all load as empty.
    fn load(&self) -> HeartbeatLog {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return HeartbeatLog::new(),
            Err(e) => {
                log_store_degraded("file", &e.to_string());
                return HeartbeatLog::new();
            }
        };

        HeartbeatLog::from_json(&raw).unwrap_or_else(|e| {
            log_store_degraded("file", &format!("{}: {}", self.path.display(), e));
            HeartbeatLog::new()
        })
    }

    fn persist(&self, log: &HeartbeatLog) -> Result<(), StoreError> {
        let encoded = log.to_json()?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(encoded.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    fn record_heartbeat(
        &self,
        resource: &str,
        actor: &str,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let lock = self.open_lock_file()?;
        lock.lock_exclusive().map_err(|source| StoreError::Lock {
            path: self.lock_path.clone(),
            source,
        })?;

        let mut log = self.load();
        let purged = log.apply_heartbeat(resource, actor, now, self.retention_window);
        let result = self.persist(&log);
        self.release(&lock);

        log_purged(&purged);
        result
    }

    fn snapshot(&self) -> HeartbeatLog {
        let lock = match self.open_lock_file() {
            Ok(lock) => lock,
            Err(e) => {
                log_store_degraded("file", &e.to_string());
                return HeartbeatLog::new();
            }
        };
        if let Err(e) = lock.lock_shared() {
            log_store_degraded("file", &e.to_string());
            return HeartbeatLog::new();
        }

        let log = self.load();
        self.release(&lock);
        log
    }
}

#[async_trait]
impl HeartbeatStore for FileStore {
    async fn record_heartbeat(
        &self,
        resource: &str,
        actor: &str,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let inner = self.inner.clone();
        let resource = resource.to_string();
        let actor = actor.to_string();
        tokio::task::spawn_blocking(move || inner.record_heartbeat(&resource, &actor, now))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn snapshot(&self) -> HeartbeatLog {
        let inner = self.inner.clone();
        match tokio::task::spawn_blocking(move || inner.snapshot()).await {
            Ok(log) => log,
            Err(e) => {
                log_store_degraded("file", &e.to_string());
                HeartbeatLog::new()
            }
        }
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
