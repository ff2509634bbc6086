use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tracing::info;

use super::HeartbeatStore;
use crate::error::StoreError;
use crate::models::{HeartbeatLog, Timestamp};
use crate::utils::logger::log_store_degraded;

/// Upsert + purge + write executed atomically inside redis, so concurrent
/// server instances sharing one key never lose each other's heartbeats.
/// An undecodable document is replaced by an empty log.
const RECORD_HEARTBEAT_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
local log = {}
if raw then
  local ok, decoded = pcall(cjson.decode, raw)
  if ok and type(decoded) == 'table' then
    log = decoded
  end
end

local resource, actor = ARGV[1], ARGV[2]
local now, retention = tonumber(ARGV[3]), tonumber(ARGV[4])

if type(log[resource]) ~= 'table' then
  log[resource] = {}
end
log[resource][actor] = now

local purged = 0
for name, actors in pairs(log) do
  local last_seen = 0
  if type(actors) == 'table' then
    for _, seen in pairs(actors) do
      if type(seen) == 'number' and seen > last_seen then
        last_seen = seen
      end
    end
  end
  if last_seen < now - retention then
    log[name] = nil
    purged = purged + 1
  end
end

redis.call('SET', KEYS[1], cjson.encode(log))
return purged
"#;

/// Heartbeat log kept as one JSON document under a single redis key.
pub struct RedisStore {
    connection: ConnectionManager,
    key: String,
    retention_window: Timestamp,
    script: Script,
}

impl RedisStore {
    pub async fn connect(
        url: &str,
        key: &str,
        retention_window: Timestamp,
    ) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let connection = redis::aio::ConnectionManager::new(client).await?;

        info!("Connected heartbeat store to redis at {} (key {})", url, key);

        Ok(RedisStore {
            connection,
            key: key.to_string(),
            retention_window,
            script: Script::new(RECORD_HEARTBEAT_SCRIPT),
        })
    }
}

#[async_trait]
impl HeartbeatStore for RedisStore {
    async fn record_heartbeat(
        &self,
        resource: &str,
        actor: &str,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let purged: i64 = self
            .script
            .key(&self.key)
            .arg(resource)
            .arg(actor)
            .arg(now)
            .arg(self.retention_window)
            .invoke_async(&mut conn)
            .await?;
        if purged > 0 {
            tracing::debug!("Purged {} stale resource(s) from {}", purged, self.key);
        }
        Ok(())
    }

    async fn snapshot(&self) -> HeartbeatLog {
        let mut conn = self.connection.clone();
        let raw: Option<String> = match conn.get(&self.key).await {
            Ok(raw) => raw,
            Err(e) => {
                log_store_degraded("redis", &e.to_string());
                return HeartbeatLog::new();
            }
        };

        match raw {
            Some(raw) => HeartbeatLog::from_json(&raw).unwrap_or_else(|e| {
                log_store_degraded("redis", &e.to_string());
                HeartbeatLog::new()
            }),
            None => HeartbeatLog::new(),
        }
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
