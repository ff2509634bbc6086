use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier of an editable resource, e.g. a page path.
pub type ResourceId = String;

/// Identifier of an editing actor, e.g. a username.
pub type ActorId = String;

/// Unix timestamp in seconds.
pub type Timestamp = i64;

/// Last heartbeat per actor for a single resource.
pub type ResourceLog = BTreeMap<ActorId, Timestamp>;

/// The persisted heartbeat log: resource -> actor -> last seen.
///
/// Serializes as a plain JSON object of objects so the document written by
/// the file and redis backends is `{"<resource>": {"<actor>": <secs>}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeartbeatLog {
    resources: BTreeMap<ResourceId, ResourceLog>,
}

impl HeartbeatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a persisted log document.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Upsert the heartbeat of `actor` on `resource`.
    ///
    /// Last write wins: an older `now` replaces a newer entry.
    pub fn record(&mut self, resource: &str, actor: &str, now: Timestamp) {
        self.resources
            .entry(resource.to_string())
            .or_default()
            .insert(actor.to_string(), now);
    }

    /// Drop every resource whose most recent heartbeat is older than
    /// `now - retention`. Returns the purged resource ids.
    pub fn purge_expired(&mut self, now: Timestamp, retention: Timestamp) -> Vec<ResourceId> {
        let threshold = now.saturating_sub(retention);
        let mut purged = Vec::new();

        self.resources.retain(|resource, actors| {
            let last_seen = actors.values().copied().max().unwrap_or(0);
            if last_seen < threshold {
                purged.push(resource.clone());
                return false;
            }
            true
        });

        purged
    }

    /// Record a heartbeat and run the retention purge, the full mutation
    /// every backend applies on write.
    pub fn apply_heartbeat(
        &mut self,
        resource: &str,
        actor: &str,
        now: Timestamp,
        retention: Timestamp,
    ) -> Vec<ResourceId> {
        self.record(resource, actor, now);
        self.purge_expired(now, retention)
    }

    pub fn resource(&self, resource: &str) -> Option<&ResourceLog> {
        self.resources.get(resource)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceId, &ResourceLog)> {
        self.resources.iter()
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.resources.contains_key(resource)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<(ResourceId, ResourceLog)> for HeartbeatLog {
    fn from_iter<T: IntoIterator<Item = (ResourceId, ResourceLog)>>(iter: T) -> Self {
        Self {
            resources: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Timestamp = 86_400;

    #[test]
    fn test_record_replaces_entry() {
        let mut log = HeartbeatLog::new();
        log.record("home", "ann", 100);
        log.record("home", "ann", 100);
        log.record("home", "ann", 130);

        let entries = log.resource("home").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["ann"], 130);
    }

    #[test]
    fn test_last_write_wins_out_of_order() {
        let mut log = HeartbeatLog::new();
        log.record("home", "ann", 200);
        log.record("home", "ann", 150);
        assert_eq!(log.resource("home").unwrap()["ann"], 150);
    }

    #[test]
    fn test_purge_boundary_is_inclusive() {
        let mut log = HeartbeatLog::new();
        log.record("old", "ann", 1_000);

        let mut kept = log.clone();
        kept.apply_heartbeat("other", "bo", 1_000 + DAY, DAY);
        assert!(kept.contains("old"));

        let mut purged = log.clone();
        let removed = purged.apply_heartbeat("other", "bo", 1_000 + DAY + 1, DAY);
        assert_eq!(removed, vec!["old".to_string()]);
        assert!(!purged.contains("old"));
        assert!(purged.contains("other"));
    }

    #[test]
    fn test_purge_uses_most_recent_actor() {
        let mut log = HeartbeatLog::new();
        log.record("home", "ann", 10);
        log.record("home", "bo", 5_000);

        log.purge_expired(10 + DAY + 100, DAY);
        assert!(log.contains("home"));
    }

    #[test]
    fn test_empty_resource_is_purged() {
        let mut log: HeartbeatLog = [("ghost".to_string(), ResourceLog::new())]
            .into_iter()
            .collect();
        log.purge_expired(DAY + 1, DAY);
        assert!(log.is_empty());
    }

    #[test]
    fn test_json_layout() {
        let mut log = HeartbeatLog::new();
        log.record("blog/hello", "ann", 42);
        assert_eq!(log.to_json().unwrap(), r#"{"blog/hello":{"ann":42}}"#);

        let parsed = HeartbeatLog::from_json(r#"{"blog/hello":{"ann":42}}"#).unwrap();
        assert_eq!(parsed, log);
    }

    #[test]
    fn test_blank_document_is_empty_log() {
        assert!(HeartbeatLog::from_json("").unwrap().is_empty());
        assert!(HeartbeatLog::from_json("not json").is_err());
    }
}
