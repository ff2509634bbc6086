use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::PresenceConfig;
use crate::error::StoreError;
use crate::models::{
    ActorDirectory, ActorId, HeartbeatLog, PresenceReport, ResourceId, ResourceLog, Timestamp,
};
use crate::state::SharedStore;
use crate::utils::logger::{log_heartbeat, log_store_write_failure};
use crate::utils::Clock;

use super::message::compose_presence_message_for;

/// Actors in `log` other than `excluding` seen at or after `threshold`,
/// in log iteration order.
pub fn active_editors_in(
    log: &ResourceLog,
    excluding: &str,
    threshold: Timestamp,
) -> Vec<ActorId> {
    log.iter()
        .filter(|(actor, seen)| actor.as_str() != excluding && **seen >= threshold)
        .map(|(actor, _)| actor.clone())
        .collect()
}

/// Resources whose most recent heartbeat by anyone but `excluding` is at
/// or after `threshold`. Resources only `excluding` has touched never count.
pub fn resources_with_other_editors_in(
    log: &HeartbeatLog,
    excluding: &str,
    threshold: Timestamp,
) -> BTreeSet<ResourceId> {
    log.iter()
        .filter(|(_, actors)| {
            actors
                .iter()
                .filter(|(actor, _)| actor.as_str() != excluding)
                .map(|(_, seen)| *seen)
                .max()
                .is_some_and(|last_seen| last_seen >= threshold)
        })
        .map(|(resource, _)| resource.clone())
        .collect()
}

/// Answers presence questions from heartbeat store snapshots.
#[derive(Clone)]
pub struct PresenceEngine {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    cooldown_window: Timestamp,
    resource_label: String,
}

impl PresenceEngine {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, config: &PresenceConfig) -> Self {
        Self {
            store,
            clock,
            cooldown_window: config.cooldown_window,
            resource_label: config.resource_label.clone(),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn threshold(&self, now: Timestamp) -> Timestamp {
        now.saturating_sub(self.cooldown_window)
    }

    /// Actors other than `excluding` that heartbeated `resource` within the
    /// cooldown window.
    pub async fn active_editors(
        &self,
        resource: &str,
        excluding: &str,
        now: Timestamp,
    ) -> Vec<ActorId> {
        let log = self.store.get_log(resource).await;
        active_editors_in(&log, excluding, self.threshold(now))
    }

    /// Resources that some actor other than `excluding` is editing.
    pub async fn resources_with_other_editors(
        &self,
        excluding: &str,
        now: Timestamp,
    ) -> BTreeSet<ResourceId> {
        let log = self.store.snapshot().await;
        resources_with_other_editors_in(&log, excluding, self.threshold(now))
    }

    /// Alert for `viewer` about the other editors of `resource`, with names
    /// resolved through `directory`. Actors the directory does not know are
    /// left out.
    pub async fn editing_alert(
        &self,
        resource: &str,
        viewer: &str,
        now: Timestamp,
        directory: &dyn ActorDirectory,
    ) -> Option<String> {
        let names: Vec<String> = self
            .active_editors(resource, viewer, now)
            .await
            .iter()
            .filter_map(|actor| directory.lookup(actor))
            .map(|actor| actor.display_name())
            .collect();
        compose_presence_message_for(&names, &self.resource_label)
    }

    /// Record a heartbeat stamped with the engine clock and report what the
    /// actor should see as being edited by others.
    pub async fn heartbeat(
        &self,
        resource: &str,
        actor: &str,
    ) -> Result<PresenceReport, StoreError> {
        let now = self.clock.now();
        log_heartbeat(actor, resource);

        if let Err(e) = self.store.record_heartbeat(resource, actor, now).await {
            log_store_write_failure(actor, resource, &e.to_string());
            return Err(e);
        }

        Ok(PresenceReport::new(
            self.resources_with_other_editors(actor, now).await,
        ))
    }

    /// Side-effect free counterpart of [`heartbeat`](Self::heartbeat).
    pub async fn query(&self, actor: &str) -> PresenceReport {
        let now = self.clock.now();
        PresenceReport::new(self.resources_with_other_editors(actor, now).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Actor, StaticDirectory};
    use crate::state::{HeartbeatStore, MemoryStore};
    use crate::utils::ManualClock;
    use proptest::prelude::*;

    const COOLDOWN: Timestamp = 20;

    fn engine_at(start: Timestamp) -> (PresenceEngine, Arc<ManualClock>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(86_400));
        let clock = Arc::new(ManualClock::new(start));
        let engine =
            PresenceEngine::new(store.clone(), clock.clone(), &PresenceConfig::default());
        (engine, clock, store)
    }

    #[tokio::test]
    async fn test_active_editors_excludes_requester() {
        let (engine, _, store) = engine_at(0);
        store.record_heartbeat("home", "ann", 100).await.unwrap();
        store.record_heartbeat("home", "bo", 100).await.unwrap();

        assert_eq!(
            engine.active_editors("home", "ann", 100).await,
            vec!["bo".to_string()]
        );
        assert_eq!(
            engine.active_editors("home", "bo", 100).await,
            vec!["ann".to_string()]
        );
        assert!(engine.active_editors("elsewhere", "ann", 100).await.is_empty());
    }

    #[tokio::test]
    async fn test_cooldown_boundary() {
        let (engine, _, store) = engine_at(0);
        store.record_heartbeat("home", "ann", 100).await.unwrap();

        assert_eq!(engine.active_editors("home", "bo", 100 + COOLDOWN).await.len(), 1);
        assert!(engine.active_editors("home", "bo", 100 + COOLDOWN + 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_resources_with_other_editors() {
        let (engine, _, store) = engine_at(0);
        store.record_heartbeat("home", "ann", 100).await.unwrap();
        store.record_heartbeat("blog", "bo", 100).await.unwrap();
        store.record_heartbeat("about", "bo", 50).await.unwrap();

        let for_ann = engine.resources_with_other_editors("ann", 110).await;
        assert_eq!(for_ann, BTreeSet::from(["blog".to_string()]));

        let for_cy = engine.resources_with_other_editors("cy", 110).await;
        assert_eq!(for_cy, BTreeSet::from(["blog".to_string(), "home".to_string()]));
    }

    #[tokio::test]
    async fn test_own_recent_heartbeat_does_not_mask_stale_others() {
        let (engine, _, store) = engine_at(0);
        store.record_heartbeat("home", "bo", 10).await.unwrap();
        store.record_heartbeat("home", "ann", 100).await.unwrap();

        assert!(engine.resources_with_other_editors("ann", 100).await.is_empty());
    }

    #[test]
    fn test_resource_edited_only_by_requester_is_not_reported() {
        let mut log = HeartbeatLog::new();
        log.record("home", "ann", 5);
        log.record("blog", "bo", 5);

        // now - cooldown is negative, so any recorded heartbeat is recent
        let threshold = 10 - COOLDOWN;
        let for_ann = resources_with_other_editors_in(&log, "ann", threshold);
        assert_eq!(for_ann, BTreeSet::from(["blog".to_string()]));

        let empty: HeartbeatLog = [("ghost".to_string(), ResourceLog::new())]
            .into_iter()
            .collect();
        assert!(resources_with_other_editors_in(&empty, "ann", threshold).is_empty());
    }

    #[tokio::test]
    async fn test_heartbeat_uses_clock_and_reports() {
        let (engine, clock, store) = engine_at(1_000);
        engine.heartbeat("home", "ann").await.unwrap();
        assert_eq!(store.get_log("home").await["ann"], 1_000);

        clock.advance(5);
        let report = engine.heartbeat("blog", "bo").await.unwrap();
        assert!(report.success);
        assert_eq!(
            report.resources_with_other_editors,
            BTreeSet::from(["home".to_string()])
        );

        clock.advance(COOLDOWN);
        assert!(engine.query("bo").await.resources_with_other_editors.is_empty());
        assert_eq!(
            engine.query("ann").await.resources_with_other_editors,
            BTreeSet::from(["blog".to_string()])
        );
    }

    #[tokio::test]
    async fn test_editing_alert_resolves_names() {
        let (engine, _, store) = engine_at(0);
        store.record_heartbeat("home", "ann", 100).await.unwrap();
        store.record_heartbeat("home", "bo", 100).await.unwrap();
        store.record_heartbeat("home", "ghost", 100).await.unwrap();
        store.record_heartbeat("home", "viewer", 100).await.unwrap();

        let directory = StaticDirectory::new([
            Actor::new("ann").with_name("Ann", "Lee"),
            Actor::new("bo"),
            Actor::new("viewer"),
        ]);
        let alert = engine.editing_alert("home", "viewer", 105, &directory).await;
        assert_eq!(
            alert.as_deref(),
            Some("Ann Lee and bo are currently editing this page")
        );

        assert_eq!(engine.editing_alert("home", "viewer", 500, &directory).await, None);
    }

    proptest! {
        #[test]
        fn prop_requester_never_listed(
            beats in proptest::collection::vec((0usize..4, 0i64..200), 0..40),
            excluding in 0usize..4,
            now in 0i64..250,
        ) {
            let actors = ["ann", "bo", "cy", "di"];
            let mut log = ResourceLog::new();
            for (actor, at) in &beats {
                log.insert(actors[*actor].to_string(), *at);
            }
            let editors = active_editors_in(&log, actors[excluding], now - COOLDOWN);
            prop_assert!(!editors.iter().any(|a| a == actors[excluding]));
            for editor in &editors {
                prop_assert!(log[editor] >= now - COOLDOWN);
            }
        }
    }
}
