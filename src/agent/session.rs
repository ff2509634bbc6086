use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PresenceConfig;
use crate::error::TransportError;
use crate::models::{ActorId, PresenceReport, ResourceId};
use crate::utils::logger::log_transport_failure;

use super::transport::PresenceTransport;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PresenceNotification {
    /// Someone else started editing the resource.
    Entered(ResourceId),
    /// Nobody else is editing the resource any more.
    Exited(ResourceId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Editing(ResourceId),
}

/// Resources the client currently believes others are editing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownResources {
    resources: BTreeSet<ResourceId>,
}

impl KnownResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the known set with `fresh`, returning an `Entered` for every
    /// newly reported resource followed by an `Exited` for every resource no
    /// longer reported.
    pub fn reconcile(&mut self, fresh: BTreeSet<ResourceId>) -> Vec<PresenceNotification> {
        let entered = fresh
            .difference(&self.resources)
            .cloned()
            .map(PresenceNotification::Entered);
        let exited = self
            .resources
            .difference(&fresh)
            .cloned()
            .map(PresenceNotification::Exited);
        let notifications = entered.chain(exited).collect();

        self.resources = fresh;
        notifications
    }

    pub fn clear(&mut self) {
        self.resources.clear();
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.resources.contains(resource)
    }

    pub fn resources(&self) -> &BTreeSet<ResourceId> {
        &self.resources
    }
}

#[derive(Debug, Default)]
struct SessionState {
    current_resource: Option<ResourceId>,
    known: KnownResources,
    // bumped on every transition; ticks from an older epoch are discarded
    epoch: u64,
}

struct AgentInner {
    session_id: Uuid,
    actor: ActorId,
    transport: Arc<dyn PresenceTransport>,
    request_timeout: Duration,
    state: Mutex<SessionState>,
    notifications: UnboundedSender<PresenceNotification>,
}

impl AgentInner {
    /// Reconcile `fresh` unless the session moved on since `epoch`.
    fn apply(&self, epoch: Option<u64>, fresh: BTreeSet<ResourceId>) -> Vec<PresenceNotification> {
        let mut state = self.state.lock();
        if epoch.is_some_and(|epoch| epoch != state.epoch) {
            debug!("Session {} dropped stale presence report", self.session_id);
            return Vec::new();
        }

        let notifications = state.known.reconcile(fresh);
        for notification in &notifications {
            // receiver may be gone; the known set is still kept current
            let _ = self.notifications.send(notification.clone());
        }
        notifications
    }

    async fn call<F>(&self, action: &str, request: F) -> Option<PresenceReport>
    where
        F: std::future::Future<Output = Result<PresenceReport, TransportError>>,
    {
        let outcome = match time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.request_timeout)),
        };
        match outcome {
            Ok(report) => Some(report),
            Err(e) => {
                log_transport_failure(&self.session_id.to_string(), action, &e.to_string());
                None
            }
        }
    }

    async fn beat(&self, epoch: u64, resource: &str) {
        let request = self.transport.heartbeat(resource, &self.actor);
        if let Some(report) = self.call("heartbeat", request).await {
            self.apply(Some(epoch), report.resources_with_other_editors);
        }
    }
}

/// Client side of presence tracking for one editing session.
///
/// While editing, a background task heartbeats the current resource every
/// `heartbeat_interval` and turns each report into [`PresenceNotification`]s
/// on the channel returned by [`PresenceAgent::new`]. The task awaits every
/// heartbeat before waiting for the next tick and skips ticks missed in the
/// meantime, so heartbeats never overlap. A failed or timed out heartbeat
/// changes nothing; the next tick retries.
///
/// Starting to edit spawns onto the current tokio runtime.
pub struct PresenceAgent {
    inner: Arc<AgentInner>,
    heartbeat_interval: Duration,
    timer: Option<JoinHandle<()>>,
}

impl PresenceAgent {
    pub fn new(
        actor: impl Into<ActorId>,
        transport: Arc<dyn PresenceTransport>,
        config: &PresenceConfig,
    ) -> (Self, UnboundedReceiver<PresenceNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(AgentInner {
            session_id: Uuid::new_v4(),
            actor: actor.into(),
            transport,
            request_timeout: config.request_timeout,
            state: Mutex::new(SessionState::default()),
            notifications: tx,
        });

        let agent = Self {
            inner,
            heartbeat_interval: config.heartbeat_interval,
            timer: None,
        };
        (agent, rx)
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn actor(&self) -> &str {
        &self.inner.actor
    }

    pub fn state(&self) -> AgentState {
        match &self.inner.state.lock().current_resource {
            Some(resource) => AgentState::Editing(resource.clone()),
            None => AgentState::Idle,
        }
    }

    pub fn known_resources(&self) -> BTreeSet<ResourceId> {
        self.inner.state.lock().known.resources().clone()
    }

    /// Enter `Editing(resource)`, leaving any current editing session first.
    pub fn start_editing(&mut self, resource: impl Into<ResourceId>) {
        self.stop_editing();

        let resource = resource.into();
        let epoch = {
            let mut state = self.inner.state.lock();
            state.epoch += 1;
            state.current_resource = Some(resource.clone());
            state.known.clear();
            state.epoch
        };

        info!(
            "Session {} ({}) started editing {}",
            self.inner.session_id, self.inner.actor, resource
        );

        let inner = self.inner.clone();
        let period = self.heartbeat_interval;
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                inner.beat(epoch, &resource).await;
            }
        }));
    }

    /// Return to `Idle` and cancel the heartbeat timer. No-op when idle.
    pub fn stop_editing(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let mut state = self.inner.state.lock();
        if let Some(resource) = state.current_resource.take() {
            state.epoch += 1;
            info!(
                "Session {} ({}) stopped editing {}",
                self.inner.session_id, self.inner.actor, resource
            );
        }
    }

    /// Reconcile against a report obtained outside the heartbeat loop, e.g.
    /// one delivered with a page render.
    pub fn set_active_resources(&self, fresh: BTreeSet<ResourceId>) -> Vec<PresenceNotification> {
        self.inner.apply(None, fresh)
    }

    /// Query the service without heartbeating and reconcile the result.
    /// Returns `None` when the query failed or timed out.
    pub async fn refresh(&self) -> Option<Vec<PresenceNotification>> {
        let request = self.inner.transport.query(&self.inner.actor);
        let report = self.inner.call("query", request).await?;
        Some(self.inner.apply(None, report.resources_with_other_editors))
    }

    /// End the session, cancelling any running timer.
    pub fn close(mut self) {
        self.stop_editing();
    }
}

impl Drop for PresenceAgent {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
