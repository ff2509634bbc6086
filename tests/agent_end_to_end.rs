use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use edit_presence::agent::{
    HttpTransport, LocalTransport, PresenceAgent, PresenceNotification, PresenceTransport,
};
use edit_presence::handlers::routes;
use edit_presence::models::HandleDirectory;
use edit_presence::state::{FileStore, MemoryStore};
use edit_presence::utils::ManualClock;
use edit_presence::{PresenceConfig, PresenceEngine};

fn fast_config() -> PresenceConfig {
    PresenceConfig {
        heartbeat_interval: Duration::from_millis(50),
        request_timeout: Duration::from_secs(2),
        ..PresenceConfig::default()
    }
}

async fn next(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<PresenceNotification>,
) -> PresenceNotification {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("notification in time")
        .expect("channel open")
}

#[tokio::test]
async fn two_editors_see_each_other_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config();
    let clock = Arc::new(ManualClock::new(10_000));
    let store = Arc::new(FileStore::open(dir.path().join("page-lock.json"), 86_400).unwrap());
    let engine = PresenceEngine::new(store, clock.clone(), &config);

    let (addr, server) =
        warp::serve(routes(engine, Arc::new(HandleDirectory))).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let transport: Arc<dyn PresenceTransport> =
        Arc::new(HttpTransport::new(format!("http://{addr}")));
    let (mut ann, mut ann_rx) = PresenceAgent::new("ann", transport.clone(), &config);
    let (mut bo, mut bo_rx) = PresenceAgent::new("bo", transport.clone(), &config);

    ann.start_editing("blog/hello");
    bo.start_editing("about");

    assert_eq!(next(&mut ann_rx).await, PresenceNotification::Entered("about".to_string()));
    assert_eq!(next(&mut bo_rx).await, PresenceNotification::Entered("blog/hello".to_string()));

    // bo leaves; once the cooldown passes ann is told about it
    bo.close();
    // let a heartbeat bo already sent land before time moves on
    tokio::time::sleep(Duration::from_millis(200)).await;
    clock.advance(21);
    assert_eq!(next(&mut ann_rx).await, PresenceNotification::Exited("about".to_string()));
    assert!(ann.known_resources().is_empty());

    // a query without heartbeat sees ann's resource
    let report = transport.query("bo").await.unwrap();
    assert_eq!(
        report.resources_with_other_editors,
        BTreeSet::from(["blog/hello".to_string()])
    );
    drop(bo_rx);
    ann.close();
}

#[tokio::test]
async fn unreachable_server_leaves_state_untouched() {
    let config = PresenceConfig {
        request_timeout: Duration::from_millis(200),
        ..fast_config()
    };
    // nothing listens on the discard port
    let transport = Arc::new(HttpTransport::new("http://127.0.0.1:9"));
    let (mut agent, mut rx) = PresenceAgent::new("ann", transport, &config);

    agent.start_editing("home");
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(rx.try_recv().is_err());
    assert!(agent.refresh().await.is_none());
    assert!(agent.known_resources().is_empty());
    agent.close();
}

#[tokio::test]
async fn in_process_transport_drives_agent() {
    let config = fast_config();
    let clock = Arc::new(ManualClock::new(500));
    let engine = PresenceEngine::new(Arc::new(MemoryStore::new(86_400)), clock, &config);
    engine.heartbeat("home", "cy").await.unwrap();

    let transport = Arc::new(LocalTransport::new(engine.clone()));
    let (mut agent, mut rx) = PresenceAgent::new("ann", transport, &config);
    agent.start_editing("home");

    assert_eq!(next(&mut rx).await, PresenceNotification::Entered("home".to_string()));
    let log = engine.store().get_log("home").await;
    assert!(log.contains_key("ann"));
    assert!(log.contains_key("cy"));
    agent.close();
}
