use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use once_cell::sync::Lazy;

static VERBOSE_LOGGING: Lazy<AtomicBool> = Lazy::new(|| AtomicBool::new(false));

pub fn setup_logger() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init: tests and embedding hosts may already own a subscriber
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_line_number(true)
        .with_file(true)
        .with_env_filter(env_filter)
        .try_init();

    info!("Logger initialized");
}

pub fn set_verbose_logging(enabled: bool) {
    VERBOSE_LOGGING.store(enabled, Ordering::Relaxed);
    info!("Verbose logging {}", if enabled { "enabled" } else { "disabled" });
}

pub fn toggle_verbose_logging() -> bool {
    let new_state = !VERBOSE_LOGGING.load(Ordering::Relaxed);
    set_verbose_logging(new_state);
    new_state
}

pub fn verbose_logging() -> bool {
    VERBOSE_LOGGING.load(Ordering::Relaxed)
}

pub fn log_heartbeat(actor: &str, resource: &str) {
    if verbose_logging() {
        info!("Heartbeat from {} on {}", actor, resource);
    }
}

pub fn log_purged(resources: &[String]) {
    if !resources.is_empty() {
        debug!("Purged {} stale resource(s) from heartbeat log: {:?}", resources.len(), resources);
    }
}

pub fn log_store_degraded(backend: &str, reason: &str) {
    warn!("{} heartbeat log unreadable, continuing with empty log: {}", backend, reason);
}

pub fn log_store_write_failure(actor: &str, resource: &str, error: &str) {
    error!("Failed to record heartbeat from {} on {}: {}", actor, resource, error);
}

pub fn log_rejected(action: &str, reason: &str) {
    warn!("Rejected {} request: {}", action, reason);
}

pub fn log_transport_failure(session: &str, action: &str, error: &str) {
    debug!("Session {} {} failed, waiting for next tick: {}", session, action, error);
}
