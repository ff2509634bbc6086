use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use edit_presence::handlers::routes;
use edit_presence::models::HandleDirectory;
use edit_presence::state::open_store;
use edit_presence::utils::logger::{set_verbose_logging, setup_logger};
use edit_presence::utils::SystemClock;
use edit_presence::{PresenceConfig, PresenceEngine};

#[tokio::main]
async fn main() -> ExitCode {
    setup_logger();

    let config = match PresenceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    set_verbose_logging(config.verbose);

    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open {:?} heartbeat store: {}", config.backend, e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Presence store: {} (cooldown {}s, retention {}s)",
        store.backend(),
        config.cooldown_window,
        config.retention_window
    );

    let engine = PresenceEngine::new(store, Arc::new(SystemClock), &config);
    let routes = routes(engine, Arc::new(HandleDirectory));

    info!("Server started at {}", config.bind_addr);
    warp::serve(routes).run(config.bind_addr).await;
    ExitCode::SUCCESS
}
