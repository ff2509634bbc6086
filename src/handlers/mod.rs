//! HTTP binding of the heartbeat and query operations.
//!
//! - `POST /presence/heartbeat` with `{"resource", "actor"}`
//! - `GET /presence?actor=A`
//! - `GET /presence/editors?resource=R&actor=A`
//! - `GET /health`

pub mod presence;

use std::convert::Infallible;
use std::sync::Arc;

use warp::Filter;

use crate::models::{ActorDirectory, EditorsParams, HeartbeatRequest, QueryParams};
use crate::presence::PresenceEngine;

use self::presence::{editors_handler, handle_rejection, heartbeat_handler, query_handler};

// Dependency injection for the presence engine
fn with_engine(
    engine: PresenceEngine,
) -> impl Filter<Extract = (PresenceEngine,), Error = Infallible> + Clone {
    warp::any().map(move || engine.clone())
}

// Dependency injection for the actor directory
fn with_directory(
    directory: Arc<dyn ActorDirectory>,
) -> impl Filter<Extract = (Arc<dyn ActorDirectory>,), Error = Infallible> + Clone {
    warp::any().map(move || directory.clone())
}

pub fn routes(
    engine: PresenceEngine,
    directory: Arc<dyn ActorDirectory>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    let heartbeat_route = warp::path!("presence" / "heartbeat")
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json::<HeartbeatRequest>())
        .and(with_engine(engine.clone()))
        .and_then(heartbeat_handler);

    let query_route = warp::path!("presence")
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(with_engine(engine.clone()))
        .and_then(query_handler);

    let editors_route = warp::path!("presence" / "editors")
        .and(warp::get())
        .and(warp::query::<EditorsParams>())
        .and(with_engine(engine))
        .and(with_directory(directory))
        .and_then(editors_handler);

    let health_route = warp::path!("health").map(|| "OK");

    health_route
        .or(heartbeat_route)
        .or(query_route)
        .or(editors_route)
        .recover(handle_rejection)
}
