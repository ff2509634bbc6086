use std::convert::Infallible;
use std::sync::Arc;

use warp::http::StatusCode;
use warp::reply::{json, with_status, Json, WithStatus};
use warp::Rejection;

use crate::models::{
    ActorDirectory, EditorsParams, EditorsReport, HeartbeatRequest, PresenceError, QueryParams,
};
use crate::presence::PresenceEngine;
use crate::utils::logger::log_rejected;

type JsonReply = WithStatus<Json>;

fn send_error(action: &str, code: StatusCode, message: &str) -> JsonReply {
    let error = PresenceError::new(action, code.as_u16(), message);
    with_status(json(&error), code)
}

fn missing_field(action: &str, values: &[(&str, &str)]) -> Option<JsonReply> {
    let (field, _) = values.iter().find(|(_, value)| value.trim().is_empty())?;
    let reason = format!("{field} must not be empty");
    log_rejected(action, &reason);
    Some(send_error(action, StatusCode::BAD_REQUEST, &reason))
}

pub async fn heartbeat_handler(
    request: HeartbeatRequest,
    engine: PresenceEngine,
) -> Result<JsonReply, Infallible> {
    if let Some(reply) = missing_field(
        "heartbeat",
        &[("resource", request.resource.as_str()), ("actor", request.actor.as_str())],
    ) {
        return Ok(reply);
    }

    match engine.heartbeat(&request.resource, &request.actor).await {
        Ok(report) => Ok(with_status(json(&report), StatusCode::OK)),
        Err(e) => Ok(send_error(
            "heartbeat",
            StatusCode::SERVICE_UNAVAILABLE,
            &e.to_string(),
        )),
    }
}

pub async fn query_handler(
    params: QueryParams,
    engine: PresenceEngine,
) -> Result<JsonReply, Infallible> {
    if let Some(reply) = missing_field("query", &[("actor", params.actor.as_str())]) {
        return Ok(reply);
    }

    let report = engine.query(&params.actor).await;
    Ok(with_status(json(&report), StatusCode::OK))
}

pub async fn editors_handler(
    params: EditorsParams,
    engine: PresenceEngine,
    directory: Arc<dyn ActorDirectory>,
) -> Result<JsonReply, Infallible> {
    if let Some(reply) = missing_field(
        "editors",
        &[("resource", params.resource.as_str()), ("actor", params.actor.as_str())],
    ) {
        return Ok(reply);
    }

    let now = engine.now();
    let editors = engine.active_editors(&params.resource, &params.actor, now).await;
    let message = engine
        .editing_alert(&params.resource, &params.actor, now, directory.as_ref())
        .await;

    let report = EditorsReport {
        resource: params.resource,
        editors,
        message,
    };
    Ok(with_status(json(&report), StatusCode::OK))
}

/// Turn warp's own rejections (bad query string, bad body, unknown route)
/// into the JSON error shape used everywhere else.
pub async fn handle_rejection(err: Rejection) -> Result<JsonReply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("unhandled rejection: {err:?}"))
    };

    log_rejected("request", &message);
    Ok(send_error("request", code, &message))
}
