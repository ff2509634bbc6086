use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::heartbeat::{ActorId, ResourceId};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HeartbeatRequest {
    pub resource: ResourceId,
    pub actor: ActorId,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QueryParams {
    pub actor: ActorId,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EditorsParams {
    pub resource: ResourceId,
    pub actor: ActorId,
}

/// Answer to both heartbeat and query calls.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PresenceReport {
    pub success: bool,
    pub resources_with_other_editors: BTreeSet<ResourceId>,
}

impl PresenceReport {
    pub fn new(resources_with_other_editors: BTreeSet<ResourceId>) -> Self {
        Self {
            success: true,
            resources_with_other_editors,
        }
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorsReport {
    pub resource: ResourceId,
    pub editors: Vec<ActorId>,
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PresenceError {
    pub action: String,
    pub code: u16,
    pub message: String,
    pub status: String,
}

impl PresenceError {
    pub fn new(action: &str, code: u16, message: &str) -> Self {
        Self {
            action: action.to_string(),
            code,
            message: message.to_string(),
            status: "error".to_string(),
        }
    }
}
