pub mod actor;
pub mod heartbeat;
pub mod message;

pub use actor::{Actor, ActorDirectory, HandleDirectory, StaticDirectory};
pub use heartbeat::{ActorId, HeartbeatLog, ResourceId, ResourceLog, Timestamp};
pub use message::{
    EditorsParams, EditorsReport, HeartbeatRequest, PresenceError, PresenceReport, QueryParams,
};
