//! Presence questions over the heartbeat log: who is editing a resource,
//! which resources others are editing, and the alert text shown to an
//! editor.

mod engine;
mod message;

pub use engine::{active_editors_in, resources_with_other_editors_in, PresenceEngine};
pub use message::{compose_presence_message, compose_presence_message_for};
