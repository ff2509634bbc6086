//! Edit presence tracking.
//!
//! Detects when several actors have the same resource open for editing:
//! - A heartbeat log (resource -> actor -> last seen) with lazy retention purge
//! - A presence engine answering "who else is editing this right now?"
//! - A client agent that heartbeats while editing and diffs the results
//! - A warp HTTP binding for the heartbeat/query transport
//!
//! # Examples
//!
//! ```rust
//! use edit_presence::presence::compose_presence_message;
//!
//! let message = compose_presence_message(&["Ann", "Bo"]);
//! assert_eq!(message.as_deref(), Some("Ann and Bo are currently editing this page"));
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod presence;
pub mod state;
pub mod utils;

pub use config::PresenceConfig;
pub use error::{ConfigError, StoreError, TransportError};
pub use models::{ActorId, HeartbeatLog, ResourceId, ResourceLog, Timestamp};
pub use presence::PresenceEngine;
pub use state::HeartbeatStore;
