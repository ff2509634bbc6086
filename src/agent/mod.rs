//! Client presence agent.
//!
//! Heartbeats the resource being edited and raises enter/exit
//! notifications as other editors come and go.

mod session;
mod transport;

pub use session::{AgentState, KnownResources, PresenceAgent, PresenceNotification};
pub use transport::{HttpTransport, LocalTransport, PresenceTransport};
