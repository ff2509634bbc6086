use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::heartbeat::ActorId;

/// An editing identity as known to the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: ActorId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Actor {
    pub fn new(username: impl Into<ActorId>) -> Self {
        Self {
            username: username.into(),
            first_name: None,
            last_name: None,
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// "first last" when both parts are present, otherwise the username.
    pub fn display_name(&self) -> String {
        match (non_empty(&self.first_name), non_empty(&self.last_name)) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            _ => self.username.clone(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Resolves actor ids to identities. Unknown actors resolve to `None`.
pub trait ActorDirectory: Send + Sync {
    fn lookup(&self, actor: &str) -> Option<Actor>;
}

/// Directory that knows every actor by its id alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandleDirectory;

impl ActorDirectory for HandleDirectory {
    fn lookup(&self, actor: &str) -> Option<Actor> {
        Some(Actor::new(actor))
    }
}

/// Fixed set of registered actors.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    actors: HashMap<ActorId, Actor>,
}

impl StaticDirectory {
    pub fn new(actors: impl IntoIterator<Item = Actor>) -> Self {
        Self {
            actors: actors
                .into_iter()
                .map(|actor| (actor.username.clone(), actor))
                .collect(),
        }
    }
}

impl ActorDirectory for StaticDirectory {
    fn lookup(&self, actor: &str) -> Option<Actor> {
        self.actors.get(actor).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_full_name() {
        let actor = Actor::new("ann").with_name("Ann", "Lee");
        assert_eq!(actor.display_name(), "Ann Lee");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut actor = Actor::new("bo");
        actor.first_name = Some("Bo".to_string());
        assert_eq!(actor.display_name(), "bo");

        actor.last_name = Some("   ".to_string());
        assert_eq!(actor.display_name(), "bo");
    }

    #[test]
    fn test_static_directory_lookup() {
        let directory = StaticDirectory::new([Actor::new("ann")]);
        assert!(directory.lookup("ann").is_some());
        assert!(directory.lookup("mallory").is_none());
        assert_eq!(HandleDirectory.lookup("cy").unwrap().display_name(), "cy");
    }
}
