// ============================
// crates/backend-lib/src/registry.rs
// ============================
//! Session registry: one record per active connection, the source of
//! truth for "who is online". Registration order is preserved for
//! presence broadcasts.
use chatroom_common::{Session, Status};
use chrono::Utc;

/// Synthesize the display image URI used when a client joins without one.
pub fn default_avatar(username: &str) -> String {
    format!("https://ui-avatars.com/api/?name={username}")
}

#[derive(Default)]
pub struct SessionRegistry {
    // Vec keeps registration order; the registry stays small enough
    // that linear lookup by connection id is fine.
    sessions: Vec<Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for `conn_id`. A re-join on a live connection
    /// id is an idempotent update: the stored record is replaced in
    /// place, keeping its position in the registration order.
    pub fn join(&mut self, conn_id: &str, username: String, avatar: Option<String>) -> Session {
        let session = Session {
            id: conn_id.to_string(),
            username: username.clone(),
            avatar: avatar.unwrap_or_else(|| default_avatar(&username)),
            status: Status::Online,
            joined_at: Utc::now(),
        };

        if let Some(existing) = self.sessions.iter_mut().find(|s| s.id == conn_id) {
            *existing = session.clone();
        } else {
            self.sessions.push(session.clone());
        }

        session
    }

    /// Remove the session for `conn_id`, returning it for downstream
    /// cleanup. Unknown ids are a no-op.
    pub fn remove(&mut self, conn_id: &str) -> Option<Session> {
        let idx = self.sessions.iter().position(|s| s.id == conn_id)?;
        Some(self.sessions.remove(idx))
    }

    pub fn get(&self, conn_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == conn_id)
    }

    pub fn contains(&self, conn_id: &str) -> bool {
        self.get(conn_id).is_some()
    }

    /// All sessions in registration order.
    pub fn list(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_preserves_registration_order() {
        let mut registry = SessionRegistry::new();
        registry.join("c1", "ada".to_string(), None);
        registry.join("c2", "grace".to_string(), None);
        registry.join("c3", "linus".to_string(), None);

        let names: Vec<_> = registry.list().iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, ["ada", "grace", "linus"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_join_is_an_idempotent_update() {
        let mut registry = SessionRegistry::new();
        registry.join("c1", "ada".to_string(), None);
        registry.join("c2", "grace".to_string(), None);

        // same connection id joins again with a new name
        registry.join("c1", "ada2".to_string(), None);

        assert_eq!(registry.len(), 2);
        let names: Vec<_> = registry.list().iter().map(|s| s.username.as_str()).collect();
        // record replaced in place, order position kept
        assert_eq!(names, ["ada2", "grace"]);
    }

    #[test]
    fn missing_avatar_gets_a_synthesized_one() {
        let mut registry = SessionRegistry::new();
        let session = registry.join("c1", "ada".to_string(), None);
        assert_eq!(session.avatar, "https://ui-avatars.com/api/?name=ada");

        let session = registry.join("c2", "grace".to_string(), Some("https://img/g.png".to_string()));
        assert_eq!(session.avatar, "https://img/g.png");
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = SessionRegistry::new();
        registry.join("c1", "ada".to_string(), None);

        let removed = registry.remove("c1").unwrap();
        assert_eq!(removed.username, "ada");
        assert!(registry.is_empty());

        // second removal reports nothing and has no side effects
        assert!(registry.remove("c1").is_none());
        assert!(registry.remove("never-joined").is_none());
    }
}
