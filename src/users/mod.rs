//! # Users Module
//!
//! Identity rows and account lifecycle. Deleting a user triggers the
//! cascading cleanup policy: a best-effort pass over their messages,
//! notifications, and tied history, with FK cascades as the backstop —
//! cleanup failure never blocks the deletion itself.

use serde::Serialize;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::hooks::HookRegistry;
use crate::storage::{Database, UserRecord};

/// A user of the messaging system
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// User id
    pub id: i64,
    /// Unique handle
    pub username: String,
    /// Display name
    pub display_name: String,
    /// Creation timestamp (Unix seconds)
    pub created_at: i64,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            display_name: record.display_name,
            created_at: record.created_at,
        }
    }
}

/// Service for account lifecycle
pub struct UserService {
    db: Arc<Database>,
    hooks: Arc<HookRegistry>,
}

impl UserService {
    /// Create a user service backed by the given database and hooks
    pub fn new(db: Arc<Database>, hooks: Arc<HookRegistry>) -> Self {
        Self { db, hooks }
    }

    /// Create a new user
    ///
    /// An empty display name falls back to the username.
    pub fn create_user(&self, username: &str, display_name: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::EmptyUsername);
        }
        if self.db.get_user_by_username(username)?.is_some() {
            return Err(Error::UsernameTaken(username.to_string()));
        }

        let display_name = match display_name.trim() {
            "" => username,
            trimmed => trimmed,
        };

        let now = crate::time::now_timestamp();
        let id = self.db.create_user(username, display_name, now)?;

        tracing::debug!("Created user {} ({})", id, username);

        Ok(User {
            id,
            username: username.to_string(),
            display_name: display_name.to_string(),
            created_at: now,
        })
    }

    /// Get a user by id
    pub fn get_user(&self, id: i64) -> Result<User> {
        self.db
            .get_user(id)?
            .map(User::from)
            .ok_or(Error::UserNotFound(id))
    }

    /// Get a user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.db.get_user_by_username(username)?.map(User::from))
    }

    /// Delete a user and their messaging data
    ///
    /// Runs the cleanup hooks (best-effort, logged and swallowed), then
    /// deletes the user row. The row deletion cascades over anything
    /// the cleanup pass missed.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.db.get_user(id)?.ok_or(Error::UserNotFound(id))?;

        self.hooks.user_deleting(&self.db, id);
        self.db.delete_user_row(id)?;

        tracing::info!("Deleted user {}", id);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageService;

    fn setup() -> (UserService, MessageService) {
        let db = Arc::new(Database::open(None).unwrap());
        let hooks = Arc::new(HookRegistry::with_defaults());
        (
            UserService::new(db.clone(), hooks.clone()),
            MessageService::new(db, hooks),
        )
    }

    #[test]
    fn test_create_and_get() {
        let (users, _) = setup();

        let alice = users.create_user("alice", "Alice").unwrap();
        assert!(alice.id > 0);
        assert_eq!(alice.username, "alice");

        let fetched = users.get_user(alice.id).unwrap();
        assert_eq!(fetched.username, "alice");
        assert_eq!(
            users.get_user_by_username("alice").unwrap().unwrap().id,
            alice.id
        );
        assert!(users.get_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let (users, _) = setup();
        let user = users.create_user("carol", "  ").unwrap();
        assert_eq!(user.display_name, "carol");
    }

    #[test]
    fn test_validation() {
        let (users, _) = setup();

        assert!(matches!(users.create_user("  ", "X"), Err(Error::EmptyUsername)));

        users.create_user("alice", "Alice").unwrap();
        assert!(matches!(
            users.create_user("alice", "Other Alice"),
            Err(Error::UsernameTaken(_))
        ));
    }

    #[test]
    fn test_delete_unknown_user() {
        let (users, _) = setup();
        assert!(matches!(users.delete_user(42), Err(Error::UserNotFound(42))));
    }

    #[test]
    fn test_delete_user_cascades_their_data() {
        let (users, messages) = setup();

        let alice = users.create_user("alice", "Alice").unwrap();
        let bob = users.create_user("bob", "Bob").unwrap();
        let carol = users.create_user("carol", "Carol").unwrap();

        // Alice sends to Bob (notifies Bob), Bob sends to Alice
        // (notifies Alice), and Bob↔Carol traffic stays unrelated
        let sent = messages.send_message(alice.id, bob.id, "from alice").unwrap();
        messages.edit_message(alice.id, sent.id, "edited").unwrap();
        messages.send_message(bob.id, alice.id, "to alice").unwrap();
        let unrelated = messages.send_message(bob.id, carol.id, "unrelated").unwrap();

        users.delete_user(alice.id).unwrap();

        assert!(matches!(
            users.get_user(alice.id),
            Err(Error::UserNotFound(_))
        ));
        // Alice's sent and received messages are gone
        assert!(matches!(
            messages.get_message(sent.id),
            Err(Error::MessageNotFound(_))
        ));
        assert_eq!(messages.db().notifications_for(bob.id).unwrap().len(), 0);
        // Bob, Carol, and their exchange are untouched
        assert!(users.get_user(bob.id).is_ok());
        assert!(messages.get_message(unrelated.id).is_ok());
        assert_eq!(messages.db().notifications_for(carol.id).unwrap().len(), 1);
    }
}
