//! # Unread-Message Index
//!
//! Per-user unread queries, bulk mark-as-read, and counts. Read-state
//! changes never trigger notifications — only the creation and edit
//! hooks do.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::storage::UnreadMessageRecord;

/// An unread message as served by the inbox listing
///
/// A narrow projection: only the fields a list display needs, so the
/// inbox query never drags in full message rows.
#[derive(Debug, Clone, Serialize)]
pub struct UnreadMessage {
    /// Message id
    pub id: i64,
    /// Sender user id
    pub sender_id: i64,
    /// Sender's username
    pub sender_username: String,
    /// Message body
    pub content: String,
    /// Sent timestamp (Unix ms)
    pub timestamp: i64,
    /// Read flag (always false here)
    pub read: bool,
}

impl From<UnreadMessageRecord> for UnreadMessage {
    fn from(record: UnreadMessageRecord) -> Self {
        Self {
            id: record.id,
            sender_id: record.sender_id,
            sender_username: record.sender_username,
            content: record.content,
            timestamp: record.timestamp,
            read: record.read,
        }
    }
}

impl super::MessageService {
    // ── Unread index ────────────────────────────────────────────────────

    /// Get the unread messages addressed to a user, newest first
    pub fn unread_for(&self, user_id: i64) -> Result<Vec<UnreadMessage>> {
        self.db()
            .get_user(user_id)?
            .ok_or(Error::UserNotFound(user_id))?;

        Ok(self
            .db()
            .unread_messages_for(user_id)?
            .into_iter()
            .map(UnreadMessage::from)
            .collect())
    }

    /// Mark messages addressed to a user as read
    ///
    /// `None` marks everything unread for the user; a slice restricts
    /// the update to those ids. Returns the number of rows affected,
    /// so calling twice reports zero the second time.
    pub fn mark_read(&self, user_id: i64, message_ids: Option<&[i64]>) -> Result<usize> {
        self.db()
            .get_user(user_id)?
            .ok_or(Error::UserNotFound(user_id))?;

        let affected = self.db().mark_messages_read(user_id, message_ids)?;
        if affected > 0 {
            tracing::debug!("Marked {} messages read for user {}", affected, user_id);
        }
        Ok(affected)
    }

    /// Mark every unread message in a thread addressed to a user as read
    pub fn mark_thread_read(&self, user_id: i64, thread_id: &str) -> Result<usize> {
        self.db()
            .get_user(user_id)?
            .ok_or(Error::UserNotFound(user_id))?;

        self.db().mark_thread_read(user_id, thread_id)
    }

    /// Count the unread messages addressed to a user
    pub fn unread_count(&self, user_id: i64) -> Result<i64> {
        self.db()
            .get_user(user_id)?
            .ok_or(Error::UserNotFound(user_id))?;

        self.db().unread_count(user_id)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::super::tests::setup;
    use crate::error::Error;

    #[test]
    fn test_unread_listing_and_count() {
        let (service, alice, bob) = setup();

        service.send_message(bob, alice, "one").unwrap();
        service.send_message(bob, alice, "two").unwrap();
        let m3 = service.send_message(bob, alice, "three").unwrap();

        assert_eq!(service.unread_count(alice).unwrap(), 3);

        let unread = service.unread_for(alice).unwrap();
        assert_eq!(unread.len(), 3);
        assert_eq!(unread[0].id, m3.id); // newest first
        assert_eq!(unread[0].sender_username, "bob");

        // The sender's own outbox stays clean
        assert_eq!(service.unread_count(bob).unwrap(), 0);
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let (service, alice, bob) = setup();

        service.send_message(bob, alice, "one").unwrap();
        service.send_message(bob, alice, "two").unwrap();
        service.send_message(bob, alice, "three").unwrap();
        assert_eq!(service.unread_count(alice).unwrap(), 3);

        let affected = service.mark_read(alice, None).unwrap();
        assert_eq!(affected, 3);
        assert_eq!(service.unread_count(alice).unwrap(), 0);

        // Second pass touches nothing and still reports zero unread
        let affected = service.mark_read(alice, None).unwrap();
        assert_eq!(affected, 0);
        assert_eq!(service.unread_count(alice).unwrap(), 0);
    }

    #[test]
    fn test_mark_read_with_explicit_ids() {
        let (service, alice, bob) = setup();

        let m1 = service.send_message(bob, alice, "one").unwrap();
        let m2 = service.send_message(bob, alice, "two").unwrap();

        let affected = service.mark_read(alice, Some(&[m1.id])).unwrap();
        assert_eq!(affected, 1);
        assert_eq!(service.unread_count(alice).unwrap(), 1);

        let unread = service.unread_for(alice).unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, m2.id);
    }

    #[test]
    fn test_mark_read_ignores_messages_for_others() {
        let (service, alice, bob) = setup();

        let to_bob = service.send_message(alice, bob, "for bob").unwrap();

        // Alice passing Bob's message id affects nothing
        let affected = service.mark_read(alice, Some(&[to_bob.id])).unwrap();
        assert_eq!(affected, 0);
        assert_eq!(service.unread_count(bob).unwrap(), 1);
    }

    #[test]
    fn test_mark_thread_read() {
        let (service, alice, bob) = setup();

        let m1 = service.send_message(bob, alice, "root").unwrap();
        service.reply(bob, m1.id, "more").unwrap();
        service.send_message(bob, alice, "other thread").unwrap();

        let affected = service.mark_thread_read(alice, &m1.thread_id).unwrap();
        assert_eq!(affected, 2);
        assert_eq!(service.unread_count(alice).unwrap(), 1);
    }

    #[test]
    fn test_unread_requires_known_user() {
        let (service, _, _) = setup();
        assert!(matches!(
            service.unread_count(999),
            Err(Error::UserNotFound(999))
        ));
        assert!(matches!(
            service.mark_read(999, None),
            Err(Error::UserNotFound(999))
        ));
    }
}
