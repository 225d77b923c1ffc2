//! # Notifications Module
//!
//! Read-side access to the notifications created by the fan-out hook.
//! Creation itself lives in [`hooks::NotificationFanout`](crate::hooks::NotificationFanout);
//! this module only lists and marks.

use serde::Serialize;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::{Database, NotificationRecord};

/// A notification about a message
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Notification id
    pub id: i64,
    /// Recipient user id
    pub user_id: i64,
    /// The message this notification is about
    pub message_id: i64,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Whether the recipient has seen it
    pub read: bool,
}

impl From<NotificationRecord> for Notification {
    fn from(record: NotificationRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            message_id: record.message_id,
            created_at: record.created_at,
            read: record.read,
        }
    }
}

/// Service for listing and acknowledging notifications
pub struct NotificationService {
    db: Arc<Database>,
}

impl NotificationService {
    /// Create a notification service backed by the given database
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get a user's notifications, newest first
    pub fn notifications_for(&self, user_id: i64) -> Result<Vec<Notification>> {
        self.db
            .get_user(user_id)?
            .ok_or(Error::UserNotFound(user_id))?;

        Ok(self
            .db
            .notifications_for(user_id)?
            .into_iter()
            .map(Notification::from)
            .collect())
    }

    /// Count a user's unread notifications
    pub fn unread_count(&self, user_id: i64) -> Result<i64> {
        self.db
            .get_user(user_id)?
            .ok_or(Error::UserNotFound(user_id))?;

        self.db.unread_notification_count(user_id)
    }

    /// Mark one of the user's notifications as read
    ///
    /// Rejects notifications addressed to anyone else.
    pub fn mark_read(&self, user_id: i64, notification_id: i64) -> Result<()> {
        let notification = self
            .db
            .get_notification(notification_id)?
            .ok_or(Error::NotificationNotFound(notification_id))?;

        if notification.user_id != user_id {
            return Err(Error::NotNotificationOwner {
                user_id,
                notification_id,
            });
        }

        self.db.mark_notification_read(notification_id)?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
