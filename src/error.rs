//! # Error Handling
//!
//! This module provides the error types for Quill Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Validation Errors                                                 │
//! │  │   ├── EmptyContent          - Message body is empty                 │
//! │  │   ├── EmptyUsername         - Username is empty                     │
//! │  │   └── UsernameTaken         - Username already registered           │
//! │  │                                                                      │
//! │  ├── Not-Found Errors                                                  │
//! │  │   ├── UserNotFound          - No user with that id                  │
//! │  │   ├── MessageNotFound       - No message with that id               │
//! │  │   ├── ThreadNotFound        - No messages share that thread id      │
//! │  │   ├── ConversationNotFound  - No conversation with that id          │
//! │  │   └── NotificationNotFound  - No notification with that id          │
//! │  │                                                                      │
//! │  ├── Permission Errors                                                 │
//! │  │   ├── NotMessageSender      - Editing someone else's message        │
//! │  │   ├── NotParticipant        - Reading a thread you're not in        │
//! │  │   └── NotNotificationOwner  - Touching someone else's notification  │
//! │  │                                                                      │
//! │  └── Storage Errors                                                    │
//! │      └── DatabaseError         - Underlying SQLite failure             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors surface to callers as distinguishable variants. The one
//! exception is the cascading-deletion cleanup path, which logs and
//! swallows failures instead of returning them (see `hooks`).

use thiserror::Error;

/// Result type alias for Quill Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Quill Core
///
/// All errors are categorized by kind to make error handling clearer
/// and to let the host framework map them to response statuses.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Validation Errors
    // ========================================================================

    /// Message content is empty or whitespace-only
    #[error("Message content must not be empty.")]
    EmptyContent,

    /// Username is empty or whitespace-only
    #[error("Username must not be empty.")]
    EmptyUsername,

    /// Username is already registered
    #[error("Username '{0}' is already taken.")]
    UsernameTaken(String),

    // ========================================================================
    // Not-Found Errors
    // ========================================================================

    /// No user with the given id
    #[error("User {0} not found.")]
    UserNotFound(i64),

    /// No message with the given id
    #[error("Message {0} not found.")]
    MessageNotFound(i64),

    /// No messages share the given thread id
    #[error("Thread {0} not found.")]
    ThreadNotFound(String),

    /// No conversation with the given id
    #[error("Conversation {0} not found.")]
    ConversationNotFound(String),

    /// No notification with the given id
    #[error("Notification {0} not found.")]
    NotificationNotFound(i64),

    // ========================================================================
    // Permission Errors
    // ========================================================================

    /// Only the sender of a message may edit it
    #[error("User {user_id} is not the sender of message {message_id}.")]
    NotMessageSender {
        /// The user who attempted the edit
        user_id: i64,
        /// The message they attempted to edit
        message_id: i64,
    },

    /// The user is not a participant of the thread or conversation
    #[error("User {0} is not a participant of this conversation.")]
    NotParticipant(i64),

    /// The notification belongs to a different user
    #[error("Notification {notification_id} does not belong to user {user_id}.")]
    NotNotificationOwner {
        /// The user who attempted the update
        user_id: i64,
        /// The notification they attempted to update
        notification_id: i64,
    },

    // ========================================================================
    // Storage Errors
    // ========================================================================

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl Error {
    /// Check if this error is a not-found outcome
    ///
    /// Useful for hosts mapping errors to "404"-style responses.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::UserNotFound(_)
                | Error::MessageNotFound(_)
                | Error::ThreadNotFound(_)
                | Error::ConversationNotFound(_)
                | Error::NotificationNotFound(_)
        )
    }

    /// Check if this error is a permission rejection
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            Error::NotMessageSender { .. }
                | Error::NotParticipant(_)
                | Error::NotNotificationOwner { .. }
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::DatabaseError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(Error::UserNotFound(1).is_not_found());
        assert!(Error::ThreadNotFound("t".into()).is_not_found());
        assert!(!Error::EmptyContent.is_not_found());
        assert!(!Error::DatabaseError("boom".into()).is_not_found());
    }

    #[test]
    fn test_permission_classification() {
        let err = Error::NotMessageSender {
            user_id: 2,
            message_id: 7,
        };
        assert!(err.is_permission_denied());
        assert!(Error::NotParticipant(3).is_permission_denied());
        assert!(!Error::MessageNotFound(7).is_permission_denied());
    }

    #[test]
    fn test_error_messages_name_the_subject() {
        let err = Error::UsernameTaken("alice".into());
        assert!(err.to_string().contains("alice"));

        let err = Error::NotMessageSender {
            user_id: 2,
            message_id: 7,
        };
        assert!(err.to_string().contains('2'));
        assert!(err.to_string().contains('7'));
    }
}
