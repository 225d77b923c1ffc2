//! # Change-Tracking Hooks
//!
//! Reactive rules that run when messages are created or edited and when
//! users are deleted. Dispatch is an explicit list of handlers invoked
//! synchronously by the write path — there is no hidden registration or
//! framework dispatch; a service owns a [`HookRegistry`] and calls it
//! after (or, for edits, immediately before) persisting.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          HOOK DISPATCH                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  create_message ──► persist row ──► registry.message_created            │
//! │                                        └─► NotificationFanout           │
//! │                                            (best-effort inserts)        │
//! │                                                                         │
//! │  edit_message ──► registry.message_editing ──► persist update           │
//! │                      └─► EditHistory                                    │
//! │                          (snapshot MUST land before the update;         │
//! │                           a snapshot failure aborts the edit)           │
//! │                                                                         │
//! │  delete_user ──► registry.user_deleting ──► delete user row             │
//! │                      └─► UserCleanup                                    │
//! │                          (logged and swallowed; never blocks            │
//! │                           the deletion itself)                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::Result;
use crate::storage::{Database, MessageRecord};

/// A synchronous handler for message lifecycle events
///
/// All methods default to no-ops so implementors only override the
/// events they care about.
pub trait MessageHook: Send + Sync {
    /// Called after a message row has been persisted for the first time.
    ///
    /// Failures here must not unwind into the write path; implementors
    /// log and continue.
    fn message_created(&self, _db: &Database, _message: &MessageRecord) {}

    /// Called before a content-changing update is persisted.
    ///
    /// Returning an error aborts the edit — nothing has been written
    /// yet, so the message is left untouched.
    fn message_editing(
        &self,
        _db: &Database,
        _existing: &MessageRecord,
        _new_content: &str,
        _editor_id: i64,
    ) -> Result<()> {
        Ok(())
    }

    /// Called before a user row is deleted.
    ///
    /// Cleanup failures are logged and swallowed by the implementor;
    /// the deletion proceeds regardless.
    fn user_deleting(&self, _db: &Database, _user_id: i64) {}
}

/// An ordered list of hooks, invoked synchronously in registration order
pub struct HookRegistry {
    hooks: Vec<Box<dyn MessageHook>>,
}

impl HookRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Create a registry with the built-in hooks registered:
    /// [`NotificationFanout`], [`EditHistory`], and [`UserCleanup`]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(NotificationFanout));
        registry.register(Box::new(EditHistory));
        registry.register(Box::new(UserCleanup));
        registry
    }

    /// Append a hook to the dispatch list
    pub fn register(&mut self, hook: Box<dyn MessageHook>) {
        self.hooks.push(hook);
    }

    /// Number of registered hooks
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether the registry has no hooks
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Dispatch a message-created event to every hook
    pub fn message_created(&self, db: &Database, message: &MessageRecord) {
        for hook in &self.hooks {
            hook.message_created(db, message);
        }
    }

    /// Dispatch a message-editing event to every hook
    ///
    /// The first error aborts dispatch and is returned to the caller.
    pub fn message_editing(
        &self,
        db: &Database,
        existing: &MessageRecord,
        new_content: &str,
        editor_id: i64,
    ) -> Result<()> {
        for hook in &self.hooks {
            hook.message_editing(db, existing, new_content, editor_id)?;
        }
        Ok(())
    }

    /// Dispatch a user-deleting event to every hook
    pub fn user_deleting(&self, db: &Database, user_id: i64) {
        for hook in &self.hooks {
            hook.user_deleting(db, user_id);
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// BUILT-IN HOOKS
// ============================================================================

/// Creates one notification per non-sender participant when a message
/// is first persisted
///
/// For a message tied to a conversation, the recipients are every
/// participant except the sender; for a pairwise message, the single
/// receiver. The sender never receives a notification. Inserts are
/// best-effort: a failed insert is logged and the rest continue — the
/// message itself has already been persisted and stays.
pub struct NotificationFanout;

impl MessageHook for NotificationFanout {
    fn message_created(&self, db: &Database, message: &MessageRecord) {
        let mut recipients: Vec<i64> = match &message.conversation_id {
            Some(conversation_id) => match db.get_participants(conversation_id) {
                Ok(participants) => participants,
                Err(e) => {
                    tracing::warn!(
                        "Failed to load participants of {} for fan-out, falling back to receiver: {}",
                        conversation_id,
                        e
                    );
                    vec![message.receiver_id]
                }
            },
            None => vec![message.receiver_id],
        };
        recipients.retain(|&user_id| user_id != message.sender_id);

        for user_id in recipients {
            if let Err(e) = db.insert_notification(user_id, message.id, crate::time::now_timestamp_millis()) {
                tracing::warn!(
                    "Failed to create notification for user {} about message {}: {}",
                    user_id,
                    message.id,
                    e
                );
            }
        }
    }
}

/// Snapshots the prior content into history before a content-changing
/// edit is persisted
///
/// An unchanged-content save writes nothing. A failed snapshot aborts
/// the edit: the snapshot-before-update invariant is hard, unlike the
/// best-effort paths.
pub struct EditHistory;

impl MessageHook for EditHistory {
    fn message_editing(
        &self,
        db: &Database,
        existing: &MessageRecord,
        new_content: &str,
        editor_id: i64,
    ) -> Result<()> {
        if existing.content != new_content {
            db.insert_history(
                existing.id,
                &existing.content,
                crate::time::now_timestamp_millis(),
                Some(editor_id),
            )?;
        }
        Ok(())
    }
}

/// Removes a deleted user's messages, notifications, and tied history
///
/// Runs before the user row itself is deleted so the deletes are
/// observable; FK cascades backstop anything this pass misses. Every
/// step is best-effort — errors are logged and swallowed so cleanup
/// failure never blocks the user deletion.
pub struct UserCleanup;

impl MessageHook for UserCleanup {
    fn user_deleting(&self, db: &Database, user_id: i64) {
        // History first: its join needs the message rows still present
        if let Err(e) = db.delete_history_involving(user_id) {
            tracing::warn!("Failed to delete history for user {}: {}", user_id, e);
        }
        if let Err(e) = db.delete_notifications_for(user_id) {
            tracing::warn!("Failed to delete notifications for user {}: {}", user_id, e);
        }
        if let Err(e) = db.delete_messages_sent_by(user_id) {
            tracing::warn!("Failed to delete sent messages for user {}: {}", user_id, e);
        }
        if let Err(e) = db.delete_messages_received_by(user_id) {
            tracing::warn!("Failed to delete received messages for user {}: {}", user_id, e);
        }

        tracing::debug!("Cleanup complete for user {}", user_id);
    }
}

// ============================================================================
// TESTS
// ============================================================================
