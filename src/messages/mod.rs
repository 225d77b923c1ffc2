//! # Messages Module
//!
//! The write path of the data layer: message creation (roots and
//! replies) and content edits, with hook dispatch for notification
//! fan-out and history snapshots.
//!
//! ## Write Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          WRITE FLOW                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  create_message / reply                                                 │
//! │  ───────────────────────                                                │
//! │  1. Validate content, sender, receiver, conversation membership         │
//! │  2. Assign thread id                                                    │
//! │       root  → fresh uuid                                                │
//! │       reply → inherited from parent (transitively, so arbitrary         │
//! │               reply depth shares one thread id)                         │
//! │  3. Persist row                                                         │
//! │  4. hooks.message_created  → notification fan-out (best-effort)         │
//! │                                                                         │
//! │  edit_message                                                           │
//! │  ────────────                                                           │
//! │  1. Validate content; only the sender may edit                          │
//! │  2. Unchanged content → no-op (no history, edited untouched)            │
//! │  3. hooks.message_editing → history snapshot (failure aborts)           │
//! │  4. Persist update, edited = true                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A message can never be its own ancestor: a reply's parent must
//! already be persisted, and rows get fresh ids, so cycles are ruled
//! out at creation time and thread reads never re-validate.

mod threads;
mod unread;

pub use threads::ThreadNode;
pub use unread::UnreadMessage;

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::ThreadCache;
use crate::error::{Error, Result};
use crate::hooks::HookRegistry;
use crate::storage::{Database, MessageHistoryRecord, MessageRecord};

/// A message between users
///
/// `edited` and `read` are orthogonal flags, not exclusive states.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message id (insertion order)
    pub id: i64,
    /// Sender user id
    pub sender_id: i64,
    /// Receiver user id
    pub receiver_id: i64,
    /// Conversation id, when part of a group exchange
    pub conversation_id: Option<String>,
    /// Message body
    pub content: String,
    /// Sent timestamp (Unix ms)
    pub timestamp: i64,
    /// Whether the content has been edited
    pub edited: bool,
    /// Whether the receiver has read it
    pub read: bool,
    /// Parent message id; None marks a thread root
    pub parent_id: Option<i64>,
    /// Thread id shared by the root and every reply
    pub thread_id: String,
}

impl Message {
    /// Whether this message is a thread root
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            sender_id: record.sender_id,
            receiver_id: record.receiver_id,
            conversation_id: record.conversation_id,
            content: record.content,
            timestamp: record.timestamp,
            edited: record.edited,
            read: record.read,
            parent_id: record.parent_id,
            thread_id: record.thread_id,
        }
    }
}

/// Service for creating, editing, and reading messages
///
/// Holds the database, the hook registry dispatched by the write path,
/// and the short-lived thread cache used by the cached read path.
pub struct MessageService {
    db: Arc<Database>,
    hooks: Arc<HookRegistry>,
    thread_cache: ThreadCache,
}

impl MessageService {
    /// Create a message service backed by the given database and hooks
    pub fn new(db: Arc<Database>, hooks: Arc<HookRegistry>) -> Self {
        Self {
            db,
            hooks,
            thread_cache: ThreadCache::new(),
        }
    }

    /// Create a message service with a custom-TTL thread cache
    pub fn with_thread_cache(db: Arc<Database>, hooks: Arc<HookRegistry>, cache: ThreadCache) -> Self {
        Self {
            db,
            hooks,
            thread_cache: cache,
        }
    }

    /// Get a reference to the underlying database
    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    /// Get a reference to the thread cache
    pub(crate) fn thread_cache(&self) -> &ThreadCache {
        &self.thread_cache
    }

    /// Send a pairwise message, starting a new thread
    pub fn send_message(&self, sender_id: i64, receiver_id: i64, content: &str) -> Result<Message> {
        self.create_message(sender_id, receiver_id, None, None, content)
    }

    /// Reply to an existing message
    ///
    /// The receiver is the other side of the parent exchange: replying
    /// to a message you received addresses its sender, replying to your
    /// own message addresses its receiver.
    pub fn reply(&self, sender_id: i64, parent_id: i64, content: &str) -> Result<Message> {
        let parent = self
            .db
            .get_message(parent_id)?
            .ok_or(Error::MessageNotFound(parent_id))?;

        let receiver_id = if sender_id == parent.receiver_id {
            parent.sender_id
        } else {
            parent.receiver_id
        };

        self.create_message(
            sender_id,
            receiver_id,
            parent.conversation_id.as_deref(),
            Some(parent_id),
            content,
        )
    }

    /// Create a message
    ///
    /// The general entry point behind [`send_message`](Self::send_message)
    /// and [`reply`](Self::reply). A null parent starts a new thread with
    /// a freshly generated thread id; a parent ref joins the parent's
    /// thread. Fan-out runs synchronously after the row is persisted.
    pub fn create_message(
        &self,
        sender_id: i64,
        receiver_id: i64,
        conversation_id: Option<&str>,
        parent_id: Option<i64>,
        content: &str,
    ) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::EmptyContent);
        }

        self.db
            .get_user(sender_id)?
            .ok_or(Error::UserNotFound(sender_id))?;
        self.db
            .get_user(receiver_id)?
            .ok_or(Error::UserNotFound(receiver_id))?;

        if let Some(conversation_id) = conversation_id {
            self.db
                .get_conversation(conversation_id)?
                .ok_or_else(|| Error::ConversationNotFound(conversation_id.to_string()))?;
            if !self.db.is_participant(conversation_id, sender_id)? {
                return Err(Error::NotParticipant(sender_id));
            }
        }

        let parent = match parent_id {
            Some(id) => Some(
                self.db
                    .get_message(id)?
                    .ok_or(Error::MessageNotFound(id))?,
            ),
            None => None,
        };

        if let Some(parent) = &parent {
            // Outside a conversation, only the two sides of the parent
            // exchange may extend it
            if conversation_id.is_none()
                && sender_id != parent.sender_id
                && sender_id != parent.receiver_id
            {
                return Err(Error::NotParticipant(sender_id));
            }
        }

        let thread_id = match &parent {
            Some(parent) => parent.thread_id.clone(),
            None => Uuid::new_v4().to_string(),
        };

        let timestamp = crate::time::now_timestamp_millis();
        let id = self.db.insert_message(
            sender_id,
            receiver_id,
            conversation_id,
            content,
            timestamp,
            parent_id,
            &thread_id,
        )?;

        let record = MessageRecord {
            id,
            sender_id,
            receiver_id,
            conversation_id: conversation_id.map(|s| s.to_string()),
            content: content.to_string(),
            timestamp,
            edited: false,
            read: false,
            parent_id,
            thread_id,
        };

        self.hooks.message_created(&self.db, &record);

        tracing::debug!(
            "Created message {} from {} to {} in thread {}",
            id,
            sender_id,
            receiver_id,
            record.thread_id
        );

        Ok(Message::from(record))
    }

    /// Get a message by id
    pub fn get_message(&self, id: i64) -> Result<Message> {
        self.db
            .get_message(id)?
            .map(Message::from)
            .ok_or(Error::MessageNotFound(id))
    }

    /// Edit a message's content
    ///
    /// Only the sender may edit. A content-changing edit snapshots the
    /// prior content into history (via the editing hooks) before the
    /// update is persisted and flags the message as edited; saving
    /// unchanged content is a no-op.
    pub fn edit_message(&self, editor_id: i64, message_id: i64, new_content: &str) -> Result<Message> {
        let new_content = new_content.trim();
        if new_content.is_empty() {
            return Err(Error::EmptyContent);
        }

        let existing = self
            .db
            .get_message(message_id)?
            .ok_or(Error::MessageNotFound(message_id))?;

        if existing.sender_id != editor_id {
            return Err(Error::NotMessageSender {
                user_id: editor_id,
                message_id,
            });
        }

        if existing.content == new_content {
            return Ok(Message::from(existing));
        }

        self.hooks
            .message_editing(&self.db, &existing, new_content, editor_id)?;
        self.db.update_message_content(message_id, new_content)?;

        tracing::debug!("Edited message {} by {}", message_id, editor_id);

        let mut updated = existing;
        updated.content = new_content.to_string();
        updated.edited = true;
        Ok(Message::from(updated))
    }

    /// Get a message's edit history, most recent edit first
    pub fn message_history(&self, message_id: i64) -> Result<Vec<MessageHistoryRecord>> {
        self.db
            .get_message(message_id)?
            .ok_or(Error::MessageNotFound(message_id))?;
        self.db.history_for_message(message_id)
    }
}

// ============================================================================
// TESTS
// ============================================================================
