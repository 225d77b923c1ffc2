//! # Database
//!
//! SQLite database wrapper for the messaging data layer.
//!
//! ## Database Operations
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      DATABASE OPERATIONS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │    Services     │                                                   │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │    Database     │  High-level API                                   │
//! │  │   (this file)   │  - User / conversation rows                       │
//! │  │                 │  - Message, unread, and thread queries            │
//! │  │                 │  - Edit history, notifications                    │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │    rusqlite     │  SQLite wrapper                                   │
//! │  │                 │  - Prepared statements                            │
//! │  │                 │  - FK cascades (PRAGMA foreign_keys = ON)         │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │   SQLite DB     │  Storage                                          │
//! │  │   (file or      │  - In-memory for tests                            │
//! │  │    memory)      │  - File for production                            │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::sync::Arc;

use super::schema;
use crate::error::{Error, Result};

/// The main database handle
///
/// Wraps a SQLite connection and provides high-level methods for
/// storing and retrieving messaging data. Row-level consistency for
/// concurrent callers comes from the connection mutex; no additional
/// locking is layered on top.
pub struct Database {
    /// The underlying SQLite connection
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database
    ///
    /// If path is None, creates an in-memory database (useful for testing).
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| Error::DatabaseError(format!("Failed to open database: {}", e)))?,
            None => Connection::open_in_memory().map_err(|e| {
                Error::DatabaseError(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        // Cascading deletion relies on FK enforcement
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| Error::DatabaseError(format!("Failed to enable foreign keys: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        // Check current schema version
        let version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .ok();

        match version {
            None => {
                // Fresh database, create all tables
                conn.execute_batch(schema::CREATE_TABLES)
                    .map_err(|e| Error::DatabaseError(format!("Failed to create tables: {}", e)))?;

                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?)",
                    params![schema::SCHEMA_VERSION],
                )
                .map_err(|e| Error::DatabaseError(format!("Failed to set schema version: {}", e)))?;

                tracing::info!("Database schema created (version {})", schema::SCHEMA_VERSION);
            }
            Some(v) if v < schema::SCHEMA_VERSION => {
                tracing::info!(
                    "Database schema version {} is older than current {}, running migrations",
                    v,
                    schema::SCHEMA_VERSION
                );

                if v < 2 {
                    tracing::info!("Running migration v1 → v2 (conversations, participants)");
                    conn.execute_batch(schema::MIGRATE_V1_TO_V2)
                        .map_err(|e| Error::DatabaseError(format!("Migration v1→v2 failed: {}", e)))?;
                }

                tracing::info!("All migrations complete (now at version {})", schema::SCHEMA_VERSION);
            }
            Some(v) => {
                tracing::debug!("Database schema version: {}", v);
            }
        }

        Ok(())
    }

    /// Drop and recreate all tables (for testing/reset)
    pub fn reset(&self) -> Result<()> {
        {
            let conn = self.conn.lock();
            conn.execute_batch(schema::DROP_TABLES)
                .map_err(|e| Error::DatabaseError(format!("Failed to drop tables: {}", e)))?;
        }
        self.init_schema()
    }

    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    /// Create a new user, returning the assigned row id
    pub fn create_user(&self, username: &str, display_name: &str, created_at: i64) -> Result<i64> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO users (username, display_name, created_at) VALUES (?, ?, ?)",
            params![username, display_name, created_at],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to create user: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a user by id
    pub fn get_user(&self, id: i64) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, username, display_name, created_at FROM users WHERE id = ?",
            params![id],
            |row| {
                Ok(UserRecord {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    display_name: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get user: {}", e))),
        }
    }

    /// Get a user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, username, display_name, created_at FROM users WHERE username = ?",
            params![username],
            |row| {
                Ok(UserRecord {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    display_name: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get user: {}", e))),
        }
    }

    /// Delete a user row
    ///
    /// FK cascades remove the user's messages, notifications, and
    /// participant rows along with it.
    pub fn delete_user_row(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM users WHERE id = ?", params![id])
            .map_err(|e| Error::DatabaseError(format!("Failed to delete user: {}", e)))?;

        Ok(rows > 0)
    }

    // ========================================================================
    // CONVERSATION OPERATIONS
    // ========================================================================

    /// Create a new conversation
    pub fn create_conversation(&self, id: &str, created_at: i64) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR IGNORE INTO conversations (id, created_at) VALUES (?, ?)",
            params![id, created_at],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to create conversation: {}", e)))?;

        Ok(())
    }

    /// Get a conversation by id
    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, created_at FROM conversations WHERE id = ?",
            params![id],
            |row| {
                Ok(ConversationRecord {
                    id: row.get(0)?,
                    created_at: row.get(1)?,
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get conversation: {}", e))),
        }
    }

    /// Add a participant to a conversation
    pub fn add_participant(&self, conversation_id: &str, user_id: i64, joined_at: i64) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR IGNORE INTO conversation_participants (conversation_id, user_id, joined_at)
             VALUES (?, ?, ?)",
            params![conversation_id, user_id, joined_at],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to add participant: {}", e)))?;

        Ok(())
    }

    /// Get the participant user ids of a conversation, in join order
    pub fn get_participants(&self, conversation_id: &str) -> Result<Vec<i64>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT user_id FROM conversation_participants
                 WHERE conversation_id = ? ORDER BY joined_at, user_id",
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![conversation_id], |row| row.get(0))
            .map_err(|e| Error::DatabaseError(format!("Failed to query participants: {}", e)))?;

        let mut participants = Vec::new();
        for row in rows {
            participants
                .push(row.map_err(|e| Error::DatabaseError(format!("Failed to read participant: {}", e)))?);
        }

        Ok(participants)
    }

    /// Check whether a user belongs to a conversation
    pub fn is_participant(&self, conversation_id: &str, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock();

        conn.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM conversation_participants
                 WHERE conversation_id = ? AND user_id = ?
             )",
            params![conversation_id, user_id],
            |row| row.get(0),
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to check participant: {}", e)))
    }

    // ========================================================================
    // MESSAGE OPERATIONS
    // ========================================================================

    /// Insert a new message, returning the assigned row id
    #[allow(clippy::too_many_arguments)]
    pub fn insert_message(
        &self,
        sender_id: i64,
        receiver_id: i64,
        conversation_id: Option<&str>,
        content: &str,
        timestamp: i64,
        parent_id: Option<i64>,
        thread_id: &str,
    ) -> Result<i64> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO messages (sender_id, receiver_id, conversation_id, content, timestamp, parent_id, thread_id)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![sender_id, receiver_id, conversation_id, content, timestamp, parent_id, thread_id],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert message: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a message by id
    pub fn get_message(&self, id: i64) -> Result<Option<MessageRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            &format!("SELECT {} FROM messages WHERE id = ?", MESSAGE_COLUMNS),
            params![id],
            message_from_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get message: {}", e))),
        }
    }

    /// Replace a message's content and flag it as edited
    pub fn update_message_content(&self, id: i64, content: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE messages SET content = ?, edited = 1 WHERE id = ?",
                params![content, id],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to update message: {}", e)))?;

        Ok(rows > 0)
    }

    /// Get every message in a thread, oldest first
    ///
    /// Identical timestamps tie-break by primary key ascending, so the
    /// ordering is stable under same-millisecond inserts.
    pub fn thread_messages(&self, thread_id: &str) -> Result<Vec<MessageRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM messages WHERE thread_id = ? ORDER BY timestamp, id",
                MESSAGE_COLUMNS
            ))
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![thread_id], message_from_row)
            .map_err(|e| Error::DatabaseError(format!("Failed to query thread: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row.map_err(|e| Error::DatabaseError(format!("Failed to read message: {}", e)))?);
        }

        Ok(messages)
    }

    /// Check whether a user is involved in a thread
    ///
    /// Involved means sender or receiver of any message in the thread,
    /// or a participant of a conversation the thread belongs to.
    pub fn thread_involves(&self, thread_id: &str, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock();

        conn.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM messages m
                 LEFT JOIN conversation_participants cp
                     ON cp.conversation_id = m.conversation_id AND cp.user_id = ?2
                 WHERE m.thread_id = ?1
                   AND (m.sender_id = ?2 OR m.receiver_id = ?2 OR cp.user_id IS NOT NULL)
             )",
            params![thread_id, user_id],
            |row| row.get(0),
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to check thread access: {}", e)))
    }

    /// Get the direct replies to a message, oldest first
    pub fn replies(&self, parent_id: i64) -> Result<Vec<MessageRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM messages WHERE parent_id = ? ORDER BY timestamp, id",
                MESSAGE_COLUMNS
            ))
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![parent_id], message_from_row)
            .map_err(|e| Error::DatabaseError(format!("Failed to query replies: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row.map_err(|e| Error::DatabaseError(format!("Failed to read message: {}", e)))?);
        }

        Ok(messages)
    }

    /// Count the direct replies to a message
    pub fn reply_count(&self, parent_id: i64) -> Result<i64> {
        let conn = self.conn.lock();

        conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE parent_id = ?",
            params![parent_id],
            |row| row.get(0),
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to count replies: {}", e)))
    }

    /// Get the most recent direct reply to a message
    pub fn last_reply(&self, parent_id: i64) -> Result<Option<MessageRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            &format!(
                "SELECT {} FROM messages WHERE parent_id = ? ORDER BY timestamp DESC, id DESC LIMIT 1",
                MESSAGE_COLUMNS
            ),
            params![parent_id],
            message_from_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get last reply: {}", e))),
        }
    }

    /// Get the thread-root messages a user is involved in, newest first
    pub fn root_messages_for(&self, user_id: i64) -> Result<Vec<MessageRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM messages
                 WHERE parent_id IS NULL
                   AND (sender_id = ?1 OR receiver_id = ?1
                        OR EXISTS(SELECT 1 FROM conversation_participants cp
                                  WHERE cp.conversation_id = messages.conversation_id
                                    AND cp.user_id = ?1))
                 ORDER BY timestamp DESC, id DESC",
                MESSAGE_COLUMNS
            ))
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![user_id], message_from_row)
            .map_err(|e| Error::DatabaseError(format!("Failed to query threads: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row.map_err(|e| Error::DatabaseError(format!("Failed to read message: {}", e)))?);
        }

        Ok(messages)
    }

    // ========================================================================
    // UNREAD INDEX OPERATIONS
    // ========================================================================

    /// Get the unread messages addressed to a user, newest first
    ///
    /// Loads only the fields a list display needs instead of the full
    /// message row.
    pub fn unread_messages_for(&self, receiver_id: i64) -> Result<Vec<UnreadMessageRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT m.id, m.sender_id, u.username, m.content, m.timestamp, m.read
                 FROM messages m
                 JOIN users u ON u.id = m.sender_id
                 WHERE m.receiver_id = ? AND m.read = 0
                 ORDER BY m.timestamp DESC, m.id DESC",
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![receiver_id], |row| {
                Ok(UnreadMessageRecord {
                    id: row.get(0)?,
                    sender_id: row.get(1)?,
                    sender_username: row.get(2)?,
                    content: row.get(3)?,
                    timestamp: row.get(4)?,
                    read: row.get(5)?,
                })
            })
            .map_err(|e| Error::DatabaseError(format!("Failed to query unread messages: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row.map_err(|e| Error::DatabaseError(format!("Failed to read message: {}", e)))?);
        }

        Ok(messages)
    }

    /// Mark messages addressed to a user as read
    ///
    /// With `message_ids`, only those messages are touched; without,
    /// everything unread for the user is marked. Returns the number of
    /// rows affected, so a repeat call reports zero.
    pub fn mark_messages_read(&self, receiver_id: i64, message_ids: Option<&[i64]>) -> Result<usize> {
        let conn = self.conn.lock();

        let rows = match message_ids {
            None => conn
                .execute(
                    "UPDATE messages SET read = 1 WHERE receiver_id = ? AND read = 0",
                    params![receiver_id],
                )
                .map_err(|e| Error::DatabaseError(format!("Failed to mark messages read: {}", e)))?,
            Some([]) => 0,
            Some(ids) => {
                let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
                let sql = format!(
                    "UPDATE messages SET read = 1 WHERE receiver_id = ? AND read = 0 AND id IN ({})",
                    placeholders
                );

                let mut values: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(ids.len() + 1);
                values.push(&receiver_id);
                for id in ids {
                    values.push(id);
                }

                conn.execute(&sql, values.as_slice())
                    .map_err(|e| Error::DatabaseError(format!("Failed to mark messages read: {}", e)))?
            }
        };

        Ok(rows)
    }

    /// Mark every unread message in a thread addressed to a user as read
    pub fn mark_thread_read(&self, receiver_id: i64, thread_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE messages SET read = 1 WHERE receiver_id = ? AND thread_id = ? AND read = 0",
                params![receiver_id, thread_id],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to mark thread read: {}", e)))?;

        Ok(rows)
    }

    /// Count the unread messages addressed to a user
    pub fn unread_count(&self, receiver_id: i64) -> Result<i64> {
        let conn = self.conn.lock();

        conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = ? AND read = 0",
            params![receiver_id],
            |row| row.get(0),
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to count unread: {}", e)))
    }

    // ========================================================================
    // MESSAGE HISTORY OPERATIONS
    // ========================================================================

    /// Insert an edit-history snapshot, returning the assigned row id
    pub fn insert_history(
        &self,
        message_id: i64,
        old_content: &str,
        edited_at: i64,
        edited_by: Option<i64>,
    ) -> Result<i64> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO message_history (message_id, old_content, edited_at, edited_by)
             VALUES (?, ?, ?, ?)",
            params![message_id, old_content, edited_at, edited_by],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert history: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    /// Get the edit history of a message, most recent edit first
    pub fn history_for_message(&self, message_id: i64) -> Result<Vec<MessageHistoryRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, message_id, old_content, edited_at, edited_by
                 FROM message_history WHERE message_id = ?
                 ORDER BY edited_at DESC, id DESC",
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![message_id], |row| {
                Ok(MessageHistoryRecord {
                    id: row.get(0)?,
                    message_id: row.get(1)?,
                    old_content: row.get(2)?,
                    edited_at: row.get(3)?,
                    edited_by: row.get(4)?,
                })
            })
            .map_err(|e| Error::DatabaseError(format!("Failed to query history: {}", e)))?;

        let mut history = Vec::new();
        for row in rows {
            history.push(row.map_err(|e| Error::DatabaseError(format!("Failed to read history: {}", e)))?);
        }

        Ok(history)
    }

    // ========================================================================
    // NOTIFICATION OPERATIONS
    // ========================================================================

    /// Insert a notification, returning the assigned row id
    pub fn insert_notification(&self, user_id: i64, message_id: i64, created_at: i64) -> Result<i64> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO notifications (user_id, message_id, created_at) VALUES (?, ?, ?)",
            params![user_id, message_id, created_at],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert notification: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a notification by id
    pub fn get_notification(&self, id: i64) -> Result<Option<NotificationRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, user_id, message_id, created_at, read FROM notifications WHERE id = ?",
            params![id],
            |row| {
                Ok(NotificationRecord {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    message_id: row.get(2)?,
                    created_at: row.get(3)?,
                    read: row.get(4)?,
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get notification: {}", e))),
        }
    }

    /// Get a user's notifications, newest first
    pub fn notifications_for(&self, user_id: i64) -> Result<Vec<NotificationRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, message_id, created_at, read
                 FROM notifications WHERE user_id = ?
                 ORDER BY created_at DESC, id DESC",
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(NotificationRecord {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    message_id: row.get(2)?,
                    created_at: row.get(3)?,
                    read: row.get(4)?,
                })
            })
            .map_err(|e| Error::DatabaseError(format!("Failed to query notifications: {}", e)))?;

        let mut notifications = Vec::new();
        for row in rows {
            notifications
                .push(row.map_err(|e| Error::DatabaseError(format!("Failed to read notification: {}", e)))?);
        }

        Ok(notifications)
    }

    /// Mark a single notification as read
    pub fn mark_notification_read(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE notifications SET read = 1 WHERE id = ? AND read = 0",
                params![id],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to mark notification read: {}", e)))?;

        Ok(rows > 0)
    }

    /// Count a user's unread notifications
    pub fn unread_notification_count(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn.lock();

        conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read = 0",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to count notifications: {}", e)))
    }

    // ========================================================================
    // CLEANUP OPERATIONS
    // ========================================================================

    /// Delete the history rows of every message a user sent or received
    pub fn delete_history_involving(&self, user_id: i64) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "DELETE FROM message_history WHERE message_id IN
                     (SELECT id FROM messages WHERE sender_id = ?1 OR receiver_id = ?1)",
                params![user_id],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to delete history: {}", e)))?;

        Ok(rows)
    }

    /// Delete every notification addressed to a user
    pub fn delete_notifications_for(&self, user_id: i64) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM notifications WHERE user_id = ?", params![user_id])
            .map_err(|e| Error::DatabaseError(format!("Failed to delete notifications: {}", e)))?;

        Ok(rows)
    }

    /// Delete every message a user sent
    pub fn delete_messages_sent_by(&self, user_id: i64) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM messages WHERE sender_id = ?", params![user_id])
            .map_err(|e| Error::DatabaseError(format!("Failed to delete sent messages: {}", e)))?;

        Ok(rows)
    }

    /// Delete every message a user received
    pub fn delete_messages_received_by(&self, user_id: i64) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM messages WHERE receiver_id = ?", params![user_id])
            .map_err(|e| Error::DatabaseError(format!("Failed to delete received messages: {}", e)))?;

        Ok(rows)
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

/// Column list shared by every full-row message query
const MESSAGE_COLUMNS: &str =
    "id, sender_id, receiver_id, conversation_id, content, timestamp, edited, read, parent_id, thread_id";

/// Map a full message row (selected via [`MESSAGE_COLUMNS`]) to a record
fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    Ok(MessageRecord {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        conversation_id: row.get(3)?,
        content: row.get(4)?,
        timestamp: row.get(5)?,
        edited: row.get(6)?,
        read: row.get(7)?,
        parent_id: row.get(8)?,
        thread_id: row.get(9)?,
    })
}

// ============================================================================
// RECORD TYPES
// ============================================================================

/// A user row
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Row id
    pub id: i64,
    /// Unique handle
    pub username: String,
    /// Display name
    pub display_name: String,
    /// Creation timestamp (Unix seconds)
    pub created_at: i64,
}

/// A conversation row
#[derive(Debug, Clone)]
pub struct ConversationRecord {
    /// Conversation id (uuid)
    pub id: String,
    /// Creation timestamp (Unix seconds)
    pub created_at: i64,
}

/// A full message row
#[derive(Debug, Clone)]
pub struct MessageRecord {
    /// Row id (insertion order)
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

/// The narrow projection served by the unread index
///
/// Carries only what a list display needs.
#[derive(Debug, Clone)]
pub struct UnreadMessageRecord {
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
    /// Read flag (always false for rows served by the unread index)
    pub read: bool,
}

/// A message-history row
#[derive(Debug, Clone)]
pub struct MessageHistoryRecord {
    /// Row id
    pub id: i64,
    /// The message this snapshot belongs to
    pub message_id: i64,
    /// Content before the edit
    pub old_content: String,
    /// Edit timestamp (Unix ms)
    pub edited_at: i64,
    /// Editing user, when known
    pub edited_by: Option<i64>,
}

/// A notification row
#[derive(Debug, Clone)]
pub struct NotificationRecord {
    /// Row id
    pub id: i64,
    /// Recipient user id
    pub user_id: i64,
    /// The message that triggered the notification
    pub message_id: i64,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Whether the recipient has seen it
    pub read: bool,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_users(db: &Database) -> (i64, i64) {
        let alice = db.create_user("alice", "Alice", 1000).unwrap();
        let bob = db.create_user("bob", "Bob", 1001).unwrap();
        (alice, bob)
    }

    #[test]
    fn test_database_creation() {
        let db = Database::open(None).unwrap();
        assert!(db.get_user(1).unwrap().is_none());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::open(Some(path)).unwrap();
            db.create_user("alice", "Alice", 1000).unwrap();
        }

        // Reopen and verify the row survived
        let db = Database::open(Some(path)).unwrap();
        let user = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.display_name, "Alice");
    }

    #[test]
    fn test_user_operations() {
        let db = Database::open(None).unwrap();

        let id = db.create_user("alice", "Alice", 1000).unwrap();
        assert!(id > 0);

        let user = db.get_user(id).unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.display_name, "Alice");

        let user = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.id, id);

        // Duplicate usernames are rejected by the unique constraint
        assert!(db.create_user("alice", "Alice Two", 1001).is_err());

        let removed = db.delete_user_row(id).unwrap();
        assert!(removed);
        assert!(db.get_user(id).unwrap().is_none());
    }

    #[test]
    fn test_conversation_operations() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);

        db.create_conversation("conv-1", 1000).unwrap();
        assert!(db.get_conversation("conv-1").unwrap().is_some());
        assert!(db.get_conversation("conv-2").unwrap().is_none());

        db.add_participant("conv-1", alice, 1000).unwrap();
        db.add_participant("conv-1", bob, 1001).unwrap();
        // Re-adding is a no-op
        db.add_participant("conv-1", bob, 1002).unwrap();

        assert_eq!(db.get_participants("conv-1").unwrap(), vec![alice, bob]);
        assert!(db.is_participant("conv-1", alice).unwrap());
        assert!(!db.is_participant("conv-1", 999).unwrap());
    }

    #[test]
    fn test_message_insert_and_get() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);

        let id = db
            .insert_message(alice, bob, None, "Hello", 1000, None, "t1")
            .unwrap();

        let msg = db.get_message(id).unwrap().unwrap();
        assert_eq!(msg.sender_id, alice);
        assert_eq!(msg.receiver_id, bob);
        assert_eq!(msg.content, "Hello");
        assert_eq!(msg.thread_id, "t1");
        assert!(msg.parent_id.is_none());
        assert!(!msg.edited);
        assert!(!msg.read);

        assert!(db.get_message(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_thread_ordering_ties_break_by_id() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);

        // Same timestamp on purpose
        let m1 = db.insert_message(alice, bob, None, "first", 1000, None, "t1").unwrap();
        let m2 = db.insert_message(bob, alice, None, "second", 1000, Some(m1), "t1").unwrap();
        let m3 = db.insert_message(alice, bob, None, "third", 1000, Some(m2), "t1").unwrap();

        let thread = db.thread_messages("t1").unwrap();
        let ids: Vec<i64> = thread.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![m1, m2, m3]);
    }

    #[test]
    fn test_thread_involves() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);
        let carol = db.create_user("carol", "Carol", 1002).unwrap();

        let m1 = db.insert_message(alice, bob, None, "Hello", 1000, None, "t1").unwrap();
        db.insert_message(bob, alice, None, "Hi", 1001, Some(m1), "t1").unwrap();

        assert!(db.thread_involves("t1", alice).unwrap());
        assert!(db.thread_involves("t1", bob).unwrap());
        assert!(!db.thread_involves("t1", carol).unwrap());

        // Conversation participants count as involved even without
        // having sent or received anything yet
        db.create_conversation("conv-1", 1000).unwrap();
        db.add_participant("conv-1", alice, 1000).unwrap();
        db.add_participant("conv-1", carol, 1000).unwrap();
        db.insert_message(alice, carol, Some("conv-1"), "Group hello", 1002, None, "t2")
            .unwrap();

        assert!(db.thread_involves("t2", carol).unwrap());
        assert!(!db.thread_involves("t2", bob).unwrap());
    }

    #[test]
    fn test_replies_and_last_reply() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);

        let root = db.insert_message(alice, bob, None, "root", 1000, None, "t1").unwrap();
        let r1 = db.insert_message(bob, alice, None, "r1", 2000, Some(root), "t1").unwrap();
        let r2 = db.insert_message(alice, bob, None, "r2", 3000, Some(root), "t1").unwrap();
        // A nested reply is not a direct reply to root
        db.insert_message(bob, alice, None, "nested", 4000, Some(r1), "t1").unwrap();

        let direct = db.replies(root).unwrap();
        assert_eq!(direct.len(), 2);
        assert_eq!(direct[0].id, r1);
        assert_eq!(direct[1].id, r2);

        assert_eq!(db.reply_count(root).unwrap(), 2);
        assert_eq!(db.last_reply(root).unwrap().unwrap().id, r2);
        assert!(db.last_reply(r2).unwrap().is_none());
    }

    #[test]
    fn test_root_messages_for() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);
        let carol = db.create_user("carol", "Carol", 1002).unwrap();

        let t1 = db.insert_message(alice, bob, None, "thread one", 1000, None, "t1").unwrap();
        let t2 = db.insert_message(bob, alice, None, "thread two", 2000, None, "t2").unwrap();
        // Replies never show up in the roots listing
        db.insert_message(bob, alice, None, "reply", 3000, Some(t1), "t1").unwrap();
        // Carol's unrelated thread
        db.insert_message(carol, carol, None, "note to self", 4000, None, "t3").unwrap();

        let roots = db.root_messages_for(alice).unwrap();
        let ids: Vec<i64> = roots.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![t2, t1]); // newest first

        assert_eq!(db.root_messages_for(carol).unwrap().len(), 1);
    }

    #[test]
    fn test_unread_queries() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);

        db.insert_message(bob, alice, None, "one", 1000, None, "t1").unwrap();
        db.insert_message(bob, alice, None, "two", 2000, None, "t2").unwrap();
        let m3 = db.insert_message(bob, alice, None, "three", 3000, None, "t3").unwrap();
        // Alice's own sent message never counts against her
        db.insert_message(alice, bob, None, "out", 4000, None, "t4").unwrap();

        assert_eq!(db.unread_count(alice).unwrap(), 3);

        let unread = db.unread_messages_for(alice).unwrap();
        assert_eq!(unread.len(), 3);
        assert_eq!(unread[0].id, m3); // newest first
        assert_eq!(unread[0].sender_username, "bob");
        assert!(!unread[0].read);

        // Partial mark by explicit ids
        let affected = db.mark_messages_read(alice, Some(&[m3])).unwrap();
        assert_eq!(affected, 1);
        assert_eq!(db.unread_count(alice).unwrap(), 2);

        // Mark everything, then verify idempotency
        let affected = db.mark_messages_read(alice, None).unwrap();
        assert_eq!(affected, 2);
        assert_eq!(db.unread_count(alice).unwrap(), 0);

        let affected = db.mark_messages_read(alice, None).unwrap();
        assert_eq!(affected, 0);
        assert_eq!(db.unread_count(alice).unwrap(), 0);

        // Empty id list is a no-op
        assert_eq!(db.mark_messages_read(alice, Some(&[])).unwrap(), 0);
    }

    #[test]
    fn test_mark_messages_read_ignores_other_users() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);

        let to_bob = db.insert_message(alice, bob, None, "for bob", 1000, None, "t1").unwrap();

        // Alice cannot mark a message addressed to Bob
        let affected = db.mark_messages_read(alice, Some(&[to_bob])).unwrap();
        assert_eq!(affected, 0);
        assert_eq!(db.unread_count(bob).unwrap(), 1);
    }

    #[test]
    fn test_mark_thread_read() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);

        let root = db.insert_message(bob, alice, None, "root", 1000, None, "t1").unwrap();
        db.insert_message(bob, alice, None, "more", 2000, Some(root), "t1").unwrap();
        db.insert_message(bob, alice, None, "other thread", 3000, None, "t2").unwrap();

        let affected = db.mark_thread_read(alice, "t1").unwrap();
        assert_eq!(affected, 2);
        assert_eq!(db.unread_count(alice).unwrap(), 1);
    }

    #[test]
    fn test_history_operations() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);

        let id = db.insert_message(alice, bob, None, "v3", 1000, None, "t1").unwrap();
        db.insert_history(id, "v1", 2000, Some(alice)).unwrap();
        db.insert_history(id, "v2", 3000, Some(alice)).unwrap();

        let history = db.history_for_message(id).unwrap();
        assert_eq!(history.len(), 2);
        // Most recent edit first
        assert_eq!(history[0].old_content, "v2");
        assert_eq!(history[1].old_content, "v1");
        assert_eq!(history[0].edited_by, Some(alice));
    }

    #[test]
    fn test_notification_operations() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);

        let m1 = db.insert_message(bob, alice, None, "one", 1000, None, "t1").unwrap();
        let m2 = db.insert_message(bob, alice, None, "two", 2000, None, "t2").unwrap();

        db.insert_notification(alice, m1, 1000).unwrap();
        let n2 = db.insert_notification(alice, m2, 2000).unwrap();

        let notifications = db.notifications_for(alice).unwrap();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].id, n2); // newest first
        assert_eq!(db.unread_notification_count(alice).unwrap(), 2);

        assert!(db.mark_notification_read(n2).unwrap());
        // Second attempt reports no change
        assert!(!db.mark_notification_read(n2).unwrap());
        assert_eq!(db.unread_notification_count(alice).unwrap(), 1);

        assert!(db.notifications_for(bob).unwrap().is_empty());
    }

    #[test]
    fn test_fk_cascade_from_message() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);

        let root = db.insert_message(alice, bob, None, "root", 1000, None, "t1").unwrap();
        let reply = db.insert_message(bob, alice, None, "reply", 2000, Some(root), "t1").unwrap();
        db.insert_history(root, "draft", 1500, Some(alice)).unwrap();
        db.insert_notification(bob, root, 1000).unwrap();

        // Deleting the sender cascades to the message, its reply chain,
        // its history, and its notifications
        db.delete_user_row(alice).unwrap();

        assert!(db.get_message(root).unwrap().is_none());
        assert!(db.get_message(reply).unwrap().is_none());
        assert!(db.history_for_message(root).unwrap().is_empty());
        assert!(db.notifications_for(bob).unwrap().is_empty());
    }

    #[test]
    fn test_cleanup_deletes() {
        let db = Database::open(None).unwrap();
        let (alice, bob) = seed_users(&db);
        let carol = db.create_user("carol", "Carol", 1002).unwrap();

        let sent = db.insert_message(alice, bob, None, "sent", 1000, None, "t1").unwrap();
        db.insert_message(bob, alice, None, "received", 2000, None, "t2").unwrap();
        let unrelated = db.insert_message(bob, carol, None, "unrelated", 3000, None, "t3").unwrap();

        db.insert_history(sent, "old", 1500, Some(alice)).unwrap();
        db.insert_history(unrelated, "old", 3500, Some(bob)).unwrap();
        db.insert_notification(alice, sent, 1000).unwrap();
        db.insert_notification(carol, unrelated, 3000).unwrap();

        assert_eq!(db.delete_history_involving(alice).unwrap(), 1);
        assert_eq!(db.delete_notifications_for(alice).unwrap(), 1);
        assert_eq!(db.delete_messages_sent_by(alice).unwrap(), 1);
        assert_eq!(db.delete_messages_received_by(alice).unwrap(), 1);

        // Carol's data is untouched
        assert!(db.get_message(unrelated).unwrap().is_some());
        assert_eq!(db.history_for_message(unrelated).unwrap().len(), 1);
        assert_eq!(db.notifications_for(carol).unwrap().len(), 1);
    }

    #[test]
    fn test_reset() {
        let db = Database::open(None).unwrap();
        let (alice, _) = seed_users(&db);
        assert!(db.get_user(alice).unwrap().is_some());

        db.reset().unwrap();
        assert!(db.get_user(alice).unwrap().is_none());
    }
}
