//! # Database Schema
//!
//! SQL schema definitions for the Quill database.
//!
//! ## Schema Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DATABASE SCHEMA                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐      ┌─────────────────┐     ┌─────────────────┐  │
//! │  │     users       │      │    messages     │     │ message_history │  │
//! │  ├─────────────────┤      ├─────────────────┤     ├─────────────────┤  │
//! │  │ id              │◄─────│ sender_id       │  ┌──│ message_id      │  │
//! │  │ username        │◄─────│ receiver_id     │◄─┘  │ old_content     │  │
//! │  │ display_name    │      │ conversation_id │     │ edited_at       │  │
//! │  │ created_at      │      │ content         │     │ edited_by       │  │
//! │  └─────────────────┘      │ timestamp       │     └─────────────────┘  │
//! │                           │ edited          │                          │
//! │  ┌─────────────────┐      │ read            │     ┌─────────────────┐  │
//! │  │  conversations  │      │ parent_id ──────│─┐   │  notifications  │  │
//! │  ├─────────────────┤      │ thread_id       │ │   ├─────────────────┤  │
//! │  │ id              │◄─────└─────────────────┘ │   │ user_id         │  │
//! │  │ created_at      │               ▲──────────┘   │ message_id      │  │
//! │  └─────────────────┘                              │ created_at      │  │
//! │          ▲                                        │ read            │  │
//! │  ┌───────┴──────────────┐                         └─────────────────┘  │
//! │  │ conversation_        │                                              │
//! │  │ participants         │                                              │
//! │  └──────────────────────┘                                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All child rows hang off `messages` or `users` with `ON DELETE CASCADE`,
//! so the cascading-deletion policy holds even when the best-effort
//! cleanup pass misses rows.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL to create all tables
pub const CREATE_TABLES: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Users table
-- Identity only; authentication lives outside this crate
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    -- Unique login/display handle
    username TEXT NOT NULL UNIQUE,
    -- Human-readable name shown in listings
    display_name TEXT NOT NULL,
    -- When this user was created (Unix seconds)
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);

-- Conversations table
-- Groups a participant set; pairwise messages may skip this entirely
CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    -- When the conversation was created (Unix seconds)
    created_at INTEGER NOT NULL
);

-- Conversation participants table
-- Membership drives group notification fan-out and access checks
CREATE TABLE IF NOT EXISTS conversation_participants (
    conversation_id TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    joined_at INTEGER NOT NULL,
    PRIMARY KEY (conversation_id, user_id),
    FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_participants_user ON conversation_participants(user_id);

-- Messages table
-- The root entity: self-referential replies share a thread_id
CREATE TABLE IF NOT EXISTS messages (
    -- Integer primary key doubles as the insertion-order tie-break
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sender_id INTEGER NOT NULL,
    receiver_id INTEGER NOT NULL,
    -- NULL for plain pairwise exchanges
    conversation_id TEXT,
    content TEXT NOT NULL,
    -- When the message was sent (Unix timestamp ms)
    timestamp INTEGER NOT NULL,
    -- Orthogonal state flags
    edited INTEGER NOT NULL DEFAULT 0,
    read INTEGER NOT NULL DEFAULT 0,
    -- Threading: NULL parent marks a thread root
    parent_id INTEGER,
    -- Root messages get a fresh uuid; replies inherit the parent's
    thread_id TEXT NOT NULL,
    FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (receiver_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE,
    FOREIGN KEY (parent_id) REFERENCES messages(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_messages_thread ON messages(thread_id, timestamp, id);
CREATE INDEX IF NOT EXISTS idx_messages_parent ON messages(parent_id);
CREATE INDEX IF NOT EXISTS idx_messages_receiver_unread ON messages(receiver_id, timestamp DESC) WHERE read = 0;
CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id);

-- Message history table
-- One immutable snapshot per content-changing edit
CREATE TABLE IF NOT EXISTS message_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id INTEGER NOT NULL,
    -- Content as it was before the edit
    old_content TEXT NOT NULL,
    -- When the edit happened (Unix timestamp ms)
    edited_at INTEGER NOT NULL,
    -- Who made the edit, when known
    edited_by INTEGER,
    FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE,
    FOREIGN KEY (edited_by) REFERENCES users(id) ON DELETE SET NULL
);
CREATE INDEX IF NOT EXISTS idx_history_message ON message_history(message_id, edited_at DESC);

-- Notifications table
-- One row per non-sender participant per message creation
CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    message_id INTEGER NOT NULL,
    -- When the notification was created (Unix timestamp ms)
    created_at INTEGER NOT NULL,
    read INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at DESC);
"#;

/// Migration SQL from schema version 1 → 2
///
/// Adds conversations and participant membership so group exchanges can
/// fan notifications out to a full participant set, and links messages
/// to their conversation.
pub const MIGRATE_V1_TO_V2: &str = r#"
CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS conversation_participants (
    conversation_id TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    joined_at INTEGER NOT NULL,
    PRIMARY KEY (conversation_id, user_id),
    FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_participants_user ON conversation_participants(user_id);

ALTER TABLE messages ADD COLUMN conversation_id TEXT REFERENCES conversations(id) ON DELETE CASCADE;

-- Update schema version
UPDATE schema_version SET version = 2;
"#;

/// SQL to drop all tables (for testing/reset)
pub const DROP_TABLES: &str = r#"
DROP TABLE IF EXISTS notifications;
DROP TABLE IF EXISTS message_history;
DROP TABLE IF EXISTS messages;
DROP TABLE IF EXISTS conversation_participants;
DROP TABLE IF EXISTS conversations;
DROP TABLE IF EXISTS users;
DROP TABLE IF EXISTS schema_version;
"#;
