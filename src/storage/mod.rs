//! # Storage Module
//!
//! SQLite persistence for the messaging data layer.
//!
//! ## Storage Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         STORAGE SYSTEM                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite Database                                                │   │
//! │  │  ───────────────                                                 │   │
//! │  │                                                                 │   │
//! │  │  Tables:                                                       │   │
//! │  │  • users                    - Identity rows                    │   │
//! │  │  • conversations            - Group exchanges                  │   │
//! │  │  • conversation_participants- Membership (drives fan-out)      │   │
//! │  │  • messages                 - The root entity; threaded via    │   │
//! │  │                               parent_id + thread_id            │   │
//! │  │  • message_history          - Pre-edit content snapshots       │   │
//! │  │  • notifications            - One per non-sender participant   │   │
//! │  │                                                                 │   │
//! │  │  Integrity: PRAGMA foreign_keys = ON; child rows cascade       │   │
//! │  │  with their message or user.                                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod database;
mod schema;

pub use database::{
    ConversationRecord, Database, MessageHistoryRecord, MessageRecord, NotificationRecord,
    UnreadMessageRecord, UserRecord,
};
pub use schema::SCHEMA_VERSION;
