//! # Quill Core
//!
//! A threaded-messaging data layer: relational persistence, an
//! unread-message index, a thread composer, and synchronous
//! change-tracking hooks for notification fan-out, edit history, and
//! cascading user cleanup.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         QUILL CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │    Users    │  │  Messages   │  │Notifications│  │    Hooks     │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - Create    │  │ - Create    │  │ - List      │  │ - Fan-out    │   │
//! │  │ - Delete    │  │ - Reply     │  │ - Mark read │  │ - History    │   │
//! │  │   (cascade) │  │ - Edit      │  │ - Count     │  │ - Cleanup    │   │
//! │  │             │  │ - Unread    │  │             │  │              │   │
//! │  │             │  │ - Threads   │  │             │  │              │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴───────┬────────┴────────────────┘           │
//! │                                  │                                     │
//! │  ┌─────────────┐  ┌──────────────┴──────────────────────────────────┐  │
//! │  │    Cache    │  │                 Storage                         │  │
//! │  │             │  │                                                 │  │
//! │  │ - (user,    │◄─│  SQLite: users, conversations, participants,    │  │
//! │  │   thread)   │  │  messages, message_history, notifications      │  │
//! │  │ - fixed TTL │  │  (FK cascades, versioned migrations)           │  │
//! │  └─────────────┘  └─────────────────────────────────────────────────┘  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`storage`] - SQLite persistence (schema, migrations, queries)
//! - [`users`] - Identity rows and account lifecycle
//! - [`messages`] - Message creation/edit, unread index, thread composer
//! - [`notifications`] - Read-side notification access
//! - [`hooks`] - Explicit synchronous hooks dispatched by the write path
//! - [`cache`] - Short-lived (user, thread) response cache
//!
//! ## Wiring
//!
//! Services share one database handle and one hook registry:
//!
//! ```ignore
//! use std::sync::Arc;
//! use quill_core::{Database, HookRegistry, MessageService, UserService};
//!
//! let db = Arc::new(Database::open(Some("quill.db"))?);
//! let hooks = Arc::new(HookRegistry::with_defaults());
//!
//! let users = UserService::new(db.clone(), hooks.clone());
//! let messages = MessageService::new(db, hooks);
//!
//! let alice = users.create_user("alice", "Alice")?;
//! let bob = users.create_user("bob", "Bob")?;
//! let hello = messages.send_message(alice.id, bob.id, "Hello")?;
//! let thread = messages.thread_messages(bob.id, &hello.thread_id)?;
//! ```
//!
//! ## Consistency Model
//!
//! Every operation is synchronous and completes before the caller
//! proceeds. Notification fan-out is best-effort (the message persists
//! even if an insert fails); history snapshots are not (a failed
//! snapshot aborts the edit). The cached thread read path trades
//! freshness for latency: entries expire on a fixed TTL, never on
//! write, so reads can lag edits by up to one TTL.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod cache;
pub mod error;
pub mod hooks;
pub mod messages;
pub mod notifications;
pub mod storage;
/// Time utilities shared by the write paths.
pub mod time;
pub mod users;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use cache::ThreadCache;
pub use error::{Error, Result};
pub use hooks::{HookRegistry, MessageHook};
pub use messages::{Message, MessageService, ThreadNode, UnreadMessage};
pub use notifications::{Notification, NotificationService};
pub use storage::Database;
pub use users::{User, UserService};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Quill Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================
