//! # Thread Composer
//!
//! Flat and nested retrieval of a thread's messages, reply counts, and
//! per-user thread listings.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::messages::Message;

/// A message with its nested replies
///
/// Replies are ordered ascending by timestamp, tie-broken by id, at
/// every level — the nested form flattens back to exactly the flat
/// form's order.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadNode {
    /// The message at this node
    pub message: Message,
    /// Direct replies, each with its own subtree
    pub replies: Vec<ThreadNode>,
}

impl ThreadNode {
    /// Total number of messages in this subtree, the node included
    ///
    /// `subtree_len() - 1` on a root is the full-depth reply count;
    /// [`MessageService::reply_count`](super::MessageService::reply_count)
    /// counts direct replies only.
    pub fn subtree_len(&self) -> usize {
        1 + self.replies.iter().map(ThreadNode::subtree_len).sum::<usize>()
    }
}

impl super::MessageService {
    // ── Thread retrieval ────────────────────────────────────────────────

    /// Get every message in a thread, oldest first (flat form)
    ///
    /// Requires the requesting user to be involved in the thread —
    /// sender or receiver of one of its messages, or a participant of
    /// its conversation.
    pub fn thread_messages(&self, user_id: i64, thread_id: &str) -> Result<Vec<Message>> {
        let records = self.db().thread_messages(thread_id)?;
        if records.is_empty() {
            return Err(Error::ThreadNotFound(thread_id.to_string()));
        }
        if !self.db().thread_involves(thread_id, user_id)? {
            return Err(Error::NotParticipant(user_id));
        }

        Ok(records.into_iter().map(Message::from).collect())
    }

    /// Get a thread through the short-lived response cache
    ///
    /// Cache entries are keyed by (user, thread) and expire on a fixed
    /// TTL rather than on write, so a reader can observe thread content
    /// up to one TTL stale after an edit.
    pub fn thread_messages_cached(&self, user_id: i64, thread_id: &str) -> Result<Vec<Message>> {
        if let Some(messages) = self.thread_cache().get(user_id, thread_id) {
            return Ok(messages);
        }

        let messages = self.thread_messages(user_id, thread_id)?;
        self.thread_cache().insert(user_id, thread_id, messages.clone());
        Ok(messages)
    }

    /// Get a thread as a tree rooted at its first message (nested form)
    ///
    /// Produces the same ordering as the flat form: children sort
    /// ascending by timestamp, tie-broken by id, at every level.
    pub fn thread_tree(&self, user_id: i64, thread_id: &str) -> Result<ThreadNode> {
        let messages = self.thread_messages(user_id, thread_id)?;
        build_tree(messages).ok_or_else(|| Error::ThreadNotFound(thread_id.to_string()))
    }

    /// Get the thread-root messages a user is involved in, newest first
    pub fn threads_for_user(&self, user_id: i64) -> Result<Vec<Message>> {
        self.db()
            .get_user(user_id)?
            .ok_or(Error::UserNotFound(user_id))?;

        Ok(self
            .db()
            .root_messages_for(user_id)?
            .into_iter()
            .map(Message::from)
            .collect())
    }

    // ── Reply queries ───────────────────────────────────────────────────

    /// Count the direct replies to a message
    ///
    /// Direct replies only — the full-depth count is available through
    /// [`ThreadNode::subtree_len`] on the nested form.
    pub fn reply_count(&self, message_id: i64) -> Result<i64> {
        self.db()
            .get_message(message_id)?
            .ok_or(Error::MessageNotFound(message_id))?;
        self.db().reply_count(message_id)
    }

    /// Get the most recent direct reply to a message
    pub fn last_reply(&self, message_id: i64) -> Result<Option<Message>> {
        self.db()
            .get_message(message_id)?
            .ok_or(Error::MessageNotFound(message_id))?;

        Ok(self.db().last_reply(message_id)?.map(Message::from))
    }
}

/// Reconstruct parent/child links from a flat, ordered message list
///
/// Builds an id→children index in one pass and assembles the tree from
/// the root. Input order is preserved within each child list, so the
/// tree inherits the flat form's (timestamp, id) ordering.
fn build_tree(messages: Vec<Message>) -> Option<ThreadNode> {
    let mut root = None;
    let mut children: HashMap<i64, Vec<Message>> = HashMap::new();

    for message in messages {
        match message.parent_id {
            None => root = root.or(Some(message)),
            Some(parent_id) => children.entry(parent_id).or_default().push(message),
        }
    }

    root.map(|message| attach(message, &mut children))
}

fn attach(message: Message, children: &mut HashMap<i64, Vec<Message>>) -> ThreadNode {
    let replies = children
        .remove(&message.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach(child, children))
        .collect();

    ThreadNode { message, replies }
}

// ============================================================================
// TESTS
// ============================================================================
