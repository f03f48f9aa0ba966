//! Domain model for conversation messages.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::identity::UserIdentity;

/// Identity of a two-party conversation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConversationId(String);

impl ConversationId {
    /// Thread attached to a single donation
    pub fn for_donation(donation_id: &str) -> Self {
        Self(format!("thread::{}", donation_id))
    }

    /// Direct conversation between two users. Argument order does not matter.
    ///
    /// Each id is length-prefixed, so ids containing `::` cannot make two
    /// different pairs share a conversation.
    pub fn between(a: &UserIdentity, b: &UserIdentity) -> Self {
        let (first, second) = if a.id <= b.id {
            (&a.id, &b.id)
        } else {
            (&b.id, &a.id)
        };
        Self(format!(
            "dm::{}:{}::{}:{}",
            first.len(),
            first,
            second.len(),
            second
        ))
    }

    /// Wrap an id received from the presentation layer
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation: ConversationId,
    /// Append position within the conversation, starting at 1
    pub sequence: u64,
    pub text: String,
    pub sender: UserIdentity,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn generate_id(sequence: u64) -> String {
        format!("message::{}", sequence)
    }
}
