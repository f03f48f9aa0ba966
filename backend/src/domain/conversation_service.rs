//! Conversation log.
//!
//! Append-only message history per conversation. Each append gets the next
//! sequence number and a timestamp no earlier than the previous message's,
//! so display order (timestamp, then append order) always equals append
//! order.

use chrono::Duration;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::domain::clock::Clock;
use crate::domain::commands::conversations::SendMessageCommand;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::identity::UserIdentity;
use crate::domain::models::message::{ConversationId, Message};
use crate::storage::ConversationStorage;

/// Snapshot of a conversation taken at read time.
///
/// Iterating does not consume it, so a view can be walked any number of
/// times. Messages appended later are not reflected.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationHistory {
    conversation: ConversationId,
    messages: Vec<Message>,
}

impl ConversationHistory {
    fn new(conversation: ConversationId, mut messages: Vec<Message>) -> Self {
        messages.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.sequence.cmp(&b.sequence))
        });
        Self {
            conversation,
            messages,
        }
    }

    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl<'a> IntoIterator for &'a ConversationHistory {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

pub struct ConversationLog<S: ConversationStorage + ?Sized> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    // Serializes sequence and timestamp assignment across appends
    append_lock: Arc<Mutex<()>>,
}

impl<S: ConversationStorage + ?Sized> Clone for ConversationLog<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            clock: Arc::clone(&self.clock),
            append_lock: Arc::clone(&self.append_lock),
        }
    }
}

impl<S: ConversationStorage + ?Sized> ConversationLog<S> {
    pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append a message and return it as stored
    pub fn append(
        &self,
        conversation: &ConversationId,
        text: &str,
        sender: &UserIdentity,
    ) -> DomainResult<Message> {
        if text.trim().is_empty() {
            debug!("Rejected empty message for conversation {}", conversation);
            return Err(DomainError::EmptyMessage);
        }

        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Conversation append lock poisoned"))?;

        let previous = self.storage.last_message(conversation)?;
        let now = self.clock.now();
        let (sequence, timestamp) = match previous {
            Some(last) if now < last.timestamp => {
                debug!(
                    "Clock behind last message in {}, clamping timestamp",
                    conversation
                );
                (last.sequence + 1, last.timestamp + Duration::milliseconds(1))
            }
            Some(last) => (last.sequence + 1, now),
            None => (1, now),
        };

        let message = Message {
            id: Message::generate_id(sequence),
            conversation: conversation.clone(),
            sequence,
            text: text.to_string(),
            sender: sender.clone(),
            timestamp,
        };
        self.storage.append_message(&message)?;

        info!(
            "Appended message {} to conversation {} from {}",
            message.id, conversation, sender.id
        );
        Ok(message)
    }

    pub fn send(&self, command: SendMessageCommand, sender: &UserIdentity) -> DomainResult<Message> {
        self.append(&command.conversation, &command.text, sender)
    }

    /// Current contents of a conversation in display order
    pub fn history(&self, conversation: &ConversationId) -> DomainResult<ConversationHistory> {
        let messages = self.storage.load_messages(conversation)?;
        Ok(ConversationHistory::new(conversation.clone(), messages))
    }
}
