//! # CSV Message Repository
//!
//! One append-only CSV file per conversation under
//! `{data}/conversations/`. Rows are written in append order and never
//! rewritten.
//!
//! ```csv
//! id,sequence,text,sender_id,sender_name,timestamp
//! message::1,1,"Is the soup still available?",user_2,Riley,2025-02-27T10:00:00+00:00
//! ```

use anyhow::{anyhow, Result};
use csv::{Reader, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use tracing::{debug, warn};

use super::connection::CsvConnection;
use super::donation_repository::parse_timestamp;
use crate::domain::models::identity::UserIdentity;
use crate::domain::models::message::{ConversationId, Message};
use crate::storage::ConversationStorage;

const MESSAGES_HEADER: &str = "id,sequence,text,sender_id,sender_name,timestamp";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageCsvRecord {
    id: String,
    sequence: u64,
    text: String,
    sender_id: String,
    sender_name: String,
    timestamp: String,
}

impl MessageCsvRecord {
    fn into_message(self, conversation: &ConversationId) -> Result<Message> {
        Ok(Message {
            id: self.id,
            conversation: conversation.clone(),
            sequence: self.sequence,
            text: self.text,
            sender: UserIdentity::new(self.sender_id, self.sender_name),
            timestamp: parse_timestamp(&self.timestamp)?,
        })
    }
}

impl From<&Message> for MessageCsvRecord {
    fn from(message: &Message) -> Self {
        MessageCsvRecord {
            id: message.id.clone(),
            sequence: message.sequence,
            text: message.text.clone(),
            sender_id: message.sender.id.clone(),
            sender_name: message.sender.display_name.clone(),
            timestamp: message.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Clone)]
pub struct MessageRepository {
    connection: CsvConnection,
}

impl MessageRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

impl ConversationStorage for MessageRepository {
    fn load_messages(&self, conversation: &ConversationId) -> Result<Vec<Message>> {
        let path = self.connection.conversation_file_path(conversation);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&path)?;
        let mut messages = Vec::new();
        for result in reader.deserialize::<MessageCsvRecord>() {
            let parsed = result
                .map_err(|e| anyhow!(e))
                .and_then(|record| record.into_message(conversation));
            match parsed {
                Ok(message) => messages.push(message),
                Err(e) => warn!(
                    "Failed to parse message in conversation {}: {}. Skipping.",
                    conversation, e
                ),
            }
        }
        Ok(messages)
    }

    fn last_message(&self, conversation: &ConversationId) -> Result<Option<Message>> {
        Ok(self.load_messages(conversation)?.pop())
    }

    fn append_message(&self, message: &Message) -> Result<()> {
        let _guard = self.connection.lock_writes()?;
        let path = self.connection.conversation_file_path(&message.conversation);
        self.connection.ensure_file_exists(&path, MESSAGES_HEADER)?;

        let file = OpenOptions::new().append(true).open(&path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize(MessageCsvRecord::from(message))?;
        writer.flush()?;

        debug!("Appended message {} to {:?}", message.id, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;
    use crate::domain::conversation_service::ConversationLog;
    use crate::storage::csv::test_utils::TestEnvironment;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    #[test]
    fn test_missing_conversation_is_empty() {
        let env = TestEnvironment::new().unwrap();
        let repo = MessageRepository::new(env.connection.clone());
        let conversation = ConversationId::for_donation("donation::none");
        assert!(repo.load_messages(&conversation).unwrap().is_empty());
        assert!(repo.last_message(&conversation).unwrap().is_none());
    }

    #[test]
    fn test_log_over_csv_survives_reopen() {
        let env = TestEnvironment::new().unwrap();
        let clock = ManualClock::new(Utc::now());
        let log = ConversationLog::new(
            Arc::new(MessageRepository::new(env.connection.clone())),
            Arc::new(clock.clone()),
        );
        let conversation = ConversationId::for_donation("donation::d1");
        let riley = UserIdentity::new("user_2", "Riley");
        let dana = UserIdentity::new("user_1", "Dana");

        log.append(&conversation, "Hi, can I collect at 6, or later?", &riley).unwrap();
        clock.advance(Duration::seconds(-10));
        log.append(&conversation, "6 works.\nRing twice", &dana).unwrap();

        let reopened = ConversationLog::new(
            Arc::new(MessageRepository::new(CsvConnection::new(env.base_directory()).unwrap())),
            Arc::new(clock.clone()),
        );
        let history = reopened.history(&conversation).unwrap();
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Hi, can I collect at 6, or later?", "6 works.\nRing twice"]);

        let third = reopened.append(&conversation, "Thanks!", &riley).unwrap();
        assert_eq!(third.sequence, 3);
        assert!(third.timestamp >= history.last().unwrap().timestamp);
    }
}
