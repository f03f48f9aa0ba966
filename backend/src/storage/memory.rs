//! # In-Memory Storage
//!
//! Mutex-guarded maps implementing every storage trait. Used when the
//! backend is configured with `storage: memory` and throughout the domain
//! tests.

use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::traits::{ConversationStorage, DonationStorage, IgnoreStorage};
use crate::domain::models::donation::{DonationRecord, DonationStatus};
use crate::domain::models::message::{ConversationId, Message};

#[derive(Debug, Default)]
pub struct InMemoryStorage {
    donations: Mutex<BTreeMap<String, DonationRecord>>,
    ignored: Mutex<HashMap<String, HashSet<String>>>,
    conversations: Mutex<HashMap<ConversationId, Vec<Message>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| anyhow!("In-memory {} lock poisoned", what))
}

impl DonationStorage for InMemoryStorage {
    fn load_donation(&self, donation_id: &str) -> Result<Option<DonationRecord>> {
        let donations = lock(&self.donations, "donation")?;
        Ok(donations.get(donation_id).cloned())
    }

    fn load_donations(&self) -> Result<Vec<DonationRecord>> {
        let donations = lock(&self.donations, "donation")?;
        Ok(donations.values().cloned().collect())
    }

    fn insert_donation(&self, record: &DonationRecord) -> Result<bool> {
        let mut donations = lock(&self.donations, "donation")?;
        if donations.contains_key(&record.id) {
            return Ok(false);
        }
        donations.insert(record.id.clone(), record.clone());
        Ok(true)
    }

    fn save_donation_if_status(
        &self,
        record: &DonationRecord,
        expected: DonationStatus,
    ) -> Result<bool> {
        let mut donations = lock(&self.donations, "donation")?;
        match donations.get_mut(&record.id) {
            Some(stored) if stored.status == expected => {
                *stored = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl IgnoreStorage for InMemoryStorage {
    fn ignore_donation(&self, viewer_id: &str, donation_id: &str) -> Result<bool> {
        let mut ignored = lock(&self.ignored, "ignore")?;
        Ok(ignored
            .entry(viewer_id.to_string())
            .or_default()
            .insert(donation_id.to_string()))
    }

    fn ignored_by(&self, viewer_id: &str) -> Result<HashSet<String>> {
        let ignored = lock(&self.ignored, "ignore")?;
        Ok(ignored.get(viewer_id).cloned().unwrap_or_default())
    }
}

impl ConversationStorage for InMemoryStorage {
    fn load_messages(&self, conversation: &ConversationId) -> Result<Vec<Message>> {
        let conversations = lock(&self.conversations, "conversation")?;
        Ok(conversations.get(conversation).cloned().unwrap_or_default())
    }

    fn last_message(&self, conversation: &ConversationId) -> Result<Option<Message>> {
        let conversations = lock(&self.conversations, "conversation")?;
        Ok(conversations
            .get(conversation)
            .and_then(|messages| messages.last().cloned()))
    }

    fn append_message(&self, message: &Message) -> Result<()> {
        let mut conversations = lock(&self.conversations, "conversation")?;
        conversations
            .entry(message.conversation.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }
}
