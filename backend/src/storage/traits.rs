//! # Storage Traits
//!
//! Persistence seams used by the domain layer. Implementations only move
//! records in and out of a backing store; the invariants on those records
//! are enforced by the domain's `DonationStore`, not here.

use anyhow::Result;
use std::collections::HashSet;

use crate::domain::models::donation::{DonationRecord, DonationStatus};
use crate::domain::models::message::{ConversationId, Message};

/// Trait defining the interface for donation record storage
pub trait DonationStorage: Send + Sync {
    /// Retrieve a donation by ID
    fn load_donation(&self, donation_id: &str) -> Result<Option<DonationRecord>>;

    /// Retrieve every stored donation, in no particular order
    fn load_donations(&self) -> Result<Vec<DonationRecord>>;

    /// Store a brand new donation.
    /// Returns false without writing if the ID is already taken.
    fn insert_donation(&self, record: &DonationRecord) -> Result<bool>;

    /// Replace a donation only if its stored status still equals `expected`.
    ///
    /// The check and the write must be a single atomic step with respect to
    /// every other call on the same storage. Returns false when the stored
    /// status differs or the donation does not exist.
    fn save_donation_if_status(
        &self,
        record: &DonationRecord,
        expected: DonationStatus,
    ) -> Result<bool>;
}

/// Per-viewer suppression of pool entries
pub trait IgnoreStorage: Send + Sync {
    /// Record that `viewer_id` no longer wants to see `donation_id`.
    /// Returns true if this is a new entry.
    fn ignore_donation(&self, viewer_id: &str, donation_id: &str) -> Result<bool>;

    /// All donation IDs the viewer has ignored
    fn ignored_by(&self, viewer_id: &str) -> Result<HashSet<String>>;
}

/// Append-only message storage, one log per conversation
pub trait ConversationStorage: Send + Sync {
    /// All messages of a conversation in append order
    fn load_messages(&self, conversation: &ConversationId) -> Result<Vec<Message>>;

    /// The most recently appended message of a conversation
    fn last_message(&self, conversation: &ConversationId) -> Result<Option<Message>>;

    /// Append a message to the end of its conversation
    fn append_message(&self, message: &Message) -> Result<()>;
}
