//! Donation record store.
//!
//! The only mutation surface for donation records. Every write is checked
//! against the stored version before it reaches the backend:
//!
//! - `id`, `donor`, `location` and `created_at` never change
//! - status moves forward one step at a time and never regresses
//! - `receiver` is set exactly when status is past pending, and once set
//!   it never changes
//! - `updated_at` never goes backwards and never precedes `created_at`

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::donation::{DonationRecord, DonationStatus};
use crate::storage::DonationStorage;

/// Filter for [`DonationStore::list`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonationFilter {
    pub status: Option<DonationStatus>,
    pub donor_id: Option<String>,
    pub receiver_id: Option<String>,
}

impl DonationFilter {
    pub fn with_status(status: DonationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn by_donor(donor_id: &str) -> Self {
        Self {
            donor_id: Some(donor_id.to_string()),
            ..Self::default()
        }
    }

    pub fn by_receiver(receiver_id: &str) -> Self {
        Self {
            receiver_id: Some(receiver_id.to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &DonationRecord) -> bool {
        self.status.map_or(true, |s| record.status == s)
            && self
                .donor_id
                .as_ref()
                .map_or(true, |id| &record.donor.id == id)
            && self.receiver_id.as_ref().map_or(true, |id| {
                record.receiver.as_ref().is_some_and(|r| &r.id == id)
            })
    }
}

pub struct DonationStore<S: DonationStorage + ?Sized> {
    storage: Arc<S>,
}

impl<S: DonationStorage + ?Sized> Clone for DonationStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: DonationStorage + ?Sized> DonationStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn get(&self, donation_id: &str) -> DomainResult<Option<DonationRecord>> {
        Ok(self.storage.load_donation(donation_id)?)
    }

    /// Like [`get`](Self::get) but a missing record is an error
    pub fn require(&self, donation_id: &str) -> DomainResult<DonationRecord> {
        self.get(donation_id)?
            .ok_or_else(|| DomainError::NotFound(donation_id.to_string()))
    }

    /// Matching records, newest first
    pub fn list(&self, filter: &DonationFilter) -> DomainResult<Vec<DonationRecord>> {
        let mut donations: Vec<DonationRecord> = self
            .storage
            .load_donations()?
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect();
        donations.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(donations)
    }

    /// Store a newly created donation. It must be pending with no receiver.
    pub fn insert(&self, record: &DonationRecord) -> DomainResult<()> {
        if record.status != DonationStatus::Pending {
            return Err(DomainError::invariant(
                &record.id,
                format!("new donations must be pending, got {}", record.status),
            ));
        }
        if let Some(reason) = record.consistency_error() {
            return Err(DomainError::invariant(&record.id, reason));
        }
        if !self.storage.insert_donation(record)? {
            return Err(DomainError::invariant(&record.id, "donation id already exists"));
        }
        debug!("Inserted donation {}", record.id);
        Ok(())
    }

    /// Full replace of a stored record.
    ///
    /// A record that does not exist yet is inserted. The write is conditional
    /// on the status that was validated against, so a concurrent transition
    /// surfaces as an invariant violation instead of being overwritten.
    pub fn put(&self, record: &DonationRecord) -> DomainResult<()> {
        let current = match self.get(&record.id)? {
            Some(current) => current,
            None => return self.insert(record),
        };
        validate_replacement(&current, record)?;
        if !self.storage.save_donation_if_status(record, current.status)? {
            warn!(
                "Donation {} changed status while being written",
                record.id
            );
            return Err(DomainError::invariant(
                &record.id,
                "status changed concurrently",
            ));
        }
        debug!("Stored donation {} with status {}", record.id, record.status);
        Ok(())
    }

    /// Replace a record only if its stored status is still `expected`.
    ///
    /// Returns `Ok(false)` when another writer got there first or the record
    /// is gone. Invariant checks still apply to the replacement.
    pub fn put_if_status(
        &self,
        record: &DonationRecord,
        expected: DonationStatus,
    ) -> DomainResult<bool> {
        let current = match self.get(&record.id)? {
            Some(current) if current.status == expected => current,
            _ => return Ok(false),
        };
        validate_replacement(&current, record)?;
        let written = self.storage.save_donation_if_status(record, expected)?;
        if written {
            debug!(
                "Donation {} moved {} -> {}",
                record.id, expected, record.status
            );
        }
        Ok(written)
    }
}

fn validate_replacement(current: &DonationRecord, next: &DonationRecord) -> DomainResult<()> {
    let id = &current.id;
    if next.donor != current.donor {
        return Err(DomainError::invariant(id, "donor cannot change"));
    }
    if next.location != current.location {
        return Err(DomainError::invariant(id, "location cannot change"));
    }
    if next.created_at != current.created_at {
        return Err(DomainError::invariant(id, "created_at cannot change"));
    }
    if next.status < current.status {
        return Err(DomainError::invariant(
            id,
            format!("status cannot regress from {} to {}", current.status, next.status),
        ));
    }
    if next.status.ordinal() > current.status.ordinal() + 1 {
        return Err(DomainError::invariant(
            id,
            format!("status cannot skip from {} to {}", current.status, next.status),
        ));
    }
    if let Some(receiver) = &current.receiver {
        if next.receiver.as_ref() != Some(receiver) {
            return Err(DomainError::invariant(id, "receiver cannot change once set"));
        }
    }
    if next.updated_at < current.updated_at {
        return Err(DomainError::invariant(id, "updated_at cannot go backwards"));
    }
    if let Some(reason) = next.consistency_error() {
        return Err(DomainError::invariant(id, reason));
    }
    Ok(())
}
