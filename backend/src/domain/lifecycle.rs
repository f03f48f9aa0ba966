//! Donation lifecycle.
//!
//! [`LifecycleEngine`] is the pure state machine
//! (pending → accepted → pickedup → completed). It only computes the next
//! version of a record. [`LifecycleService`] adds the party check and
//! persists the result through the [`DonationStore`].

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::clock::Clock;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::donation::{DonationRecord, DonationStatus};
use crate::domain::models::identity::UserIdentity;
use crate::domain::store::DonationStore;
use crate::storage::DonationStorage;

/// Successor of `current`, or `None` once completed
pub fn next_status(current: DonationStatus) -> Option<DonationStatus> {
    match current {
        DonationStatus::Pending => Some(DonationStatus::Accepted),
        DonationStatus::Accepted => Some(DonationStatus::PickedUp),
        DonationStatus::PickedUp => Some(DonationStatus::Completed),
        DonationStatus::Completed => None,
    }
}

/// Successor of a stored status string. Unknown values are `InvalidState`.
pub fn next_status_of(current: &str) -> DomainResult<Option<DonationStatus>> {
    DonationStatus::from_string(current).map(next_status)
}

#[derive(Clone)]
pub struct LifecycleEngine {
    clock: Arc<dyn Clock>,
}

impl LifecycleEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Copy of `record` moved to its next status.
    ///
    /// `updated_at` is always strictly later than the previous value, even
    /// when the clock has not moved.
    pub fn advance(&self, record: &DonationRecord) -> DomainResult<DonationRecord> {
        let next = next_status(record.status).ok_or_else(|| DomainError::TerminalState {
            donation_id: record.id.clone(),
            status: record.status,
        })?;

        let mut advanced = record.clone();
        advanced.status = next;
        advanced.updated_at = self.transition_time(record.updated_at);
        Ok(advanced)
    }

    /// Acceptance: advance from pending and attach the receiver
    pub fn accept(
        &self,
        record: &DonationRecord,
        receiver: &UserIdentity,
    ) -> DomainResult<DonationRecord> {
        if record.status != DonationStatus::Pending {
            return Err(DomainError::InvalidState(format!(
                "donation {} cannot be accepted from {}",
                record.id, record.status
            )));
        }
        let mut accepted = self.advance(record)?;
        accepted.receiver = Some(receiver.clone());
        Ok(accepted)
    }

    fn transition_time(&self, previous: DateTime<Utc>) -> DateTime<Utc> {
        let now = self.clock.now();
        if now > previous {
            now
        } else {
            previous + Duration::milliseconds(1)
        }
    }
}

/// Moves stored donations along the lifecycle on behalf of their parties.
pub struct LifecycleService<S: DonationStorage + ?Sized> {
    store: DonationStore<S>,
    engine: LifecycleEngine,
}

impl<S: DonationStorage + ?Sized> Clone for LifecycleService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            engine: self.engine.clone(),
        }
    }
}

impl<S: DonationStorage + ?Sized> LifecycleService<S> {
    pub fn new(store: DonationStore<S>, engine: LifecycleEngine) -> Self {
        Self { store, engine }
    }

    /// Advance a stored donation one step.
    ///
    /// Only the donor or the receiver may do this. Pending donations have no
    /// receiver yet, so advancing them here is refused by the store; they
    /// leave pending through the matching resolver.
    pub fn advance_donation(
        &self,
        donation_id: &str,
        actor: &UserIdentity,
    ) -> DomainResult<DonationRecord> {
        let current = self.store.require(donation_id)?;
        if !current.is_party(actor) {
            warn!(
                "User {} tried to advance donation {} without being a party",
                actor.id, donation_id
            );
            return Err(DomainError::NotAParty {
                donation_id: donation_id.to_string(),
                user_id: actor.id.clone(),
            });
        }

        let advanced = self.engine.advance(&current)?;
        if !self.store.put_if_status(&advanced, current.status)? {
            return Err(DomainError::invariant(
                donation_id,
                format!("status changed from {} while advancing", current.status),
            ));
        }

        info!(
            "Donation {} advanced {} -> {} by {}",
            donation_id, current.status, advanced.status, actor.id
        );
        Ok(advanced)
    }
}
