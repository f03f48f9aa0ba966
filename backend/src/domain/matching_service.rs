//! Matching resolver.
//!
//! Arbitrates between recipients and the shared pool of pending donations.
//! Acceptance is a compare-and-remove against the pool: the record is
//! written as accepted only if its stored status is still pending, in one
//! atomic storage step, so two concurrent accepts produce exactly one winner.
//!
//! Ignoring is a per-viewer suppression. It never touches the donation
//! record and never changes what other viewers see.

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::errors::DomainResult;
use crate::domain::lifecycle::LifecycleEngine;
use crate::domain::models::donation::{DonationRecord, DonationStatus};
use crate::domain::models::identity::UserIdentity;
use crate::domain::store::{DonationFilter, DonationStore};
use crate::storage::{DonationStorage, IgnoreStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// Not in the viewer's pending pool: accepted by someone, ignored by
    /// this viewer, or never existed
    AlreadyResolved,
    /// The actor posted this donation
    OwnDonation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AcceptOutcome {
    Accepted(DonationRecord),
    Rejected { reason: RejectionReason },
}

impl AcceptOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AcceptOutcome::Accepted(_))
    }

    fn rejected(reason: RejectionReason) -> Self {
        AcceptOutcome::Rejected { reason }
    }
}

pub struct MatchingResolver<D, I>
where
    D: DonationStorage + ?Sized,
    I: IgnoreStorage + ?Sized,
{
    store: DonationStore<D>,
    ignores: Arc<I>,
    engine: LifecycleEngine,
}

impl<D, I> Clone for MatchingResolver<D, I>
where
    D: DonationStorage + ?Sized,
    I: IgnoreStorage + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ignores: Arc::clone(&self.ignores),
            engine: self.engine.clone(),
        }
    }
}

impl<D, I> MatchingResolver<D, I>
where
    D: DonationStorage + ?Sized,
    I: IgnoreStorage + ?Sized,
{
    pub fn new(store: DonationStore<D>, ignores: Arc<I>, engine: LifecycleEngine) -> Self {
        Self {
            store,
            ignores,
            engine,
        }
    }

    /// Try to claim a donation for `actor`.
    pub fn accept(&self, donation_id: &str, actor: &UserIdentity) -> DomainResult<AcceptOutcome> {
        if self.ignores.ignored_by(&actor.id)?.contains(donation_id) {
            debug!("User {} accepted donation {} after ignoring it", actor.id, donation_id);
            return Ok(AcceptOutcome::rejected(RejectionReason::AlreadyResolved));
        }

        let record = match self.store.get(donation_id)? {
            Some(record) if record.status == DonationStatus::Pending => record,
            Some(record) => {
                info!(
                    "Accept of donation {} by {} rejected: already {}",
                    donation_id, actor.id, record.status
                );
                return Ok(AcceptOutcome::rejected(RejectionReason::AlreadyResolved));
            }
            None => {
                info!(
                    "Accept of donation {} by {} rejected: not found",
                    donation_id, actor.id
                );
                return Ok(AcceptOutcome::rejected(RejectionReason::AlreadyResolved));
            }
        };

        if record.donor.is(actor) {
            return Ok(AcceptOutcome::rejected(RejectionReason::OwnDonation));
        }

        let accepted = self.engine.accept(&record, actor)?;
        if !self.store.put_if_status(&accepted, DonationStatus::Pending)? {
            info!(
                "Accept of donation {} by {} lost the race",
                donation_id, actor.id
            );
            return Ok(AcceptOutcome::rejected(RejectionReason::AlreadyResolved));
        }

        info!("Donation {} accepted by {}", donation_id, actor.id);
        Ok(AcceptOutcome::Accepted(accepted))
    }

    /// Hide a donation from `actor`'s pool. Repeating it is a no-op.
    pub fn ignore(&self, donation_id: &str, actor: &UserIdentity) -> DomainResult<()> {
        if self.ignores.ignore_donation(&actor.id, donation_id)? {
            info!("User {} ignored donation {}", actor.id, donation_id);
        } else {
            debug!("User {} already ignored donation {}", actor.id, donation_id);
        }
        Ok(())
    }

    /// Pending donations visible to `viewer`, newest first.
    ///
    /// Excludes the viewer's own postings and anything the viewer ignored.
    pub fn nearby_pool(&self, viewer: &UserIdentity) -> DomainResult<Vec<DonationRecord>> {
        let ignored = self.ignores.ignored_by(&viewer.id)?;
        let pool = self
            .store
            .list(&DonationFilter::with_status(DonationStatus::Pending))?
            .into_iter()
            .filter(|record| !record.donor.is(viewer) && !ignored.contains(&record.id))
            .collect();
        Ok(pool)
    }

    /// Donations `viewer` has won, in any post-pending status
    pub fn accepted_donations(&self, viewer: &UserIdentity) -> DomainResult<Vec<DonationRecord>> {
        self.store.list(&DonationFilter::by_receiver(&viewer.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::SystemClock;
    use crate::domain::models::donation::DonationDetails;
    use crate::storage::InMemoryStorage;
    use chrono::{Duration, Utc};
    use std::sync::Barrier;

    struct Fixture {
        storage: Arc<InMemoryStorage>,
        resolver: MatchingResolver<InMemoryStorage, InMemoryStorage>,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(InMemoryStorage::new());
        let store = DonationStore::new(Arc::clone(&storage));
        let engine = LifecycleEngine::new(Arc::new(SystemClock::new()));
        let resolver = MatchingResolver::new(store, Arc::clone(&storage), engine);
        Fixture { storage, resolver }
    }

    fn donor() -> UserIdentity {
        UserIdentity::new("donor", "Dana")
    }

    fn post(fixture: &Fixture, id: &str, minutes_ago: i64) -> DonationRecord {
        let record = DonationRecord::new_pending(
            id.to_string(),
            donor(),
            vec!["Soup".to_string()],
            "Church hall, Main St".to_string(),
            DonationDetails::default(),
            Utc::now() - Duration::minutes(minutes_ago),
        );
        fixture.storage.insert_donation(&record).unwrap();
        record
    }

    #[test]
    fn test_accept_sets_receiver_and_removes_from_pool() {
        let fixture = fixture();
        let before = post(&fixture, "d1", 5);
        let alice = UserIdentity::new("alice", "Alice");

        let outcome = fixture.resolver.accept("d1", &alice).unwrap();
        let accepted = match outcome {
            AcceptOutcome::Accepted(record) => record,
            other => panic!("expected acceptance, got {:?}", other),
        };
        assert_eq!(accepted.status, DonationStatus::Accepted);
        assert_eq!(accepted.receiver, Some(alice.clone()));
        assert!(accepted.updated_at > before.updated_at);

        let bob = UserIdentity::new("bob", "Bob");
        assert!(fixture.resolver.nearby_pool(&bob).unwrap().is_empty());
        assert_eq!(fixture.resolver.accepted_donations(&alice).unwrap().len(), 1);
    }

    #[test]
    fn test_second_accept_is_already_resolved() {
        let fixture = fixture();
        post(&fixture, "d1", 5);
        let alice = UserIdentity::new("alice", "Alice");
        let bob = UserIdentity::new("bob", "Bob");

        assert!(fixture.resolver.accept("d1", &alice).unwrap().is_accepted());
        assert_eq!(
            fixture.resolver.accept("d1", &bob).unwrap(),
            AcceptOutcome::Rejected {
                reason: RejectionReason::AlreadyResolved
            }
        );
        // Same actor again: still one entry in the accepted set
        assert!(!fixture.resolver.accept("d1", &alice).unwrap().is_accepted());
        assert_eq!(fixture.resolver.accepted_donations(&alice).unwrap().len(), 1);
        assert_eq!(
            fixture.storage.load_donation("d1").unwrap().unwrap().receiver,
            Some(alice)
        );
    }

    #[test]
    fn test_accept_unknown_and_own_donation() {
        let fixture = fixture();
        post(&fixture, "d1", 5);
        let alice = UserIdentity::new("alice", "Alice");
        assert_eq!(
            fixture.resolver.accept("missing", &alice).unwrap(),
            AcceptOutcome::Rejected {
                reason: RejectionReason::AlreadyResolved
            }
        );
        assert_eq!(
            fixture.resolver.accept("d1", &donor()).unwrap(),
            AcceptOutcome::Rejected {
                reason: RejectionReason::OwnDonation
            }
        );
    }

    #[test]
    fn test_concurrent_accepts_have_exactly_one_winner() {
        for round in 0..20 {
            let fixture = fixture();
            let id = format!("d{}", round);
            post(&fixture, &id, 1);
            let actors = [
                UserIdentity::new("alice", "Alice"),
                UserIdentity::new("bob", "Bob"),
            ];
            let barrier = Barrier::new(actors.len());

            let outcomes: Vec<(String, AcceptOutcome)> = std::thread::scope(|scope| {
                let handles: Vec<_> = actors
                    .iter()
                    .map(|actor| {
                        let resolver = fixture.resolver.clone();
                        let barrier = &barrier;
                        let id = id.as_str();
                        scope.spawn(move || {
                            barrier.wait();
                            (actor.id.clone(), resolver.accept(id, actor).unwrap())
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            let winners: Vec<&String> = outcomes
                .iter()
                .filter(|(_, outcome)| outcome.is_accepted())
                .map(|(actor, _)| actor)
                .collect();
            assert_eq!(winners.len(), 1, "round {}", round);
            assert!(outcomes.iter().any(|(_, outcome)| *outcome
                == AcceptOutcome::Rejected {
                    reason: RejectionReason::AlreadyResolved
                }));

            let stored = fixture.storage.load_donation(&id).unwrap().unwrap();
            assert_eq!(stored.receiver.map(|r| r.id), Some(winners[0].clone()));
        }
    }

    #[test]
    fn test_ignore_is_per_viewer_and_idempotent() {
        let fixture = fixture();
        post(&fixture, "d1", 10);
        post(&fixture, "d2", 5);
        let user_x = UserIdentity::new("x", "Xavier");
        let user_y = UserIdentity::new("y", "Yara");

        fixture.resolver.ignore("d1", &user_x).unwrap();
        fixture.resolver.ignore("d1", &user_x).unwrap();

        let pool_x: Vec<String> = fixture
            .resolver
            .nearby_pool(&user_x)
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(pool_x, vec!["d2".to_string()]);

        let pool_y: Vec<String> = fixture
            .resolver
            .nearby_pool(&user_y)
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(pool_y, vec!["d2".to_string(), "d1".to_string()]);

        let stored = fixture.storage.load_donation("d1").unwrap().unwrap();
        assert_eq!(stored.status, DonationStatus::Pending);
        assert_eq!(stored.receiver, None);
    }

    #[test]
    fn test_accept_after_ignore_is_rejected_for_that_viewer_only() {
        let fixture = fixture();
        post(&fixture, "d1", 5);
        let user_x = UserIdentity::new("x", "Xavier");
        let user_y = UserIdentity::new("y", "Yara");

        fixture.resolver.ignore("d1", &user_x).unwrap();
        assert!(!fixture.resolver.accept("d1", &user_x).unwrap().is_accepted());
        assert!(fixture.resolver.accept("d1", &user_y).unwrap().is_accepted());
    }

    #[test]
    fn test_pool_hides_own_donations() {
        let fixture = fixture();
        post(&fixture, "d1", 5);
        assert!(fixture.resolver.nearby_pool(&donor()).unwrap().is_empty());
    }
}
