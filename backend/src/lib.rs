//! # Foodshare Backend
//!
//! Non-UI core of the food-sharing application: donors post surplus food,
//! recipients claim it from a shared pool, and both sides coordinate pickup
//! through per-conversation message logs.
//!
//! ## Architecture
//!
//! ```text
//! Presentation (shared DTOs)
//!     ↓
//! IO Layer (mappers)
//!     ↓
//! Domain Layer (lifecycle, matching, conversations)
//!     ↓
//! Storage Layer (memory or CSV files)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::{BackendConfig, StorageBackend};
use crate::domain::{
    Clock, ConversationLog, DonationService, DonationStore, LifecycleEngine, LifecycleService,
    MatchingResolver, SystemClock,
};
use crate::storage::csv::{CsvConnection, DonationRepository, IgnoreRepository, MessageRepository};
use crate::storage::{ConversationStorage, DonationStorage, IgnoreStorage, InMemoryStorage};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub donation_service: DonationService<dyn DonationStorage>,
    pub matching_resolver: MatchingResolver<dyn DonationStorage, dyn IgnoreStorage>,
    pub lifecycle_service: LifecycleService<dyn DonationStorage>,
    pub conversation_log: ConversationLog<dyn ConversationStorage>,
}

struct StorageSet {
    donations: Arc<dyn DonationStorage>,
    ignores: Arc<dyn IgnoreStorage>,
    conversations: Arc<dyn ConversationStorage>,
}

fn open_storage(config: &BackendConfig, clock: Arc<dyn Clock>) -> Result<StorageSet> {
    match config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            let storage = Arc::new(InMemoryStorage::new());
            Ok(StorageSet {
                donations: storage.clone(),
                ignores: storage.clone(),
                conversations: storage,
            })
        }
        StorageBackend::Csv => {
            info!("Using CSV storage in {}", config.data_directory.display());
            let connection = CsvConnection::new(&config.data_directory)?;
            Ok(StorageSet {
                donations: Arc::new(DonationRepository::new(connection.clone())),
                ignores: Arc::new(IgnoreRepository::new(connection.clone(), clock)),
                conversations: Arc::new(MessageRepository::new(connection)),
            })
        }
    }
}

/// Initialize the backend with all required services
pub fn initialize_backend(config: &BackendConfig) -> Result<AppState> {
    initialize_backend_with_clock(config, Arc::new(SystemClock::new()))
}

/// Same as [`initialize_backend`] with an injected clock
pub fn initialize_backend_with_clock(
    config: &BackendConfig,
    clock: Arc<dyn Clock>,
) -> Result<AppState> {
    info!("Setting up storage");
    let storage = open_storage(config, Arc::clone(&clock))?;

    info!("Setting up domain model");
    let store = DonationStore::new(storage.donations);
    let engine = LifecycleEngine::new(Arc::clone(&clock));

    let app_state = AppState {
        donation_service: DonationService::new(
            store.clone(),
            Arc::clone(&clock),
            config.max_description_length,
        ),
        matching_resolver: MatchingResolver::new(store.clone(), storage.ignores, engine.clone()),
        lifecycle_service: LifecycleService::new(store, engine),
        conversation_log: ConversationLog::new(storage.conversations, clock),
    };

    info!("Backend ready");
    Ok(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::donations::PostDonationCommand;
    use crate::domain::models::donation::DonationStatus;
    use crate::domain::models::identity::UserIdentity;
    use crate::domain::models::message::ConversationId;
    use crate::domain::{AcceptOutcome, DomainError, ManualClock, RejectionReason};
    use chrono::{Duration, NaiveDate, Utc};
    use tempfile::TempDir;

    fn memory_config() -> BackendConfig {
        BackendConfig {
            storage: StorageBackend::Memory,
            ..BackendConfig::default()
        }
    }

    fn soup() -> PostDonationCommand {
        PostDonationCommand {
            food_items: vec!["Vegetable soup".to_string()],
            location: "Church hall, Main St".to_string(),
            category: Some("Prepared meals".to_string()),
            quantity: Some("4 litres".to_string()),
            expiry_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            pickup_time: Some("before 8pm".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_full_donation_flow() {
        let clock = ManualClock::new(Utc::now());
        let state = initialize_backend_with_clock(&memory_config(), Arc::new(clock.clone())).unwrap();
        let donor = UserIdentity::new("donor", "Dana");
        let alice = UserIdentity::new("alice", "Alice");
        let bob = UserIdentity::new("bob", "Bob");

        let posted = state.donation_service.post_donation(&donor, soup()).unwrap();
        assert_eq!(state.matching_resolver.nearby_pool(&alice).unwrap().len(), 1);

        clock.advance(Duration::minutes(1));
        assert!(state.matching_resolver.accept(&posted.id, &alice).unwrap().is_accepted());
        assert_eq!(
            state.matching_resolver.accept(&posted.id, &bob).unwrap(),
            AcceptOutcome::Rejected {
                reason: RejectionReason::AlreadyResolved
            }
        );

        let thread = ConversationId::for_donation(&posted.id);
        state.conversation_log.append(&thread, "Picking up at 6", &alice).unwrap();
        state.conversation_log.append(&thread, "See you then", &donor).unwrap();

        assert!(matches!(
            state.lifecycle_service.advance_donation(&posted.id, &bob),
            Err(DomainError::NotAParty { .. })
        ));
        let picked_up = state.lifecycle_service.advance_donation(&posted.id, &alice).unwrap();
        assert_eq!(picked_up.status, DonationStatus::PickedUp);
        let completed = state.lifecycle_service.advance_donation(&posted.id, &donor).unwrap();
        assert_eq!(completed.status, DonationStatus::Completed);
        assert!(matches!(
            state.lifecycle_service.advance_donation(&posted.id, &donor),
            Err(DomainError::TerminalState { .. })
        ));

        assert_eq!(state.conversation_log.history(&thread).unwrap().len(), 2);
        assert_eq!(state.matching_resolver.accepted_donations(&alice).unwrap().len(), 1);
    }

    #[test]
    fn test_csv_backend_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let config = BackendConfig {
            data_directory: temp_dir.path().join("data"),
            storage: StorageBackend::Csv,
            ..BackendConfig::default()
        };
        let donor = UserIdentity::new("donor", "Dana");
        let alice = UserIdentity::new("alice", "Alice");

        let posted_id = {
            let state = initialize_backend(&config).unwrap();
            let posted = state.donation_service.post_donation(&donor, soup()).unwrap();
            state.matching_resolver.ignore(&posted.id, &alice).unwrap();
            state
                .conversation_log
                .append(&ConversationId::between(&donor, &alice), "hello", &donor)
                .unwrap();
            posted.id
        };

        let state = initialize_backend(&config).unwrap();
        assert_eq!(
            state.donation_service.get_donation(&posted_id).unwrap().status,
            DonationStatus::Pending
        );
        assert!(state.matching_resolver.nearby_pool(&alice).unwrap().is_empty());
        assert!(!state.matching_resolver.accept(&posted_id, &alice).unwrap().is_accepted());
        let reply = state
            .conversation_log
            .append(&ConversationId::between(&alice, &donor), "hi", &alice)
            .unwrap();
        assert_eq!(reply.sequence, 2);
    }
}
