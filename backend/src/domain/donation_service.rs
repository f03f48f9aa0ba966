//! Donation posting and read-side queries for donors.
//!
//! ## Business Rules
//!
//! - At least one food item, each at least 2 characters after trimming
//! - Pickup location at least 5 characters after trimming
//! - Food type, quantity, expiry date and pickup time are required
//! - Description bounded by the configured maximum length
//! - New donations start pending with no receiver

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::commands::donations::PostDonationCommand;
use crate::domain::errors::DomainResult;
use crate::domain::models::donation::{DonationDetails, DonationRecord, DonationValidationError};
use crate::domain::models::identity::UserIdentity;
use crate::domain::store::{DonationFilter, DonationStore};
use crate::storage::DonationStorage;

pub const DEFAULT_MAX_DESCRIPTION_LENGTH: usize = 1000;
const MIN_FOOD_ITEM_LENGTH: usize = 2;
const MIN_LOCATION_LENGTH: usize = 5;

pub struct DonationService<S: DonationStorage + ?Sized> {
    store: DonationStore<S>,
    clock: Arc<dyn Clock>,
    max_description_length: usize,
}

impl<S: DonationStorage + ?Sized> Clone for DonationService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: Arc::clone(&self.clock),
            max_description_length: self.max_description_length,
        }
    }
}

impl<S: DonationStorage + ?Sized> DonationService<S> {
    pub fn new(store: DonationStore<S>, clock: Arc<dyn Clock>, max_description_length: usize) -> Self {
        Self {
            store,
            clock,
            max_description_length,
        }
    }

    /// Create a pending donation for `donor`
    pub fn post_donation(
        &self,
        donor: &UserIdentity,
        command: PostDonationCommand,
    ) -> DomainResult<DonationRecord> {
        let (food_items, location, details) = self.validate(command)?;

        let id = shared::Donation::generate_id(&Uuid::new_v4().simple().to_string());
        let record = DonationRecord::new_pending(
            id,
            donor.clone(),
            food_items,
            location,
            details,
            self.clock.now(),
        );
        self.store.insert(&record)?;

        info!(
            "Donor {} posted donation {} with {} item(s)",
            donor.id,
            record.id,
            record.food_items.len()
        );
        Ok(record)
    }

    pub fn get_donation(&self, donation_id: &str) -> DomainResult<DonationRecord> {
        self.store.require(donation_id)
    }

    pub fn list_donations(&self, filter: &DonationFilter) -> DomainResult<Vec<DonationRecord>> {
        self.store.list(filter)
    }

    /// Everything `donor` has posted, newest first
    pub fn donations_by_donor(&self, donor: &UserIdentity) -> DomainResult<Vec<DonationRecord>> {
        self.store.list(&DonationFilter::by_donor(&donor.id))
    }

    fn validate(
        &self,
        command: PostDonationCommand,
    ) -> Result<(Vec<String>, String, DonationDetails), DonationValidationError> {
        let food_items: Vec<String> = command
            .food_items
            .iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
        if food_items.is_empty() {
            return Err(DonationValidationError::NoFoodItems);
        }
        if let Some(short) = food_items
            .iter()
            .find(|item| item.chars().count() < MIN_FOOD_ITEM_LENGTH)
        {
            return Err(DonationValidationError::FoodItemTooShort(short.clone()));
        }

        let location = command.location.trim().to_string();
        if location.chars().count() < MIN_LOCATION_LENGTH {
            return Err(DonationValidationError::LocationTooShort);
        }

        let description = command.description.unwrap_or_default().trim().to_string();
        if description.chars().count() > self.max_description_length {
            return Err(DonationValidationError::DescriptionTooLong {
                max: self.max_description_length,
            });
        }

        let category =
            non_blank(command.category).ok_or(DonationValidationError::MissingCategory)?;
        let quantity =
            non_blank(command.quantity).ok_or(DonationValidationError::MissingQuantity)?;
        let expiry_date = command
            .expiry_date
            .ok_or(DonationValidationError::MissingExpiryDate)?;
        let pickup_time =
            non_blank(command.pickup_time).ok_or(DonationValidationError::MissingPickupTime)?;

        let details = DonationDetails {
            category: Some(category),
            quantity: Some(quantity),
            expiry_date: Some(expiry_date),
            pickup_time: Some(pickup_time),
            description,
        };
        Ok((food_items, location, details))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
