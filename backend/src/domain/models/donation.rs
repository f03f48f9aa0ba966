//! Domain model for a donation record.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::identity::UserIdentity;
use crate::domain::errors::DomainError;

/// Lifecycle status. Declaration order is the lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DonationStatus {
    Pending,
    Accepted,
    PickedUp,
    Completed,
}

impl DonationStatus {
    pub const ALL: [DonationStatus; 4] = [
        DonationStatus::Pending,
        DonationStatus::Accepted,
        DonationStatus::PickedUp,
        DonationStatus::Completed,
    ];

    /// Position in the lifecycle, starting at 0 for pending
    pub fn ordinal(self) -> u8 {
        match self {
            DonationStatus::Pending => 0,
            DonationStatus::Accepted => 1,
            DonationStatus::PickedUp => 2,
            DonationStatus::Completed => 3,
        }
    }

    /// Convert to string for CSV storage
    pub fn as_str(self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Accepted => "accepted",
            DonationStatus::PickedUp => "pickedup",
            DonationStatus::Completed => "completed",
        }
    }

    /// Parse from string for CSV loading
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(DonationStatus::Pending),
            "accepted" => Ok(DonationStatus::Accepted),
            "pickedup" => Ok(DonationStatus::PickedUp),
            "completed" => Ok(DonationStatus::Completed),
            _ => Err(DomainError::InvalidState(format!(
                "unrecognized donation status '{}'",
                s
            ))),
        }
    }

    /// A receiver is attached from acceptance onwards
    pub fn requires_receiver(self) -> bool {
        self != DonationStatus::Pending
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional listing details captured by the donation form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DonationDetails {
    pub category: Option<String>,
    pub quantity: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub pickup_time: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationRecord {
    pub id: String,
    pub status: DonationStatus,
    pub food_items: Vec<String>,
    pub donor: UserIdentity,
    pub receiver: Option<UserIdentity>,
    pub location: String,
    pub details: DonationDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DonationRecord {
    /// New pending record; `updated_at` starts equal to `created_at`.
    pub fn new_pending(
        id: String,
        donor: UserIdentity,
        food_items: Vec<String>,
        location: String,
        details: DonationDetails,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            status: DonationStatus::Pending,
            food_items,
            donor,
            receiver: None,
            location,
            details,
            created_at,
            updated_at: created_at,
        }
    }

    /// True when `user` is the donor or the receiver
    pub fn is_party(&self, user: &UserIdentity) -> bool {
        self.donor.is(user) || self.receiver.as_ref().is_some_and(|r| r.is(user))
    }

    /// Describe the first self-consistency problem, if any.
    pub fn consistency_error(&self) -> Option<String> {
        if self.id.trim().is_empty() {
            return Some("donation id is empty".to_string());
        }
        match (self.status.requires_receiver(), &self.receiver) {
            (true, None) => {
                return Some(format!("status {} requires a receiver", self.status));
            }
            (false, Some(receiver)) => {
                return Some(format!(
                    "receiver {} set while status is pending",
                    receiver.id
                ));
            }
            _ => {}
        }
        if self.updated_at < self.created_at {
            return Some("updated_at is earlier than created_at".to_string());
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DonationValidationError {
    #[error("At least one food item is required")]
    NoFoodItems,
    #[error("Food item '{0}' must be at least 2 characters")]
    FoodItemTooShort(String),
    #[error("Please provide a valid pickup location")]
    LocationTooShort,
    #[error("Please select a food type")]
    MissingCategory,
    #[error("Please specify quantity")]
    MissingQuantity,
    #[error("Please provide an expiration date")]
    MissingExpiryDate,
    #[error("Please provide a pickup time")]
    MissingPickupTime,
    #[error("Description cannot exceed {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("Invalid expiry date '{0}', expected YYYY-MM-DD")]
    InvalidExpiryDate(String),
}
