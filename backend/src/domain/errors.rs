//! Error taxonomy for the donation core.
//!
//! Every operation returns these as explicit failures; nothing here is fatal
//! to the process. Losing an accept race is not an error and is reported
//! through [`AcceptOutcome`](crate::domain::AcceptOutcome) instead.

use crate::domain::models::donation::{DonationStatus, DonationValidationError};

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Transition requested from a status with no successor, or an
    /// unrecognized status value. Programmer error.
    #[error("Invalid donation state: {0}")]
    InvalidState(String),

    /// `advance` was called on a completed donation
    #[error("Donation {donation_id} is already {status} and cannot advance")]
    TerminalState {
        donation_id: String,
        status: DonationStatus,
    },

    #[error("Message cannot be empty")]
    EmptyMessage,

    /// The store refused a write that would break record invariants
    #[error("Invariant violation on {donation_id}: {reason}")]
    InvariantViolation { donation_id: String, reason: String },

    #[error("Donation not found: {0}")]
    NotFound(String),

    /// Only the donor and the receiver may move an accepted donation forward
    #[error("User {user_id} is not a party to donation {donation_id}")]
    NotAParty { donation_id: String, user_id: String },

    #[error(transparent)]
    Validation(#[from] DonationValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    pub(crate) fn invariant(donation_id: &str, reason: impl Into<String>) -> Self {
        DomainError::InvariantViolation {
            donation_id: donation_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the user can fix the problem and retry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyMessage | DomainError::Validation(_) | DomainError::NotFound(_)
        )
    }
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(DomainError::EmptyMessage.is_recoverable());
        assert!(DomainError::from(DonationValidationError::NoFoodItems).is_recoverable());
        assert!(!DomainError::invariant("d1", "donor cannot change").is_recoverable());
        assert!(!DomainError::from(anyhow::anyhow!("disk full")).is_recoverable());
    }
}
