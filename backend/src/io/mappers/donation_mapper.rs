use chrono::NaiveDate;
use shared::{
    AcceptDonationResponse, Donation, DonationListRequest, DonationListResponse,
    DonationStatus as DtoStatus, PostDonationRequest, PostDonationResponse,
    RejectionReason as DtoRejectionReason, UserIdentity as DtoUser,
};

use crate::domain::commands::donations::PostDonationCommand;
use crate::domain::models::donation::{DonationRecord, DonationStatus, DonationValidationError};
use crate::domain::models::identity::UserIdentity;
use crate::domain::{AcceptOutcome, DonationFilter, RejectionReason};

pub struct DonationMapper;

impl DonationMapper {
    pub fn status_to_dto(status: DonationStatus) -> DtoStatus {
        match status {
            DonationStatus::Pending => DtoStatus::Pending,
            DonationStatus::Accepted => DtoStatus::Accepted,
            DonationStatus::PickedUp => DtoStatus::PickedUp,
            DonationStatus::Completed => DtoStatus::Completed,
        }
    }

    pub fn status_to_domain(status: DtoStatus) -> DonationStatus {
        match status {
            DtoStatus::Pending => DonationStatus::Pending,
            DtoStatus::Accepted => DonationStatus::Accepted,
            DtoStatus::PickedUp => DonationStatus::PickedUp,
            DtoStatus::Completed => DonationStatus::Completed,
        }
    }

    pub fn user_to_dto(user: UserIdentity) -> DtoUser {
        DtoUser {
            id: user.id,
            display_name: user.display_name,
        }
    }

    pub fn user_to_domain(user: DtoUser) -> UserIdentity {
        UserIdentity::new(user.id, user.display_name)
    }

    /// Convert a domain record to the shared Donation DTO
    pub fn to_dto(record: DonationRecord) -> Donation {
        Donation {
            id: record.id,
            status: Self::status_to_dto(record.status),
            food_items: record.food_items,
            donor: Self::user_to_dto(record.donor),
            receiver: record.receiver.map(Self::user_to_dto),
            location: record.location,
            category: record.details.category,
            quantity: record.details.quantity,
            expiry_date: record
                .details
                .expiry_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
            pickup_time: record.details.pickup_time,
            description: record.details.description,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }

    pub fn to_dto_list(records: Vec<DonationRecord>) -> Vec<Donation> {
        records.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_post_response(record: DonationRecord) -> PostDonationResponse {
        let success_message = format!(
            "Donation of {} item(s) posted at {}",
            record.food_items.len(),
            record.location
        );
        PostDonationResponse {
            donation: Self::to_dto(record),
            success_message,
        }
    }

    pub fn to_list_response(records: Vec<DonationRecord>) -> DonationListResponse {
        DonationListResponse {
            donations: Self::to_dto_list(records),
        }
    }

    /// Convert the posting form into a domain command
    pub fn post_request_to_command(
        request: PostDonationRequest,
    ) -> Result<PostDonationCommand, DonationValidationError> {
        let expiry_date = match request.expiry_date.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| DonationValidationError::InvalidExpiryDate(raw.to_string()))?,
            ),
        };
        Ok(PostDonationCommand {
            food_items: request.food_items,
            location: request.location,
            category: request.category,
            quantity: request.quantity,
            expiry_date,
            pickup_time: request.pickup_time,
            description: request.description,
        })
    }

    pub fn list_request_to_filter(request: DonationListRequest) -> DonationFilter {
        DonationFilter {
            status: request.status.map(Self::status_to_domain),
            donor_id: request.donor_id,
            receiver_id: request.receiver_id,
        }
    }

    pub fn accept_outcome_to_dto(outcome: AcceptOutcome) -> AcceptDonationResponse {
        match outcome {
            AcceptOutcome::Accepted(record) => AcceptDonationResponse::Accepted {
                donation: Self::to_dto(record),
            },
            AcceptOutcome::Rejected { reason } => {
                let reason = match reason {
                    RejectionReason::AlreadyResolved => DtoRejectionReason::AlreadyResolved,
                    RejectionReason::OwnDonation => DtoRejectionReason::OwnDonation,
                };
                AcceptDonationResponse::Rejected {
                    reason,
                    message: reason.user_message().to_string(),
                }
            }
        }
    }
}
