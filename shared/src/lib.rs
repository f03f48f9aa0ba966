use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a donation as shown to donors and recipients.
///
/// Serialized in lowercase (`"pickedup"` for the picked-up state) so the
/// presentation layer can use the values directly as badge keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Accepted,
    PickedUp,
    Completed,
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Accepted => "accepted",
            DonationStatus::PickedUp => "pickedup",
            DonationStatus::Completed => "completed",
        };
        write!(f, "{}", value)
    }
}

/// A user as supplied by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
}

/// Donation ID in format: "donation::<uuid>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: String,
    pub status: DonationStatus,
    /// Food item descriptions in the order the donor listed them
    pub food_items: Vec<String>,
    pub donor: UserIdentity,
    /// Set once the donation has been accepted
    pub receiver: Option<UserIdentity>,
    /// Free-text pickup location
    pub location: String,
    pub category: Option<String>,
    pub quantity: Option<String>,
    /// Expiry date (YYYY-MM-DD)
    pub expiry_date: Option<String>,
    pub pickup_time: Option<String>,
    pub description: String,
    /// RFC 3339
    pub created_at: String,
    /// RFC 3339, time of the most recent status transition
    pub updated_at: String,
}

impl Donation {
    /// Prefix shared by every donation ID
    pub const ID_PREFIX: &'static str = "donation";

    /// Build a donation ID from a unique token
    pub fn generate_id(token: &str) -> String {
        format!("{}::{}", Self::ID_PREFIX, token)
    }

    /// Parse a donation ID and return its unique token
    pub fn parse_id(id: &str) -> Result<&str, DonationIdError> {
        match id.split_once("::") {
            Some((prefix, token)) if prefix == Self::ID_PREFIX => {
                if token.is_empty() || token.contains("::") {
                    Err(DonationIdError::InvalidToken)
                } else {
                    Ok(token)
                }
            }
            _ => Err(DonationIdError::InvalidFormat),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DonationIdError {
    InvalidFormat,
    InvalidToken,
}

impl fmt::Display for DonationIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DonationIdError::InvalidFormat => write!(f, "Invalid donation ID format"),
            DonationIdError::InvalidToken => write!(f, "Invalid token in donation ID"),
        }
    }
}

impl std::error::Error for DonationIdError {}

/// A chat message attached to a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    /// Position in the conversation, starting at 1
    pub sequence: u64,
    pub text: String,
    pub sender: UserIdentity,
    /// RFC 3339
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDonationRequest {
    pub food_items: Vec<String>,
    pub location: String,
    pub category: Option<String>,
    pub quantity: Option<String>,
    /// YYYY-MM-DD
    pub expiry_date: Option<String>,
    pub pickup_time: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDonationResponse {
    pub donation: Donation,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DonationListRequest {
    pub status: Option<DonationStatus>,
    pub donor_id: Option<String>,
    pub receiver_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationListResponse {
    pub donations: Vec<Donation>,
}

/// Why an accept attempt did not win the donation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The donation is no longer in the viewer's pending pool
    AlreadyResolved,
    /// Donors cannot accept their own donations
    OwnDonation,
}

impl RejectionReason {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            RejectionReason::AlreadyResolved => "This donation is no longer available",
            RejectionReason::OwnDonation => "You cannot accept your own donation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AcceptDonationResponse {
    Accepted { donation: Donation },
    Rejected { reason: RejectionReason, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub conversation_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub messages: Vec<Message>,
}
