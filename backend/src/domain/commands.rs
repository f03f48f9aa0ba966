//! Domain-level command types.
//! These are used by services inside the domain layer and are **not**
//! exposed to the presentation layer. The `io::mappers` module converts the
//! public DTOs defined in the `shared` crate into these.

pub mod donations {
    use chrono::NaiveDate;

    /// Input for posting a new donation.
    #[derive(Debug, Clone, Default)]
    pub struct PostDonationCommand {
        pub food_items: Vec<String>,
        pub location: String,
        pub category: Option<String>,
        pub quantity: Option<String>,
        pub expiry_date: Option<NaiveDate>,
        pub pickup_time: Option<String>,
        pub description: Option<String>,
    }
}

pub mod conversations {
    use crate::domain::models::message::ConversationId;

    /// Input for sending a chat message.
    #[derive(Debug, Clone)]
    pub struct SendMessageCommand {
        pub conversation: ConversationId,
        pub text: String,
    }
}
