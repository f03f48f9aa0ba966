//! # Domain Module
//!
//! Business logic for the food-sharing core: the donation lifecycle, the
//! matching of recipients against the pool of pending donations, and the
//! per-conversation message log.
//!
//! ## Module Organization
//!
//! - **store**: the only mutation surface for donation records
//! - **lifecycle**: status state machine and party-checked transitions
//! - **matching_service**: accept/ignore resolution over the pending pool
//! - **conversation_service**: append-only message history
//! - **donation_service**: posting donations and donor-side queries
//!
//! ## Business Rules
//!
//! - A donation is accepted at most once
//! - Status moves pending → accepted → pickedup → completed, never back
//! - The receiver is set exactly when the donation leaves pending
//! - Messages within a conversation stay in append order

pub mod clock;
pub mod commands;
pub mod conversation_service;
pub mod donation_service;
pub mod errors;
pub mod lifecycle;
pub mod matching_service;
pub mod models;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use conversation_service::{ConversationHistory, ConversationLog};
pub use donation_service::DonationService;
pub use errors::{DomainError, DomainResult};
pub use lifecycle::{next_status, LifecycleEngine, LifecycleService};
pub use matching_service::{AcceptOutcome, MatchingResolver, RejectionReason};
pub use store::{DonationFilter, DonationStore};
