//! # Storage Module
//!
//! Persistence for donation records, per-viewer ignores and conversation
//! logs. The domain layer only sees the traits in [`traits`]; the backends
//! can be swapped without touching domain logic.
//!
//! ## Backends
//!
//! - **memory**: mutex-guarded maps, nothing survives a restart
//! - **csv**: flat files under a data directory, rewritten atomically
//!
//! Both implement the conditional write the matching resolver relies on
//! (`save_donation_if_status`) as a single step under one lock. Across
//! separate processes sharing a CSV directory that lock does not apply; a
//! multi-client deployment needs a backend with a real conditional update.

pub mod csv;
pub mod memory;
pub mod traits;

pub use memory::InMemoryStorage;
pub use traits::{ConversationStorage, DonationStorage, IgnoreStorage};
