pub mod donation;
pub mod identity;
pub mod message;
