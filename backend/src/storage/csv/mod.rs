//! CSV file storage backend.

pub mod connection;
pub mod donation_repository;
pub mod ignore_repository;
pub mod message_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::CsvConnection;
pub use donation_repository::DonationRepository;
pub use ignore_repository::IgnoreRepository;
pub use message_repository::MessageRepository;
