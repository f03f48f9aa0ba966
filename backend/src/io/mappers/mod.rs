pub mod donation_mapper;
pub mod message_mapper;

pub use donation_mapper::DonationMapper;
pub use message_mapper::MessageMapper;
