pub mod api_key;
pub mod availability;
pub mod booking;
pub mod slot;
