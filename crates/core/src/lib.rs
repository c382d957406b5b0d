//! # Slotbook Core
//!
//! Domain types, the storage ports and the scheduling logic shared by the
//! database and HTTP crates:
//!
//! - **models**: availability rules, bookings, slots and API keys
//! - **slots**: pure derivation of free slots from rules and bookings
//! - **ports**: traits a storage backend implements
//! - **services**: the operations exposed to the HTTP layer

pub mod errors;
pub mod models;
pub mod ports;
pub mod services;
pub mod slots;
