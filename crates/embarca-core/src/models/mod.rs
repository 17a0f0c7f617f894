//! Wire types exchanged with the Embarca backend.

pub mod api;
pub mod boarding;
pub mod checkin;
pub mod vehicle;

pub use api::{LoginResponse, TokenPair};
pub use boarding::{Boarding, FerryItem, FerryRoute};
pub use checkin::Checkin;
pub use vehicle::Vehicle;
