//! Thin domain wrappers over the authenticated client.
//!
//! These functions translate screen-level operations into backend calls;
//! all credential handling happens inside `ApiClient`.

pub mod boarding;
pub mod checkin;
pub mod vehicles;
