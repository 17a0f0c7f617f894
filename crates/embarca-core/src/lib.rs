//! Core library for the Embarca ferry boarding app.
//!
//! The screens above this crate are pure presentation; everything with
//! behavior lives here:
//!
//! - `api`: the authenticated HTTP client, with transparent single-flight
//!   credential refresh and request queuing on 401
//! - `auth`: credential storage, token claim decoding, and the session
//!   controller that drives login/logout and the startup check
//! - `models` / `services`: backend wire types and the thin domain calls
//!   (boardings, check-ins, refunds, vehicles)
//! - `config`: base URL override and last-login persistence

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiRequest, ApiResponse, HttpTransport, Transport};
pub use auth::{
    AuthController, AuthStatus, CredentialStore, KeyringStore, LoginOutcome, MemoryStore, Session,
    StartupCheck,
};
pub use config::Config;
