//! Authentication: credential storage, token claims, and the session controller.
//!
//! - `CredentialStore`: durable access/refresh token persistence (OS keychain
//!   in production, in-memory for tests)
//! - `TokenClaims`: unverified claim decoding for locally-stored tokens
//! - `AuthController`: login/logout and the startup session check

pub mod claims;
pub mod controller;
pub mod credentials;

pub use claims::{decode_claims, TokenClaims};
pub use controller::{AuthController, AuthStatus, LoginOutcome, Session, StartupCheck};
pub use credentials::{CredentialStore, KeyringStore, MemoryStore};
