//! Session controller - the single source of truth for "is there a usable
//! session", driving UI gating in the screens above this crate.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::LoginResponse;

use super::claims::{decode_claims, TokenClaims};
use super::CredentialStore;

/// In-memory representation of the authenticated agent, derived from the
/// access token's claims. Recomputed on startup and after every refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub email: String,
    pub level: i64,
    pub data: serde_json::Value,
}

impl From<TokenClaims> for Session {
    fn from(claims: TokenClaims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            level: claims.level,
            data: claims.data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Startup validation has not finished yet.
    Checking,
    Authenticated,
    Unauthenticated,
}

/// Result of the startup session check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupCheck {
    Authenticated,
    Unauthenticated {
        /// True when a stored session existed but could not be renewed, so
        /// the UI should show a "session expired" notice.
        session_expired: bool,
    },
}

/// Outcome of a login attempt, with a message the UI can show verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub success: bool,
    pub message: String,
}

struct AuthState {
    status: AuthStatus,
    user: Option<Session>,
    loading: bool,
}

/// Owns authentication state and the login/logout/startup transitions.
pub struct AuthController {
    client: Arc<ApiClient>,
    store: Arc<dyn CredentialStore>,
    state: Mutex<AuthState>,
}

impl AuthController {
    pub fn new(client: Arc<ApiClient>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            store,
            state: Mutex::new(AuthState {
                status: AuthStatus::Checking,
                user: None,
                loading: false,
            }),
        }
    }

    pub fn status(&self) -> AuthStatus {
        self.state.lock().unwrap().status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    pub fn is_checking_auth(&self) -> bool {
        self.status() == AuthStatus::Checking
    }

    /// True while a login call is outstanding; gates the submit control.
    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().loading
    }

    pub fn user(&self) -> Option<Session> {
        self.state.lock().unwrap().user.clone()
    }

    /// Validate the stored session on app start.
    ///
    /// Decodes the stored access token locally; only when it is expired and a
    /// refresh credential exists does this reach the network, and then through
    /// the client's single-flight refresh so it cannot race a concurrent
    /// 401-triggered refresh.
    pub async fn check_auth(&self) -> StartupCheck {
        self.set_status(AuthStatus::Checking, None);

        let access = match self.store.access_credential() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("no stored access credential");
                return self.finish_check(StartupCheck::Unauthenticated {
                    session_expired: false,
                });
            }
            Err(e) => {
                warn!("failed to read stored credentials: {}", e);
                return self.finish_check(StartupCheck::Unauthenticated {
                    session_expired: false,
                });
            }
        };

        let claims = match decode_claims(&access) {
            Ok(claims) => claims,
            Err(e) => {
                // A stored token we cannot decode is useless; drop it.
                warn!("stored access credential is undecodable: {}", e);
                self.clear_store();
                return self.finish_check(StartupCheck::Unauthenticated {
                    session_expired: false,
                });
            }
        };

        if !claims.is_expired() {
            info!(user = claims.id, "stored session still valid");
            self.set_status(AuthStatus::Authenticated, Some(claims.into()));
            return StartupCheck::Authenticated;
        }

        let has_refresh = matches!(self.store.refresh_credential(), Ok(Some(_)));
        if !has_refresh {
            debug!("access credential expired and no refresh credential stored");
            return self.finish_check(StartupCheck::Unauthenticated {
                session_expired: false,
            });
        }

        info!("access credential expired, attempting refresh");
        match self.client.refresh_access_credential().await {
            Ok(new_access) => match decode_claims(&new_access) {
                Ok(claims) => {
                    info!(user = claims.id, "session renewed on startup");
                    self.set_status(AuthStatus::Authenticated, Some(claims.into()));
                    StartupCheck::Authenticated
                }
                Err(e) => {
                    warn!("refreshed access credential is undecodable: {}", e);
                    self.clear_store();
                    self.finish_check(StartupCheck::Unauthenticated {
                        session_expired: true,
                    })
                }
            },
            Err(e) => {
                // The client already cleared stored credentials.
                warn!("startup refresh failed: {}", e);
                self.finish_check(StartupCheck::Unauthenticated {
                    session_expired: true,
                })
            }
        }
    }

    /// Log in with email and password.
    ///
    /// The login route is excluded from credential attachment and from the
    /// 401-refresh path, so every failure here is surfaced directly.
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        self.set_loading(true);
        let outcome = self.do_login(email, password).await;
        self.set_loading(false);
        outcome
    }

    async fn do_login(&self, email: &str, password: &str) -> LoginOutcome {
        let body = serde_json::json!({ "email": email, "password": password });

        let response: LoginResponse = match self.client.post("/login", &body).await {
            Ok(response) => response,
            Err(ApiError::Unauthorized) => {
                return LoginOutcome {
                    success: false,
                    message: "invalid credentials".to_string(),
                }
            }
            Err(ApiError::Server { .. }) => {
                return LoginOutcome {
                    success: false,
                    message: "server error, please try again later".to_string(),
                }
            }
            Err(e) => {
                return LoginOutcome {
                    success: false,
                    message: format!("unexpected error: {}", e),
                }
            }
        };

        if let Err(e) = self
            .store
            .store_pair(&response.access_token, &response.refresh_token)
        {
            warn!("failed to persist credentials after login: {}", e);
            return LoginOutcome {
                success: false,
                message: "unable to store session securely".to_string(),
            };
        }

        match decode_claims(&response.access_token) {
            Ok(claims) => {
                info!(user = claims.id, "login successful");
                self.set_status(AuthStatus::Authenticated, Some(claims.into()));
                LoginOutcome {
                    success: true,
                    message: "signed in".to_string(),
                }
            }
            Err(e) => {
                warn!("login returned an undecodable access credential: {}", e);
                self.clear_store();
                LoginOutcome {
                    success: false,
                    message: "unexpected error: malformed session token".to_string(),
                }
            }
        }
    }

    /// Clear the stored credential pair and the in-memory session.
    ///
    /// Safe to call repeatedly or with no session at all.
    pub fn logout(&self) {
        info!("logging out");
        self.clear_store();
        self.client.reset_refresh_state();
        self.set_status(AuthStatus::Unauthenticated, None);
    }

    fn finish_check(&self, result: StartupCheck) -> StartupCheck {
        self.set_status(AuthStatus::Unauthenticated, None);
        result
    }

    fn set_status(&self, status: AuthStatus, user: Option<Session>) {
        let mut state = self.state.lock().unwrap();
        state.status = status;
        state.user = user;
    }

    fn set_loading(&self, loading: bool) {
        self.state.lock().unwrap().loading = loading;
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            warn!("failed to clear stored credentials: {}", e);
        }
    }
}
