//! Authenticated API client with transparent credential refresh.
//!
//! Every request except the excluded routes carries the stored access
//! credential. The first 401 on a protected route triggers a single refresh
//! of the credential pair; requests that hit a 401 while that refresh is in
//! flight are parked in a queue and resumed with its outcome, so at most one
//! refresh call is ever in flight process-wide.

use std::sync::{Arc, Mutex};

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::auth::CredentialStore;
use crate::models::TokenPair;

use super::{ApiError, ApiRequest, ApiResponse, HttpTransport, Transport};

/// Routes that are sent uncredentialled and never enter the 401-refresh path.
const EXCLUDED_ROUTES: &[&str] = &["/login"];

/// Credential refresh endpoint
const REFRESH_PATH: &str = "/refresh-token";

/// Single-flight refresh bookkeeping.
///
/// Invariant: `waiters` is only non-empty while `in_flight` is true, and is
/// drained in FIFO order in the same critical section that clears the flag.
#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<Result<String, ApiError>>>,
}

/// API client for the Embarca backend.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    refresh: Mutex<RefreshState>,
}

impl ApiClient {
    /// Create a client over an explicit transport and credential store.
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            transport,
            store,
            refresh: Mutex::new(RefreshState::default()),
        }
    }

    /// Create a client over the reqwest transport for the given base URL.
    pub fn with_base_url(
        base_url: &str,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let transport = Arc::new(HttpTransport::new(base_url)?);
        Ok(Self::new(transport, store))
    }

    fn is_excluded(path: &str) -> bool {
        EXCLUDED_ROUTES.iter().any(|route| path.starts_with(route))
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.request(Method::GET, path, query, None).await
    }

    /// POST a JSON body and parse the JSON response.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("request body: {}", e)))?;
        self.request(Method::POST, path, Vec::new(), Some(body)).await
    }

    /// PUT a JSON body and parse the JSON response.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("request body: {}", e)))?;
        self.request(Method::PUT, path, Vec::new(), Some(body)).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let response = self.execute(method, path, query, body).await?;
        serde_json::from_str(&response.body)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    /// Send one request with credential attachment and the single
    /// refresh-and-retry cycle.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse, ApiError> {
        let excluded = Self::is_excluded(path);

        let bearer = if excluded {
            None
        } else {
            self.store
                .access_credential()
                .map_err(|e| ApiError::Storage(e.to_string()))?
        };

        let mut request = ApiRequest {
            method,
            path: path.to_string(),
            query,
            body,
            bearer,
        };

        let response = self.transport.send(request.clone()).await?;

        if excluded || response.status.as_u16() != 401 {
            return Self::check(response);
        }

        // First 401 on a protected route: refresh once, replay once.
        debug!(path, "unauthorized response, refreshing credentials");
        let token = self.refresh_access_credential().await?;
        request.bearer = Some(token);

        let response = self.transport.send(request).await?;
        if response.status.as_u16() == 401 {
            // The refreshed credential was rejected too; do not loop.
            warn!(path, "still unauthorized after refresh");
            return Err(ApiError::SessionExpired);
        }
        Self::check(response)
    }

    fn check(response: ApiResponse) -> Result<ApiResponse, ApiError> {
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    /// Exchange the stored refresh credential for a new credential pair.
    ///
    /// Single-flight: the first caller performs the exchange while concurrent
    /// callers wait on the queue and receive the shared outcome. The session
    /// controller also uses this for its startup check, so the bootstrap
    /// refresh and the 401 interceptor can never race each other.
    pub async fn refresh_access_credential(&self) -> Result<String, ApiError> {
        let waiter = {
            let mut state = self.refresh.lock().unwrap();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.in_flight = true;
                None
            }
        };

        if let Some(rx) = waiter {
            debug!("refresh already in flight, waiting for its outcome");
            return match rx.await {
                Ok(result) => result,
                // The in-flight refresh was torn down (logout) before settling.
                Err(_) => Err(ApiError::SessionExpired),
            };
        }

        let result = self.run_refresh().await;
        self.settle_refresh(&result);
        result
    }

    async fn run_refresh(&self) -> Result<String, ApiError> {
        let refresh_token = match self.store.refresh_credential() {
            Ok(Some(token)) => token,
            Ok(None) => {
                // Nothing to exchange; fail without calling the backend.
                warn!("no refresh credential stored, session is irrecoverable");
                self.clear_credentials();
                return Err(ApiError::SessionExpired);
            }
            Err(e) => {
                self.clear_credentials();
                return Err(ApiError::Storage(e.to_string()));
            }
        };

        let request = ApiRequest {
            method: Method::POST,
            path: REFRESH_PATH.to_string(),
            query: Vec::new(),
            body: Some(serde_json::json!({ "refresh_token": refresh_token })),
            bearer: None,
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                self.clear_credentials();
                return Err(e);
            }
        };

        if !response.status.is_success() {
            warn!(status = %response.status, "credential refresh rejected");
            self.clear_credentials();
            return Err(match response.status.as_u16() {
                500..=599 => ApiError::from_status(response.status, &response.body),
                _ => ApiError::SessionExpired,
            });
        }

        let pair: TokenPair = match serde_json::from_str(&response.body) {
            Ok(pair) => pair,
            Err(e) => {
                self.clear_credentials();
                return Err(ApiError::InvalidResponse(format!("refresh response: {}", e)));
            }
        };

        self.store
            .store_pair(&pair.access_token, &pair.refresh_token)
            .map_err(|e| ApiError::Storage(e.to_string()))?;

        info!("credentials refreshed");
        Ok(pair.access_token)
    }

    /// Drain the waiter queue in FIFO order and clear the in-flight flag.
    ///
    /// Both happen under one lock acquisition, so no request enqueued during
    /// the refresh can observe a drained queue with the flag still set.
    fn settle_refresh(&self, result: &Result<String, ApiError>) {
        let waiters = {
            let mut state = self.refresh.lock().unwrap();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        for tx in waiters {
            let _ = tx.send(result.clone());
        }
    }

    /// Reset the refresh flag and queue.
    ///
    /// Called when credentials are cleared via logout so a stale in-flight
    /// flag cannot strand future requests. Parked waiters are rejected.
    pub fn reset_refresh_state(&self) {
        let waiters = {
            let mut state = self.refresh.lock().unwrap();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        for tx in waiters {
            let _ = tx.send(Err(ApiError::SessionExpired));
        }
    }

    fn clear_credentials(&self) {
        if let Err(e) = self.store.clear() {
            warn!("failed to clear credentials: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_route_is_excluded() {
        assert!(ApiClient::is_excluded("/login"));
        assert!(ApiClient::is_excluded("/login?next=home"));
    }

    #[test]
    fn test_protected_routes_are_not_excluded() {
        assert!(!ApiClient::is_excluded("/boardings"));
        assert!(!ApiClient::is_excluded("/refresh-token"));
        assert!(!ApiClient::is_excluded("/vehicles"));
    }
}
