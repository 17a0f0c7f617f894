//! Scripted backend and token helpers shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use reqwest::StatusCode;

use embarca_core::{ApiError, ApiRequest, ApiResponse, Transport};

/// Build an unsigned JWT whose payload decodes like a backend-issued token.
pub fn make_token(id: i64, email: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::json!({
        "id": id,
        "email": email,
        "level": 1,
        "data": { "name": "Ana" },
        "exp": exp,
    });
    let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
    format!("{}.{}.sig", header, body)
}

pub fn future_exp() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}

pub fn past_exp() -> i64 {
    chrono::Utc::now().timestamp() - 3600
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Rotate the valid token and return the new pair.
    Succeed,
    /// Reject the refresh credential outright.
    Reject401,
    /// Refresh endpoint falls over.
    Fail500,
}

struct BackendState {
    valid_access: String,
    next_access: String,
    next_refresh: String,
    refresh_mode: RefreshMode,
    /// When false, a successful refresh hands out a token the backend
    /// still rejects (simulates a revoked account).
    accept_after_refresh: bool,
    login_status: u16,
    login_body: String,
    /// Fail this path at the transport level instead of answering.
    fail_network_for: Option<String>,
}

/// In-process backend: every protected route answers 200 for the currently
/// valid access token and 401 otherwise; refresh rotates the valid token.
pub struct MockBackend {
    state: Mutex<BackendState>,
    refresh_calls: AtomicUsize,
    /// Bearer seen on each /login request (should always be None).
    login_bearers: Mutex<Vec<Option<String>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BackendState {
                valid_access: "valid-0".to_string(),
                next_access: "valid-1".to_string(),
                next_refresh: "refresh-1".to_string(),
                refresh_mode: RefreshMode::Succeed,
                accept_after_refresh: true,
                login_status: 200,
                login_body: serde_json::json!({
                    "access_token": make_token(1, "agent@embarca.app", future_exp()),
                    "refresh_token": "refresh-login",
                    "expires_in": 900,
                })
                .to_string(),
                fail_network_for: None,
            }),
            refresh_calls: AtomicUsize::new(0),
            login_bearers: Mutex::new(Vec::new()),
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn login_bearers(&self) -> Vec<Option<String>> {
        self.login_bearers.lock().unwrap().clone()
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        self.state.lock().unwrap().refresh_mode = mode;
    }

    pub fn set_accept_after_refresh(&self, accept: bool) {
        self.state.lock().unwrap().accept_after_refresh = accept;
    }

    pub fn set_next_access(&self, token: &str) {
        self.state.lock().unwrap().next_access = token.to_string();
    }

    pub fn set_login(&self, status: u16, body: &str) {
        let mut state = self.state.lock().unwrap();
        state.login_status = status;
        state.login_body = body.to_string();
    }

    pub fn fail_network_for(&self, path: &str) {
        self.state.lock().unwrap().fail_network_for = Some(path.to_string());
    }

    fn response(status: u16, body: String) -> ApiResponse {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body,
        }
    }
}

#[async_trait]
impl Transport for MockBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        // Yield so concurrent requests interleave the way real I/O does.
        tokio::time::sleep(Duration::from_millis(2)).await;

        if let Some(ref path) = self.state.lock().unwrap().fail_network_for {
            if request.path == *path {
                return Err(ApiError::Network("connection reset".to_string()));
            }
        }

        if request.path == "/login" {
            self.login_bearers.lock().unwrap().push(request.bearer.clone());
            let state = self.state.lock().unwrap();
            return Ok(Self::response(state.login_status, state.login_body.clone()));
        }

        if request.path == "/refresh-token" {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            return Ok(match state.refresh_mode {
                RefreshMode::Succeed => {
                    if state.accept_after_refresh {
                        state.valid_access = state.next_access.clone();
                    }
                    Self::response(
                        200,
                        serde_json::json!({
                            "access_token": state.next_access,
                            "refresh_token": state.next_refresh,
                        })
                        .to_string(),
                    )
                }
                RefreshMode::Reject401 => {
                    Self::response(401, r#"{"error":"invalid refresh token"}"#.to_string())
                }
                RefreshMode::Fail500 => Self::response(500, "refresh backend down".to_string()),
            });
        }

        let state = self.state.lock().unwrap();
        if request.bearer.as_deref() == Some(state.valid_access.as_str()) {
            Ok(Self::response(200, r#"{"ok":true}"#.to_string()))
        } else {
            Ok(Self::response(401, r#"{"error":"unauthorized"}"#.to_string()))
        }
    }
}
