//! Concurrency and failure behavior of the authenticated client.

mod common;

use std::sync::Arc;

use futures::future::join_all;

use common::{MockBackend, RefreshMode};
use embarca_core::{ApiClient, ApiError, CredentialStore, MemoryStore};

#[tokio::test]
async fn concurrent_401s_trigger_exactly_one_refresh() {
    let backend = Arc::new(MockBackend::new());
    let store = Arc::new(MemoryStore::with_pair("stale", "refresh-0"));
    let client = ApiClient::new(backend.clone(), store.clone());

    let calls = (0..5).map(|_| client.get::<serde_json::Value>("/vehicles", &[]));
    let results = join_all(calls).await;

    assert_eq!(results.len(), 5);
    for result in &results {
        assert!(result.is_ok(), "request failed: {:?}", result);
    }
    assert_eq!(backend.refresh_calls(), 1);

    // The replays ran with the rotated credential, now persisted.
    assert_eq!(store.access_credential().unwrap().as_deref(), Some("valid-1"));
    assert_eq!(
        store.refresh_credential().unwrap().as_deref(),
        Some("refresh-1")
    );
}

#[tokio::test]
async fn no_second_refresh_when_replay_is_rejected() {
    let backend = Arc::new(MockBackend::new());
    backend.set_accept_after_refresh(false);
    let store = Arc::new(MemoryStore::with_pair("stale", "refresh-0"));
    let client = ApiClient::new(backend.clone(), store);

    let result = client.get::<serde_json::Value>("/boardings/1", &[]).await;

    assert_eq!(result.unwrap_err(), ApiError::SessionExpired);
    assert_eq!(backend.refresh_calls(), 1);
}

#[tokio::test]
async fn queue_drains_with_shared_error_when_refresh_fails() {
    let backend = Arc::new(MockBackend::new());
    backend.set_refresh_mode(RefreshMode::Fail500);
    let store = Arc::new(MemoryStore::with_pair("stale", "refresh-0"));
    let client = ApiClient::new(backend.clone(), store.clone());

    let calls = (0..4).map(|_| client.get::<serde_json::Value>("/vehicles", &[]));
    let results = join_all(calls).await;

    for result in results {
        match result.unwrap_err() {
            ApiError::Server { status: 500, .. } => {}
            other => panic!("expected the refresh failure, got {:?}", other),
        }
    }
    assert_eq!(backend.refresh_calls(), 1);

    // Irrecoverable: the stored pair is gone.
    assert_eq!(store.access_credential().unwrap(), None);
    assert_eq!(store.refresh_credential().unwrap(), None);

    // The in-flight flag is back to false: with credentials restored, the
    // next 401 starts a fresh refresh instead of deadlocking.
    backend.set_refresh_mode(RefreshMode::Succeed);
    store.store_pair("stale-again", "refresh-0b").unwrap();
    let result = client.get::<serde_json::Value>("/vehicles", &[]).await;
    assert!(result.is_ok());
    assert_eq!(backend.refresh_calls(), 2);
}

#[tokio::test]
async fn refresh_without_stored_credential_fails_deterministically() {
    let backend = Arc::new(MockBackend::new());
    let store = Arc::new(MemoryStore::with_access_only("stale"));
    let client = ApiClient::new(backend.clone(), store);

    let result = client.get::<serde_json::Value>("/vehicles", &[]).await;

    assert_eq!(result.unwrap_err(), ApiError::SessionExpired);
    // The backend refresh endpoint was never called.
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn login_route_is_sent_uncredentialled_and_never_refreshes() {
    let backend = Arc::new(MockBackend::new());
    backend.set_login(401, r#"{"error":"bad credentials"}"#);
    let store = Arc::new(MemoryStore::with_pair("valid-0", "refresh-0"));
    let client = ApiClient::new(backend.clone(), store);

    let body = serde_json::json!({ "email": "x@y.z", "password": "nope" });
    let result = client.post::<serde_json::Value, _>("/login", &body).await;

    assert_eq!(result.unwrap_err(), ApiError::Unauthorized);
    assert_eq!(backend.refresh_calls(), 0);
    // No Authorization header even though credentials were stored.
    assert_eq!(backend.login_bearers(), vec![None]);
}

#[tokio::test]
async fn network_failure_does_not_enter_the_refresh_path() {
    let backend = Arc::new(MockBackend::new());
    backend.fail_network_for("/vehicles");
    let store = Arc::new(MemoryStore::with_pair("valid-0", "refresh-0"));
    let client = ApiClient::new(backend.clone(), store.clone());

    let result = client.get::<serde_json::Value>("/vehicles", &[]).await;

    assert!(matches!(result.unwrap_err(), ApiError::Network(_)));
    assert_eq!(backend.refresh_calls(), 0);
    // Credentials stay untouched on transport failures.
    assert_eq!(store.access_credential().unwrap().as_deref(), Some("valid-0"));
}

#[tokio::test]
async fn requests_with_a_valid_credential_pass_straight_through() {
    let backend = Arc::new(MockBackend::new());
    let store = Arc::new(MemoryStore::with_pair("valid-0", "refresh-0"));
    let client = ApiClient::new(backend.clone(), store);

    let result = client.get::<serde_json::Value>("/vehicles", &[]).await;

    assert!(result.is_ok());
    assert_eq!(backend.refresh_calls(), 0);
}
