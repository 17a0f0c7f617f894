//! Vehicle check-in and refund operations.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::{ApiClient, ApiError};
use crate::models::Checkin;

/// Fields collected by the check-in form.
#[derive(Debug, Clone, Serialize)]
pub struct CheckinRequest {
    pub boarding: i64,
    pub plate: String,
    pub pax: i64,
    pub vehicle: i64,
    pub value: f64,
    pub add_value: f64,
    pub observation: String,
    pub add_value_reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateCheckinOutcome {
    pub success: bool,
    pub checkin_id: Option<i64>,
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct CreateCheckinResponse {
    checkin_id: i64,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Error message the backend sent, or a fallback.
fn backend_error(message: &str) -> String {
    serde_json::from_str::<ErrorBody>(message)
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| "unknown error".to_string())
}

/// Register a vehicle check-in on an open boarding.
pub async fn create_checkin(client: &ApiClient, request: &CheckinRequest) -> CreateCheckinOutcome {
    match client
        .post::<CreateCheckinResponse, _>("/checkins", request)
        .await
    {
        Ok(response) => CreateCheckinOutcome {
            success: true,
            checkin_id: Some(response.checkin_id),
            message: None,
        },
        Err(ApiError::Client { message, .. }) => CreateCheckinOutcome {
            success: false,
            checkin_id: None,
            message: Some(backend_error(&message)),
        },
        Err(e) => {
            warn!("create checkin failed: {}", e);
            CreateCheckinOutcome {
                success: false,
                checkin_id: None,
                message: Some(e.to_string()),
            }
        }
    }
}

/// Fetch one check-in with its receipt fields.
pub async fn get_checkin(client: &ApiClient, checkin_id: i64) -> Result<Checkin, ApiError> {
    client.get(&format!("/checkins/{}", checkin_id), &[]).await
}

/// List all check-ins registered on a boarding.
pub async fn get_boarding_checkins(
    client: &ApiClient,
    boarding_id: i64,
) -> Result<Vec<Checkin>, ApiError> {
    client
        .get(&format!("/boardings/{}/checkins", boarding_id), &[])
        .await
}

#[derive(Deserialize)]
struct SuccessResponse {
    success: bool,
}

/// Refund a check-in. Returns whether the backend confirmed the refund.
pub async fn refund_checkin(client: &ApiClient, checkin_id: i64) -> Result<bool, ApiError> {
    let response: SuccessResponse = client
        .put(
            &format!("/checkins/{}/refund", checkin_id),
            &serde_json::json!({}),
        )
        .await?;
    Ok(response.success)
}
