//! Boarding session operations.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::api::{ApiClient, ApiError};
use crate::models::{Boarding, FerryItem, FerryRoute};
use crate::utils::format::mariadb_timestamp;

/// Ferries available to open a boarding on.
pub async fn get_ferries(client: &ApiClient) -> Result<Vec<FerryItem>, ApiError> {
    client.get("/ferries", &[]).await
}

/// Routes a boarding can be opened on.
pub async fn get_ferry_routes(client: &ApiClient) -> Result<Vec<FerryRoute>, ApiError> {
    client.get("/boardings/routes", &[]).await
}

/// Outcome of opening a boarding.
///
/// The backend answers 409 when the agent already has an open boarding; when
/// it includes that boarding's id the caller may continue it instead.
#[derive(Debug, Clone, PartialEq)]
pub struct InitBoardingOutcome {
    pub success: bool,
    pub continue_existing: bool,
    pub boarding_id: Option<i64>,
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct InitBoardingResponse {
    boarding_id: i64,
}

#[derive(Deserialize)]
struct ConflictBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    boarding_id: Option<i64>,
}

/// Open a new boarding for a ferry and route.
pub async fn init_boarding(
    client: &ApiClient,
    ferry_id: i64,
    route_id: i64,
    date: DateTime<Utc>,
) -> InitBoardingOutcome {
    let body = serde_json::json!({
        "ferry": ferry_id,
        "route": route_id,
        "date_in": mariadb_timestamp(date),
    });

    match client.post::<InitBoardingResponse, _>("/boardings", &body).await {
        Ok(response) => InitBoardingOutcome {
            success: true,
            continue_existing: false,
            boarding_id: Some(response.boarding_id),
            message: None,
        },
        Err(ApiError::Client { status: 409, message }) => {
            let conflict: ConflictBody = serde_json::from_str(&message).unwrap_or(ConflictBody {
                error: None,
                boarding_id: None,
            });
            match conflict.boarding_id {
                Some(boarding_id) => InitBoardingOutcome {
                    success: true,
                    continue_existing: true,
                    boarding_id: Some(boarding_id),
                    message: conflict.error,
                },
                None => InitBoardingOutcome {
                    success: false,
                    continue_existing: false,
                    boarding_id: None,
                    message: Some(conflict.error.unwrap_or_else(|| "conflict detected".to_string())),
                },
            }
        }
        Err(e) => {
            warn!("init boarding failed: {}", e);
            InitBoardingOutcome {
                success: false,
                continue_existing: false,
                boarding_id: None,
                message: Some(e.to_string()),
            }
        }
    }
}

/// Fetch one boarding with its header data.
pub async fn get_boarding(client: &ApiClient, boarding_id: i64) -> Result<Boarding, ApiError> {
    client.get(&format!("/boardings/{}", boarding_id), &[]).await
}

#[derive(Deserialize)]
struct SuccessResponse {
    success: bool,
}

/// Close a boarding. Returns whether the backend confirmed the close.
pub async fn finish_boarding(client: &ApiClient, boarding_id: i64) -> Result<bool, ApiError> {
    let response: SuccessResponse = client
        .put(
            &format!("/boardings/{}/finish", boarding_id),
            &serde_json::json!({}),
        )
        .await?;
    Ok(response.success)
}

/// List boardings in a date window for the daily/weekly reports.
pub async fn get_boardings(
    client: &ApiClient,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    closed: bool,
) -> Result<Vec<Boarding>, ApiError> {
    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(start) = start {
        query.push(("start", mariadb_timestamp(start)));
    }
    if let Some(end) = end {
        query.push(("end", mariadb_timestamp(end)));
    }
    query.push(("closed", if closed { "true" } else { "false" }.to_string()));

    client.get("/boardings", &query).await
}
