//! Vehicle category listing.

use tracing::warn;

use crate::api::ApiClient;
use crate::models::Vehicle;

/// List vehicle categories and fares.
///
/// The check-in form treats this list as optional; failures degrade to an
/// empty list rather than blocking the screen.
pub async fn get_vehicles_list(client: &ApiClient) -> Vec<Vehicle> {
    match client.get("/vehicles", &[]).await {
        Ok(vehicles) => vehicles,
        Err(e) => {
            warn!("failed to fetch vehicles: {}", e);
            Vec::new()
        }
    }
}
