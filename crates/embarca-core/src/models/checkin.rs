use serde::{Deserialize, Serialize};

/// A vehicle check-in within a boarding, including the receipt fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkin {
    pub id: i64,
    /// Boarding this check-in belongs to.
    pub boarding: i64,
    pub plate: String,
    /// Passenger count.
    pub pax: i64,
    /// Vehicle category id chosen at check-in.
    pub vehicle: i64,
    pub value: f64,
    #[serde(default)]
    pub add_value: f64,
    #[serde(default)]
    pub observation: String,
    #[serde(default)]
    pub add_value_reason: String,
    pub date_in: String,
    #[serde(default)]
    pub refunded: bool,
    #[serde(default)]
    pub ferry_name: String,
    #[serde(default)]
    pub vehicle_category_name: String,
    #[serde(default)]
    pub vehicle_category_id: i64,
    #[serde(default)]
    pub vehicle_name: String,
}

impl Checkin {
    /// Total fare: base value plus any additional charge.
    pub fn total(&self) -> f64 {
        self.value + self.add_value
    }
}
