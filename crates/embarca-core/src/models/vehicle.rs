use serde::{Deserialize, Serialize};

/// A vehicle category with its fare, as listed by `GET /vehicles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category_id: i64,
    #[serde(default)]
    pub category_name: String,
    /// Base fare for this category.
    pub value: f64,
}
