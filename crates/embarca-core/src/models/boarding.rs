use serde::{Deserialize, Serialize};

/// One boarding session, as listed and detailed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boarding {
    pub boarding_id: i64,
    pub time_in: String,
    pub ferry_name: String,
    pub route_name: String,
    pub checkins_count: i64,
    /// 0 while the boarding is open, 1 once finished.
    pub closed: i64,
    pub agent_id: i64,
    pub agent_username: String,
    #[serde(default)]
    pub agent_data: serde_json::Value,
}

impl Boarding {
    pub fn is_closed(&self) -> bool {
        self.closed != 0
    }
}

/// A ferry available for boarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FerryItem {
    pub id: i64,
    pub name: String,
}

/// A route a boarding can be opened on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FerryRoute {
    pub id: i64,
    pub name: String,
}
