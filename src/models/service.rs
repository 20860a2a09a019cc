use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    /// Minutes.
    pub duration: i64,
    pub price: f64,
    /// Inactive services cannot be booked.
    pub active: bool,
}
