use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A geolocated extraction site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: Uuid,
    pub mineral: String,
    pub location_name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub reserves: f64,
    pub annual_production: f64,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "Active".to_string()
}

impl Deposit {
    pub fn has_valid_coordinates(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}
