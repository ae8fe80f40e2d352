use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineralRecord {
    pub id: Uuid,
    pub mineral_name: String,
    pub country: String,
    pub production_volume: f64,
    pub reserves: f64,
    pub price: f64,
    pub uses: String,
    pub year: i32,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

fn default_unit() -> String {
    "tonnes".to_string()
}

/// Editable fields of a mineral record. `None` leaves the field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MineralPatch {
    pub production_volume: Option<f64>,
    pub reserves: Option<f64>,
    pub price: Option<f64>,
    pub uses: Option<String>,
    pub year: Option<i32>,
}

impl MineralRecord {
    pub fn apply(&mut self, patch: MineralPatch) {
        if let Some(v) = patch.production_volume {
            self.production_volume = v;
        }
        if let Some(v) = patch.reserves {
            self.reserves = v;
        }
        if let Some(v) = patch.price {
            self.price = v;
        }
        if let Some(v) = patch.uses {
            self.uses = v;
        }
        if let Some(v) = patch.year {
            self.year = v;
        }
    }
}
