use std::collections::BTreeMap;

use askama::Template;
use serde_json::json;

use crate::error::AppError;
use crate::models::Deposit;
use crate::presentation::{format_number, script_json};

const DEFAULT_CENTER: (f64, f64) = (0.0, 20.0);
const DEFAULT_ZOOM: u8 = 3;

pub fn status_color(status: &str) -> &'static str {
    match status.to_ascii_lowercase().as_str() {
        "active" | "producing" => "#28a745",
        "development" | "construction" => "#e67e22",
        "exploration" | "prospect" => "#3186cc",
        "inactive" | "closed" | "care and maintenance" => "#7f8c8d",
        _ => "#8e44ad",
    }
}

/// Deposits grouped by status, with the initial viewport.
#[derive(Debug, Clone)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub buckets: BTreeMap<String, Vec<Deposit>>,
}

#[derive(Template)]
#[template(path = "fragments/map_popup.html")]
struct PopupTemplate<'a> {
    deposit: &'a Deposit,
    reserves: String,
    production: String,
    color: &'static str,
}

#[derive(Template)]
#[template(path = "fragments/leaflet.html")]
struct LeafletTemplate {
    map_id: String,
    center_lat: f64,
    center_lon: f64,
    zoom: u8,
    markers_json: String,
    legend: Vec<LegendEntry>,
}

struct LegendEntry {
    status: String,
    color: &'static str,
    count: usize,
}

impl MapView {
    pub fn new(deposits: &[Deposit]) -> Self {
        let mut buckets: BTreeMap<String, Vec<Deposit>> = BTreeMap::new();
        for deposit in deposits {
            buckets
                .entry(deposit.status.clone())
                .or_default()
                .push(deposit.clone());
        }

        Self {
            center: bounding_center(deposits),
            zoom: DEFAULT_ZOOM,
            buckets,
        }
    }

    pub fn marker_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// A self-contained Leaflet fragment: stylesheet, script, container and markers.
    pub fn render(&self) -> Result<String, AppError> {
        let mut markers = Vec::with_capacity(self.marker_count());
        for (status, deposits) in &self.buckets {
            let color = status_color(status);
            for deposit in deposits {
                let popup = PopupTemplate {
                    deposit,
                    reserves: format_number(deposit.reserves),
                    production: format_number(deposit.annual_production),
                    color,
                }
                .render()?;
                markers.push(json!({
                    "lat": deposit.latitude,
                    "lon": deposit.longitude,
                    "color": color,
                    "tooltip": format!("{} - {}", deposit.mineral, deposit.location_name),
                    "popup": popup,
                }));
            }
        }

        let legend = self
            .buckets
            .iter()
            .map(|(status, deposits)| LegendEntry {
                status: status.clone(),
                color: status_color(status),
                count: deposits.len(),
            })
            .collect();

        let template = LeafletTemplate {
            map_id: format!("map-{}", uuid::Uuid::new_v4().simple()),
            center_lat: self.center.0,
            center_lon: self.center.1,
            zoom: self.zoom,
            markers_json: script_json(&serde_json::Value::Array(markers)),
            legend,
        };
        Ok(template.render()?)
    }
}

/// Midpoint of the bounding box around all deposits.
pub fn bounding_center(deposits: &[Deposit]) -> (f64, f64) {
    let Some(first) = deposits.first() else {
        return DEFAULT_CENTER;
    };

    let init = (first.latitude, first.latitude, first.longitude, first.longitude);
    let (min_lat, max_lat, min_lon, max_lon) =
        deposits.iter().fold(init, |(lo_lat, hi_lat, lo_lon, hi_lon), d| {
            (
                lo_lat.min(d.latitude),
                hi_lat.max(d.latitude),
                lo_lon.min(d.longitude),
                hi_lon.max(d.longitude),
            )
        });

    ((min_lat + max_lat) / 2.0, (min_lon + max_lon) / 2.0)
}
