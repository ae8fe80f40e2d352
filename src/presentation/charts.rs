use std::collections::BTreeMap;

use askama::Template;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::MineralRecord;
use crate::presentation::{format_number, script_json};

pub const TOP_PRODUCERS: usize = 10;

/// A Plotly figure (`data` + `layout`) ready to be embedded in a page.
#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub figure: Value,
}

#[derive(Template)]
#[template(path = "fragments/plotly.html")]
struct PlotlyTemplate {
    chart_id: String,
    figure_json: String,
}

impl Chart {
    pub fn render(&self) -> Result<String, AppError> {
        let template = PlotlyTemplate {
            chart_id: format!("chart-{}", uuid::Uuid::new_v4().simple()),
            figure_json: script_json(&self.figure),
        };
        Ok(template.render()?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_production: f64,
    pub total_reserves: f64,
    pub avg_price: f64,
    pub top_producer: String,
    pub top_producer_volume: f64,
}

/// Sum `value` per `key`, largest first. Ties keep alphabetical order.
pub fn sum_by<K, V>(records: &[MineralRecord], key: K, value: V) -> Vec<(String, f64)>
where
    K: Fn(&MineralRecord) -> &str,
    V: Fn(&MineralRecord) -> f64,
{
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        *totals.entry(key(record)).or_default() += value(record);
    }
    let mut sorted: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
    sorted
}

fn for_mineral(records: &[MineralRecord], mineral: &str) -> Vec<MineralRecord> {
    records
        .iter()
        .filter(|r| r.mineral_name.eq_ignore_ascii_case(mineral))
        .cloned()
        .collect()
}

fn production_by_country(records: &[MineralRecord]) -> Vec<(String, f64)> {
    sum_by(records, |r| r.country.as_str(), |r| r.production_volume)
}

/// Bar chart of one mineral's production per country.
pub fn production_by_country_chart(records: &[MineralRecord], mineral: &str) -> Option<Chart> {
    let totals = production_by_country(&for_mineral(records, mineral));
    if totals.is_empty() {
        return None;
    }
    let (countries, production): (Vec<String>, Vec<f64>) = totals.into_iter().unzip();
    let labels: Vec<String> = production.iter().map(|p| format_number(*p)).collect();
    let title = format!("{mineral} Production by Country");

    let figure = json!({
        "data": [{
            "type": "bar",
            "x": countries,
            "y": production,
            "text": labels,
            "textposition": "auto",
            "marker": {
                "color": production,
                "colorscale": "Viridis",
                "showscale": true,
                "colorbar": { "title": { "text": "Production<br>(tonnes)" } }
            }
        }],
        "layout": {
            "title": { "text": title },
            "xaxis": { "title": { "text": "Country" } },
            "yaxis": { "title": { "text": "Production Volume (tonnes)" } },
            "template": "plotly_white",
            "height": 500,
            "hovermode": "x"
        }
    });
    Some(Chart { title, figure })
}

/// Pie chart of one mineral's production share per country.
pub fn market_share_chart(records: &[MineralRecord], mineral: &str) -> Option<Chart> {
    let totals = production_by_country(&for_mineral(records, mineral));
    if totals.is_empty() {
        return None;
    }
    let (countries, production): (Vec<String>, Vec<f64>) = totals.into_iter().unzip();
    let title = format!("{mineral} Market Share by Country");

    let figure = json!({
        "data": [{
            "type": "pie",
            "labels": countries,
            "values": production,
            "hole": 0.3,
            "textinfo": "label+percent",
            "textposition": "outside"
        }],
        "layout": {
            "title": { "text": title },
            "height": 500
        }
    });
    Some(Chart { title, figure })
}

/// Average price per mineral, highest first.
pub fn average_prices(records: &[MineralRecord]) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = sums.entry(record.mineral_name.as_str()).or_default();
        entry.0 += record.price;
        entry.1 += 1;
    }
    let mut averages: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(name, (sum, n))| (name.to_string(), sum / n as f64))
        .collect();
    averages.sort_by(|a, b| b.1.total_cmp(&a.1));
    averages
}

pub fn price_comparison_chart(records: &[MineralRecord]) -> Option<Chart> {
    let averages = average_prices(records);
    if averages.is_empty() {
        return None;
    }
    let (minerals, prices): (Vec<String>, Vec<f64>) = averages.into_iter().unzip();
    let labels: Vec<String> = prices.iter().map(|p| format!("${}", format_number(*p))).collect();
    let title = "Average Mineral Prices".to_string();

    let figure = json!({
        "data": [{
            "type": "bar",
            "x": minerals,
            "y": prices,
            "text": labels,
            "textposition": "auto",
            "marker": {
                "color": prices,
                "colorscale": "RdYlGn",
                "reversescale": true,
                "showscale": true,
                "colorbar": { "title": { "text": "Price<br>(USD/tonne)" } }
            }
        }],
        "layout": {
            "title": { "text": title },
            "xaxis": { "title": { "text": "Mineral" }, "tickangle": -45 },
            "yaxis": { "title": { "text": "Price (USD per tonne)" } },
            "height": 500
        }
    });
    Some(Chart { title, figure })
}

/// Countries ranked by total production across all minerals.
pub fn top_producers(records: &[MineralRecord], limit: usize) -> Vec<(String, f64)> {
    let mut totals = production_by_country(records);
    totals.truncate(limit);
    totals
}

pub fn top_producers_chart(records: &[MineralRecord], limit: usize) -> Option<Chart> {
    let ranked = top_producers(records, limit);
    if ranked.is_empty() {
        return None;
    }
    let (countries, production): (Vec<String>, Vec<f64>) = ranked.into_iter().unzip();
    let labels: Vec<String> = production.iter().map(|p| format_number(*p)).collect();
    let title = format!("Top {limit} Producing Countries");

    let figure = json!({
        "data": [{
            "type": "bar",
            "orientation": "h",
            "y": countries,
            "x": production,
            "text": labels,
            "textposition": "auto",
            "marker": { "color": production, "colorscale": "Blues", "showscale": false }
        }],
        "layout": {
            "title": { "text": title },
            "xaxis": { "title": { "text": "Total Production (tonnes)" } },
            "yaxis": { "title": { "text": "Country" }, "autorange": "reversed" },
            "height": 500
        }
    });
    Some(Chart { title, figure })
}

/// Stacked bars of reserves per country, one trace per mineral. Countries
/// are matched case-insensitively and keep the order they were given in.
pub fn reserves_comparison_chart(records: &[MineralRecord], countries: &[String]) -> Option<Chart> {
    let mut unique: Vec<&String> = Vec::with_capacity(countries.len());
    for country in countries {
        if !unique.iter().any(|c| c.eq_ignore_ascii_case(country)) {
            unique.push(country);
        }
    }

    let mut per_mineral: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
    for country in &unique {
        for record in records
            .iter()
            .filter(|r| r.country.eq_ignore_ascii_case(country))
        {
            *per_mineral
                .entry(record.mineral_name.as_str())
                .or_default()
                .entry(country.as_str())
                .or_default() += record.reserves;
        }
    }
    if per_mineral.is_empty() {
        return None;
    }

    let traces: Vec<Value> = per_mineral
        .into_iter()
        .map(|(mineral, by_country)| {
            let (x, y): (Vec<&str>, Vec<f64>) = unique
                .iter()
                .filter_map(|c| by_country.get(c.as_str()).map(|r| (c.as_str(), *r)))
                .unzip();
            let labels: Vec<String> = y.iter().map(|r| format_number(*r)).collect();
            json!({
                "type": "bar",
                "name": mineral,
                "x": x,
                "y": y,
                "text": labels,
                "textposition": "auto"
            })
        })
        .collect();
    let title = "Mineral Reserves Comparison".to_string();

    let figure = json!({
        "data": traces,
        "layout": {
            "title": { "text": title },
            "xaxis": { "title": { "text": "Country" } },
            "yaxis": { "title": { "text": "Reserves (tonnes)" } },
            "barmode": "stack",
            "template": "plotly_white",
            "height": 500,
            "legend": { "orientation": "v", "yanchor": "top", "y": 1, "xanchor": "left", "x": 1.02 }
        }
    });
    Some(Chart { title, figure })
}

pub fn summary(records: &[MineralRecord]) -> SummaryStats {
    let total_production = records.iter().map(|r| r.production_volume).sum();
    let total_reserves = records.iter().map(|r| r.reserves).sum();
    let avg_price = if records.is_empty() {
        0.0
    } else {
        records.iter().map(|r| r.price).sum::<f64>() / records.len() as f64
    };
    let (top_producer, top_producer_volume) = production_by_country(records)
        .into_iter()
        .next()
        .unwrap_or_else(|| ("N/A".to_string(), 0.0));

    SummaryStats {
        total_production,
        total_reserves,
        avg_price,
        top_producer,
        top_producer_volume,
    }
}
