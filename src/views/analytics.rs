use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::Permission;
use crate::error::AppError;
use crate::presentation::charts::{self, Chart, TOP_PRODUCERS};
use crate::presentation::format_number;
use crate::state::SharedState;
use crate::views::{render, Nav};

#[derive(Template)]
#[template(path = "analytics/index.html")]
struct AnalyticsTemplate {
    nav: Nav,
    total_production: String,
    total_reserves: String,
    avg_price: String,
    top_producer: String,
    top_producer_volume: String,
    minerals: Vec<String>,
    can_download: bool,
}

/// Link to the same chart for another mineral.
struct MineralLink {
    name: String,
    current: bool,
}

#[derive(Template)]
#[template(path = "analytics/chart.html")]
struct ChartTemplate {
    nav: Nav,
    title: String,
    chart_html: Option<String>,
    link_base: String,
    links: Vec<MineralLink>,
}

pub async fn index(
    user: CurrentUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    user.require(Permission::ViewAnalytics)?;
    let (jar, nav) = Nav::build(jar, Some(&user));

    let stats = charts::summary(&state.records.all_minerals().await);
    let template = AnalyticsTemplate {
        nav,
        total_production: format_number(stats.total_production),
        total_reserves: format_number(stats.total_reserves),
        avg_price: format_number(stats.avg_price),
        top_producer: stats.top_producer,
        top_producer_volume: format_number(stats.top_producer_volume),
        minerals: state.records.unique_mineral_names().await,
        can_download: user.role.has(Permission::DownloadReports),
    };
    Ok((jar, render(&template)?))
}

async fn chart_page(
    user: &CurrentUser,
    state: &SharedState,
    jar: CookieJar,
    title: String,
    chart: Option<Chart>,
    mineral_links: Option<(&str, &str)>,
) -> Result<(CookieJar, Html<String>), AppError> {
    let (jar, nav) = Nav::build(jar, Some(user));

    let (link_base, links) = match mineral_links {
        Some((base, current)) => {
            let links = state
                .records
                .unique_mineral_names()
                .await
                .into_iter()
                .map(|name| MineralLink {
                    current: name.eq_ignore_ascii_case(current),
                    name,
                })
                .collect();
            (base.to_string(), links)
        }
        None => (String::new(), Vec::new()),
    };

    let template = ChartTemplate {
        nav,
        title: chart.as_ref().map_or(title, |c| c.title.clone()),
        chart_html: chart.map(|c| c.render()).transpose()?,
        link_base,
        links,
    };
    Ok((jar, render(&template)?))
}

pub async fn production(
    user: CurrentUser,
    State(state): State<SharedState>,
    Path(mineral): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    user.require(Permission::ViewAnalytics)?;
    let records = state.records.all_minerals().await;
    let chart = charts::production_by_country_chart(&records, &mineral);
    chart_page(
        &user,
        &state,
        jar,
        format!("{mineral} Production by Country"),
        chart,
        Some(("/analytics/production/", mineral.as_str())),
    )
    .await
}

pub async fn market_share(
    user: CurrentUser,
    State(state): State<SharedState>,
    Path(mineral): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    user.require(Permission::ViewAnalytics)?;
    let records = state.records.all_minerals().await;
    let chart = charts::market_share_chart(&records, &mineral);
    chart_page(
        &user,
        &state,
        jar,
        format!("{mineral} Market Share by Country"),
        chart,
        Some(("/analytics/market-share/", mineral.as_str())),
    )
    .await
}

pub async fn prices(
    user: CurrentUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    user.require(Permission::ViewAnalytics)?;
    let records = state.records.all_minerals().await;
    let chart = charts::price_comparison_chart(&records);
    chart_page(
        &user,
        &state,
        jar,
        "Average Mineral Prices".to_string(),
        chart,
        None,
    )
    .await
}

pub async fn top_producers(
    user: CurrentUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    user.require(Permission::ViewAnalytics)?;
    let records = state.records.all_minerals().await;
    let chart = charts::top_producers_chart(&records, TOP_PRODUCERS);
    chart_page(
        &user,
        &state,
        jar,
        format!("Top {TOP_PRODUCERS} Producing Countries"),
        chart,
        None,
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct ReservesQuery {
    /// Comma-separated country names.
    countries: Option<String>,
}

/// Reserves per mineral for the requested countries, or the top producers
/// when none are named.
pub async fn reserves(
    user: CurrentUser,
    State(state): State<SharedState>,
    Query(query): Query<ReservesQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    user.require(Permission::ViewAnalytics)?;
    let records = state.records.all_minerals().await;

    let requested: Vec<String> = query
        .countries
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    let countries = if requested.is_empty() {
        charts::top_producers(&records, TOP_PRODUCERS)
            .into_iter()
            .map(|(country, _)| country)
            .collect()
    } else {
        requested
    };

    let chart = charts::reserves_comparison_chart(&records, &countries);
    chart_page(
        &user,
        &state,
        jar,
        "Mineral Reserves Comparison".to_string(),
        chart,
        None,
    )
    .await
}

/// Summary figures as a downloadable JSON document.
pub async fn report(
    user: CurrentUser,
    State(state): State<SharedState>,
) -> Result<Response, AppError> {
    user.require(Permission::DownloadReports)?;
    let records = state.records.all_minerals().await;

    let top: Vec<_> = charts::top_producers(&records, TOP_PRODUCERS)
        .into_iter()
        .map(|(country, production)| json!({ "country": country, "production": production }))
        .collect();
    let prices: Vec<_> = charts::average_prices(&records)
        .into_iter()
        .map(|(mineral, price)| json!({ "mineral": mineral, "average_price": price }))
        .collect();

    let body = json!({
        "generated_at": Utc::now(),
        "generated_by": user.username,
        "summary": charts::summary(&records),
        "top_producers": top,
        "average_prices": prices,
    });

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"minerals-report.json\"",
        )],
        Json(body),
    )
        .into_response())
}
