use std::collections::BTreeSet;

use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::Permission;
use crate::error::AppError;
use crate::flash::{self, Flash};
use crate::models::MineralRecord;
use crate::presentation::format_number;
use crate::state::SharedState;
use crate::views::minerals::MineralRow;
use crate::views::{render, Nav};

pub struct CountrySummary {
    pub name: String,
    pub mineral_count: usize,
    pub total_records: usize,
}

pub struct DepositLine {
    pub mineral: String,
    pub location_name: String,
    pub reserves: String,
    pub annual_production: String,
    pub status: String,
}

#[derive(Template)]
#[template(path = "countries/list.html")]
struct CountriesTemplate {
    nav: Nav,
    countries: Vec<CountrySummary>,
}

#[derive(Template)]
#[template(path = "countries/profile.html")]
struct ProfileTemplate {
    nav: Nav,
    name: String,
    minerals: Vec<MineralRow>,
    deposits: Vec<DepositLine>,
    unique_minerals: Vec<String>,
    mineral_count: usize,
    total_production: String,
    total_reserves: String,
}

fn distinct_minerals(records: &[MineralRecord]) -> Vec<String> {
    let names: BTreeSet<&str> = records.iter().map(|r| r.mineral_name.as_str()).collect();
    names.into_iter().map(str::to_string).collect()
}

pub async fn list(
    user: CurrentUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    user.require(Permission::ViewAll)?;
    let (jar, nav) = Nav::build(jar, Some(&user));

    let mut countries = Vec::new();
    for name in state.records.unique_countries().await {
        let records = state.records.by_country(&name).await;
        countries.push(CountrySummary {
            mineral_count: distinct_minerals(&records).len(),
            total_records: records.len(),
            name,
        });
    }

    let template = CountriesTemplate { nav, countries };
    Ok((jar, render(&template)?).into_response())
}

pub async fn profile(
    user: CurrentUser,
    State(state): State<SharedState>,
    Path(name): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    user.require(Permission::ViewAll)?;

    let records = state.records.by_country(&name).await;
    if records.is_empty() {
        let jar = flash::push(jar, &Flash::warning(format!("No data found for {name}")));
        return Ok((jar, Redirect::to("/countries")).into_response());
    }

    let (jar, nav) = Nav::build(jar, Some(&user));
    let deposits = state.records.deposits_for(None, Some(&name));
    let unique_minerals = distinct_minerals(&records);

    let template = ProfileTemplate {
        nav,
        // Display the stored spelling, not whatever casing the URL used.
        name: records[0].country.clone(),
        minerals: records.iter().map(MineralRow::from).collect(),
        deposits: deposits
            .iter()
            .map(|d| DepositLine {
                mineral: d.mineral.clone(),
                location_name: d.location_name.clone(),
                reserves: format_number(d.reserves),
                annual_production: format_number(d.annual_production),
                status: d.status.clone(),
            })
            .collect(),
        mineral_count: unique_minerals.len(),
        unique_minerals,
        total_production: format_number(records.iter().map(|r| r.production_volume).sum()),
        total_reserves: format_number(records.iter().map(|r| r.reserves).sum()),
    };
    Ok((jar, render(&template)?).into_response())
}
