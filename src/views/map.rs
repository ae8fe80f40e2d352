use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::Permission;
use crate::error::AppError;
use crate::models::Deposit;
use crate::presentation::{format_number, MapView};
use crate::state::SharedState;
use crate::views::{render, select_options, Nav, SelectOption};

#[derive(Deserialize)]
pub struct MapParams {
    pub mineral: Option<String>,
    pub country: Option<String>,
}

struct DepositRow {
    mineral: String,
    location_name: String,
    country: String,
    reserves: String,
    annual_production: String,
    status: String,
}

impl From<&Deposit> for DepositRow {
    fn from(d: &Deposit) -> Self {
        Self {
            mineral: d.mineral.clone(),
            location_name: d.location_name.clone(),
            country: d.country.clone(),
            reserves: format_number(d.reserves),
            annual_production: format_number(d.annual_production),
            status: d.status.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "map.html")]
struct MapTemplate {
    nav: Nav,
    map_html: String,
    deposits: Vec<DepositRow>,
    minerals: Vec<SelectOption>,
    countries: Vec<SelectOption>,
}

pub async fn index(
    user: CurrentUser,
    State(state): State<SharedState>,
    Query(params): Query<MapParams>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    user.require(Permission::ViewAll)?;
    let (jar, nav) = Nav::build(jar, Some(&user));

    let deposits = state
        .records
        .deposits_for(params.mineral.as_deref(), params.country.as_deref());
    let view = MapView::new(&deposits);

    let template = MapTemplate {
        nav,
        map_html: view.render()?,
        deposits: deposits.iter().map(DepositRow::from).collect(),
        minerals: select_options(
            state.records.unique_mineral_names().await,
            params.mineral.as_deref(),
        ),
        countries: select_options(
            state.records.unique_countries().await,
            params.country.as_deref(),
        ),
    };
    Ok((jar, render(&template)?))
}
