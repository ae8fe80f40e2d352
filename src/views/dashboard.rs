use askama::Template;
use axum::extract::State;
use axum::response::Html;
use axum_extra::extract::CookieJar;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::Permission;
use crate::error::AppError;
use crate::state::SharedState;
use crate::views::{render, Nav};

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    nav: Nav,
    total_minerals: usize,
    total_countries: usize,
    total_deposits: usize,
    unique_minerals: usize,
}

pub async fn index(
    user: CurrentUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    user.require(Permission::ViewAll)?;
    let (jar, nav) = Nav::build(jar, Some(&user));

    let records = &state.records;
    let template = DashboardTemplate {
        nav,
        total_minerals: records.count_minerals().await,
        total_countries: records.count_countries().await,
        total_deposits: records.count_deposits(),
        unique_minerals: records.unique_mineral_names().await.len(),
    };
    Ok((jar, render(&template)?))
}
