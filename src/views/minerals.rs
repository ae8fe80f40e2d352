use std::collections::HashMap;

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::Permission;
use crate::error::AppError;
use crate::flash::{self, Flash};
use crate::models::{MineralPatch, MineralRecord};
use crate::presentation::{format_number, TableView};
use crate::state::SharedState;
use crate::store::MineralQuery;
use crate::views::{render, select_options, Nav, SelectOption};

pub struct MineralRow {
    pub id: String,
    pub mineral_name: String,
    pub country: String,
    pub production: String,
    pub reserves: String,
    pub price: String,
    pub uses: String,
    pub year: i32,
    pub unit: String,
}

impl From<&MineralRecord> for MineralRow {
    fn from(r: &MineralRecord) -> Self {
        Self {
            id: r.id.to_string(),
            mineral_name: r.mineral_name.clone(),
            country: r.country.clone(),
            production: format_number(r.production_volume),
            reserves: format_number(r.reserves),
            price: format!("${}", format_number(r.price)),
            uses: r.uses.clone(),
            year: r.year,
            unit: r.unit.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "minerals/list.html")]
struct MineralsTemplate {
    nav: Nav,
    rows: Vec<MineralRow>,
    count: usize,
    minerals: Vec<SelectOption>,
    countries: Vec<SelectOption>,
    export_query: String,
    can_edit: bool,
    can_export: bool,
}

#[derive(Template)]
#[template(path = "minerals/edit.html")]
struct EditTemplate {
    nav: Nav,
    error: Option<String>,
    id: String,
    mineral_name: String,
    country: String,
    production_volume: String,
    reserves: String,
    price: String,
    uses: String,
    year: String,
}

#[derive(Deserialize)]
pub struct EditForm {
    #[serde(default)]
    pub production_volume: String,
    #[serde(default)]
    pub reserves: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub uses: String,
    #[serde(default)]
    pub year: String,
}

impl EditForm {
    fn from_record(r: &MineralRecord) -> Self {
        Self {
            production_volume: r.production_volume.to_string(),
            reserves: r.reserves.to_string(),
            price: r.price.to_string(),
            uses: r.uses.clone(),
            year: r.year.to_string(),
        }
    }

    /// Blank numeric fields keep their current value.
    fn to_patch(&self) -> Result<MineralPatch, String> {
        fn number(label: &str, raw: &str) -> Result<Option<f64>, String> {
            let raw = raw.trim().replace(',', "");
            if raw.is_empty() {
                return Ok(None);
            }
            raw.parse()
                .map(Some)
                .map_err(|_| format!("{label} must be a number"))
        }

        let year = match self.year.trim() {
            "" => None,
            y => Some(y.parse().map_err(|_| "Year must be a whole number".to_string())?),
        };

        Ok(MineralPatch {
            production_volume: number("Production volume", &self.production_volume)?,
            reserves: number("Reserves", &self.reserves)?,
            price: number("Price", &self.price)?,
            uses: Some(self.uses.trim().to_string()),
            year,
        })
    }
}

fn query_string(params: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> =
        params.iter().filter(|(_, v)| !v.trim().is_empty()).collect();
    pairs.sort();
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}

pub async fn list(
    user: CurrentUser,
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    user.require(Permission::ViewAll)?;
    let (jar, nav) = Nav::build(jar, Some(&user));

    let query = MineralQuery::from_pairs(&params);
    let table = TableView::new(state.records.search(&query).await);

    let template = MineralsTemplate {
        nav,
        rows: table.rows.iter().map(MineralRow::from).collect(),
        count: table.count,
        minerals: select_options(
            state.records.unique_mineral_names().await,
            query.mineral_name.as_deref(),
        ),
        countries: select_options(
            state.records.unique_countries().await,
            query.country.as_deref(),
        ),
        export_query: query_string(&params),
        can_edit: user.role.has(Permission::EditAll),
        can_export: user.role.has(Permission::ExportData),
    };
    Ok((jar, render(&template)?))
}

/// The filtered mineral table as a CSV download.
pub async fn export(
    user: CurrentUser,
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    user.require(Permission::ExportData)?;

    let records = state
        .records
        .search(&MineralQuery::from_pairs(&params))
        .await;

    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in &records {
        writer
            .serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV export failed: {e}")))?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV export failed: {e}")))?;

    tracing::info!("{} exported {} mineral records", user.username, records.len());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"minerals.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

fn edit_form(
    user: &CurrentUser,
    jar: CookieJar,
    status: StatusCode,
    record: &MineralRecord,
    form: EditForm,
    error: Option<String>,
) -> Result<Response, AppError> {
    let (jar, nav) = Nav::build(jar, Some(user));
    let template = EditTemplate {
        nav,
        error,
        id: record.id.to_string(),
        mineral_name: record.mineral_name.clone(),
        country: record.country.clone(),
        production_volume: form.production_volume,
        reserves: form.reserves,
        price: form.price,
        uses: form.uses,
        year: form.year,
    };
    Ok((status, jar, render(&template)?).into_response())
}

pub async fn edit_page(
    user: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    user.require(Permission::EditAll)?;
    let record = state.records.mineral(id).await?;
    let form = EditForm::from_record(&record);
    edit_form(&user, jar, StatusCode::OK, &record, form, None)
}

pub async fn edit(
    user: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<EditForm>,
) -> Result<Response, AppError> {
    user.require(Permission::EditAll)?;
    let record = state.records.mineral(id).await?;

    let patch = match form.to_patch() {
        Ok(patch) => patch,
        Err(msg) => {
            return edit_form(&user, jar, StatusCode::BAD_REQUEST, &record, form, Some(msg));
        }
    };

    match state.records.update_mineral(id, patch).await {
        Ok(updated) => {
            let jar = flash::push(
                jar,
                &Flash::success(format!(
                    "Updated {} in {}",
                    updated.mineral_name, updated.country
                )),
            );
            Ok((jar, Redirect::to("/minerals")).into_response())
        }
        Err(AppError::BadRequest(msg)) => {
            edit_form(&user, jar, StatusCode::BAD_REQUEST, &record, form, Some(msg))
        }
        Err(e) => Err(e),
    }
}
