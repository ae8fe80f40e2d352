pub mod auth;
pub mod config;
pub mod error;
pub mod flash;
pub mod loader;
pub mod middleware;
pub mod models;
pub mod presentation;
pub mod rate_limit;
pub mod state;
pub mod store;
pub mod views;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::session::SessionStore;
use crate::config::Config;
use crate::error::error_page;
use crate::loader::LoadError;
use crate::middleware::auth_redirect::redirect_unauthenticated;
use crate::middleware::error_pages::with_user_nav;
use crate::rate_limit::LoginRateLimiter;
use crate::state::{AppState, SharedState};
use crate::store::{AccountStore, RecordStore};

/// Load every collection named by `config`, building the record files from
/// the spreadsheet on first run.
pub async fn load_state(config: Config) -> Result<SharedState, LoadError> {
    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .map_err(|source| LoadError::Io {
            path: config.data_dir.clone(),
            source,
        })?;

    let dataset = loader::load_or_build(&config).await?;
    let records = RecordStore::new(config.minerals_file(), dataset);
    let accounts = AccountStore::open(config.users_file(), config.seed_users).await?;

    tracing::info!(
        "Loaded {} mineral records, {} countries, {} deposits",
        records.count_minerals().await,
        records.count_countries().await,
        records.count_deposits()
    );

    Ok(Arc::new(AppState {
        sessions: SessionStore::new(chrono::Duration::hours(config.session_hours)),
        login_limiter: LoginRateLimiter::new(),
        config,
        accounts,
        records,
    }))
}

pub fn build_app(state: SharedState) -> Router {
    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    Router::new()
        .merge(views::view_routes().layer(axum::middleware::from_fn(redirect_unauthenticated)))
        .nest_service("/static", ServeDir::new("static"))
        .route("/health", axum::routing::get(health))
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(state.clone(), with_user_nav))
        .layer(security_headers)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> Response {
    error_page(
        StatusCode::NOT_FOUND,
        "The page you were looking for does not exist.".to_string(),
    )
}
