pub mod admin;
pub mod analytics;
pub mod auth;
pub mod countries;
pub mod dashboard;
pub mod map;
pub mod minerals;

use askama::Template;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use axum_extra::extract::CookieJar;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::Permission;
use crate::error::AppError;
use crate::flash::{self, Flash};
use crate::state::SharedState;

pub const APP_NAME: &str = "Chrono Minerals";

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        // Public
        .route("/", get(auth::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout))
        // Data views
        .route("/dashboard", get(dashboard::index))
        .route("/minerals", get(minerals::list))
        .route("/minerals/export", get(minerals::export))
        .route(
            "/minerals/{id}/edit",
            get(minerals::edit_page).post(minerals::edit),
        )
        .route("/map", get(map::index))
        .route("/countries", get(countries::list))
        .route("/country/{name}", get(countries::profile))
        // Analytics
        .route("/analytics", get(analytics::index))
        .route("/analytics/production/{mineral}", get(analytics::production))
        .route(
            "/analytics/market-share/{mineral}",
            get(analytics::market_share),
        )
        .route("/analytics/prices", get(analytics::prices))
        .route("/analytics/top-producers", get(analytics::top_producers))
        .route("/analytics/reserves", get(analytics::reserves))
        .route("/analytics/report", get(analytics::report))
        // Admin
        .route("/admin/users", get(admin::users_page))
}

/// Data every page needs for the shared layout.
#[derive(Debug, Clone)]
pub struct Nav {
    pub app_name: &'static str,
    pub authenticated: bool,
    pub username: String,
    pub role: String,
    pub can_view_analytics: bool,
    pub can_manage_users: bool,
    pub flash: Option<Flash>,
}

impl Nav {
    pub fn anonymous() -> Self {
        Self {
            app_name: APP_NAME,
            authenticated: false,
            username: String::new(),
            role: String::new(),
            can_view_analytics: false,
            can_manage_users: false,
            flash: None,
        }
    }

    /// Build the layout context, consuming any pending flash message.
    pub fn build(jar: CookieJar, user: Option<&CurrentUser>) -> (CookieJar, Self) {
        let (jar, flash) = flash::take(jar);
        let mut nav = Self::for_user(user);
        nav.flash = flash;
        (jar, nav)
    }

    /// Layout context without a flash message.
    pub fn for_user(user: Option<&CurrentUser>) -> Self {
        let mut nav = Self::anonymous();
        if let Some(user) = user {
            nav.authenticated = true;
            nav.username = user.username.clone();
            nav.role = user.role.to_string();
            nav.can_view_analytics = user.role.has(Permission::ViewAnalytics);
            nav.can_manage_users = user.role.has(Permission::ManageUsers);
        }
        nav
    }
}

/// `<select>` entry for the filter forms.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

pub fn select_options(values: Vec<String>, selected: Option<&str>) -> Vec<SelectOption> {
    values
        .into_iter()
        .map(|value| SelectOption {
            selected: selected.is_some_and(|s| s.eq_ignore_ascii_case(&value)),
            value,
        })
        .collect()
}

pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}
