use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::auth::extractor::MaybeUser;
use crate::auth::permissions::Role;
use crate::auth::session::{self, SESSION_COOKIE};
use crate::config::RegistrationMode;
use crate::error::AppError;
use crate::flash::{self, Flash};
use crate::state::SharedState;
use crate::views::{render, Nav};

const SELF_SERVICE_ROLES: [Role; 2] = [Role::Investor, Role::Researcher];

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    nav: Nav,
    registration_open: bool,
}

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    nav: Nav,
    error: Option<String>,
    username: String,
    registration_open: bool,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    nav: Nav,
    error: Option<String>,
    username: String,
    email: String,
    roles: Vec<&'static str>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    pub role: Option<String>,
}

fn registration_open(state: &SharedState) -> bool {
    state.config.registration == RegistrationMode::Open
}

pub async fn index(
    State(state): State<SharedState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    let (jar, nav) = Nav::build(jar, None);
    let template = IndexTemplate {
        nav,
        registration_open: registration_open(&state),
    };
    Ok((jar, render(&template)?).into_response())
}

fn login_form(
    state: &SharedState,
    jar: CookieJar,
    status: StatusCode,
    error: Option<String>,
    username: String,
) -> Result<Response, AppError> {
    let (jar, nav) = Nav::build(jar, None);
    let template = LoginTemplate {
        nav,
        error,
        username,
        registration_open: registration_open(state),
    };
    Ok((status, jar, render(&template)?).into_response())
}

pub async fn login_page(
    State(state): State<SharedState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    login_form(&state, jar, StatusCode::OK, None, String::new())
}

pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim().to_string();

    if let Err(retry_after) = state.login_limiter.check(&username) {
        tracing::warn!("Login for {username} blocked by rate limiter");
        let minutes = retry_after.div_ceil(60).max(1);
        return login_form(
            &state,
            jar,
            StatusCode::TOO_MANY_REQUESTS,
            Some(format!(
                "Too many login attempts. Please try again in {minutes} minute(s)."
            )),
            username,
        );
    }

    match state.accounts.login(&username, &form.password).await {
        Ok(user) => {
            state.login_limiter.clear(&username);
            let token = state.sessions.create(&user);
            let cookie = session::session_cookie(
                &token,
                state.sessions.ttl(),
                state.config.secure_cookies,
            );
            tracing::info!("{} logged in as {}", user.username, user.role);
            let jar = flash::push(
                jar.add(cookie),
                &Flash::success(format!("Welcome back, {}!", user.username)),
            );
            Ok((jar, Redirect::to("/dashboard")).into_response())
        }
        Err(AppError::NotFound(_) | AppError::InvalidCredentials) => {
            state.login_limiter.record_failure(&username);
            tracing::info!("Failed login for {username}");
            login_form(
                &state,
                jar,
                StatusCode::UNAUTHORIZED,
                Some(AppError::InvalidCredentials.to_string()),
                username,
            )
        }
        Err(e) => Err(e),
    }
}

fn register_form(
    jar: CookieJar,
    status: StatusCode,
    error: Option<String>,
    username: String,
    email: String,
) -> Result<Response, AppError> {
    let (jar, nav) = Nav::build(jar, None);
    let template = RegisterTemplate {
        nav,
        error,
        username,
        email,
        roles: SELF_SERVICE_ROLES.iter().map(|r| r.as_str()).collect(),
    };
    Ok((status, jar, render(&template)?).into_response())
}

fn require_open_registration(state: &SharedState) -> Result<(), AppError> {
    if registration_open(state) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(
            "Registration is closed. Ask an administrator for an account.".to_string(),
        ))
    }
}

pub async fn register_page(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    require_open_registration(&state)?;
    register_form(jar, StatusCode::OK, None, String::new(), String::new())
}

pub async fn register(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    require_open_registration(&state)?;

    let role = match form.role.as_deref().map(str::trim) {
        None | Some("") => Role::Researcher,
        Some(name) => match name.parse::<Role>() {
            Ok(role) if SELF_SERVICE_ROLES.contains(&role) => role,
            _ => {
                return register_form(
                    jar,
                    StatusCode::BAD_REQUEST,
                    Some(format!("'{name}' is not a role you can sign up for")),
                    form.username,
                    form.email,
                );
            }
        },
    };

    match state
        .accounts
        .register(&form.username, &form.password, &form.email, role)
        .await
    {
        Ok(_) => {
            let jar = flash::push(jar, &Flash::success("Registration successful! Please log in."));
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(AppError::DuplicateUsername(_)) => register_form(
            jar,
            StatusCode::CONFLICT,
            Some("Username already exists".to_string()),
            form.username,
            form.email,
        ),
        Err(AppError::BadRequest(msg)) => register_form(
            jar,
            StatusCode::BAD_REQUEST,
            Some(msg),
            form.username,
            form.email,
        ),
        Err(e) => Err(e),
    }
}

pub async fn logout(
    State(state): State<SharedState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.destroy(cookie.value());
    }
    let name = user.map_or_else(|| "User".to_string(), |u| u.username);
    let jar = flash::push(
        jar.add(session::clear_session_cookie()),
        &Flash::info(format!("Goodbye, {name}!")),
    );
    (jar, Redirect::to("/"))
}
