use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::views::Nav;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    InvalidCredentials,
    DuplicateUsername(String),
    Unauthenticated,
    Unauthorized(String),
    BadRequest(String),
    Internal(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::InvalidCredentials => write!(f, "Invalid username or password"),
            AppError::DuplicateUsername(name) => write!(f, "Username already exists: {name}"),
            AppError::Unauthenticated => write!(f, "Please log in to access this page."),
            AppError::Unauthorized(msg) => write!(f, "Forbidden: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Io(err) => write!(f, "I/O Error: {err}"),
            AppError::Json(err) => write!(f, "JSON Error: {err}"),
        }
    }
}

impl std::error::Error for AppError {}

/// Response marker for requests that need a session.
#[derive(Debug, Clone, Copy)]
pub struct LoginRequired;

/// Attached to rendered error pages so `middleware::error_pages` can redraw
/// them with the caller's navigation.
#[derive(Debug, Clone)]
pub struct ErrorPage {
    pub message: String,
}

#[derive(Template)]
#[template(path = "errors/error.html")]
struct ErrorTemplate {
    nav: Nav,
    code: u16,
    title: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // Turned into a redirect by `middleware::auth_redirect`.
            AppError::Unauthenticated => {
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                response.extensions_mut().insert(LoginRequired);
                return response;
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::DuplicateUsername(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::Unauthorized(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(_) | AppError::Io(_) | AppError::Json(_) => {
                tracing::error!("{self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong on our side.".to_string(),
                )
            }
        };

        error_page(status, message)
    }
}

/// Render the shared error page for an anonymous visitor.
pub fn error_page(status: StatusCode, message: String) -> Response {
    render_error_page(status, message, Nav::anonymous())
}

/// Render the shared error page. Falls back to plain text if the template fails.
pub fn render_error_page(status: StatusCode, message: String, nav: Nav) -> Response {
    let marker = ErrorPage {
        message: message.clone(),
    };
    let template = ErrorTemplate {
        nav,
        code: status.as_u16(),
        title: status
            .canonical_reason()
            .unwrap_or("Error")
            .to_string(),
        message,
    };
    let mut response = match template.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render error page: {e}");
            return (status, template.message).into_response();
        }
    };
    response.extensions_mut().insert(marker);
    response
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err)
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Internal(format!("Template rendering failed: {err}"))
    }
}
