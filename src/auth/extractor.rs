use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::permissions::{Permission, Role};
use crate::auth::session::SESSION_COOKIE;
use crate::error::AppError;
use crate::state::SharedState;

/// The authenticated caller, resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.role.has(permission) {
            Ok(())
        } else {
            tracing::debug!(
                "{} ({}) denied {}",
                self.username,
                self.role,
                permission.as_str()
            );
            Err(AppError::Unauthorized(format!(
                "Your role does not allow {}",
                permission.as_str()
            )))
        }
    }
}

impl CurrentUser {
    /// Resolve the session cookie in `headers`, if it names a live session.
    pub fn from_headers(headers: &HeaderMap, state: &SharedState) -> Option<Self> {
        let jar = CookieJar::from_headers(headers);
        let cookie = jar.get(SESSION_COOKIE)?;
        let session = state.sessions.get(cookie.value())?;
        Some(CurrentUser {
            user_id: session.user_id,
            username: session.username,
            role: session.role,
        })
    }
}

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        CurrentUser::from_headers(&parts.headers, state).ok_or(AppError::Unauthenticated)
    }
}

/// Like [`CurrentUser`] but never rejects; public pages use it for the nav bar.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<SharedState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(CurrentUser::from_headers(&parts.headers, state)))
    }
}
