//! One-shot messages that survive a redirect, carried in a cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    /// Bootstrap alert level: success, info or warning.
    pub level: String,
    pub message: String,
}

impl Flash {
    fn new(level: &str, message: impl Into<String>) -> Self {
        Self {
            level: level.to_string(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new("success", message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new("info", message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new("warning", message)
    }
}

/// Queue `flash` for the next rendered page.
pub fn push(jar: CookieJar, flash: &Flash) -> CookieJar {
    let Ok(bytes) = serde_json::to_vec(flash) else {
        return jar;
    };
    let cookie = Cookie::build((FLASH_COOKIE, hex::encode(bytes)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(5))
        .build();
    jar.add(cookie)
}

/// Read and clear the pending flash, if any.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let flash = hex::decode(cookie.value())
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok());

    let cleared = Cookie::build((FLASH_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    (jar.add(cleared), flash)
}
