use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::permissions::Role;
use crate::models::UserView;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Server-side sessions. The cookie carries an opaque random token; only its
/// SHA-256 digest is kept here.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Open a session for `user` and return the token to hand to the client.
    pub fn create(&self, user: &UserView) -> String {
        let token = generate_token();
        let session = Session {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.insert(hash_token(&token), session);
        token
    }

    /// Look up a live session. Expired sessions are dropped on the way.
    pub fn get(&self, token: &str) -> Option<Session> {
        let key = hash_token(token);
        let session = self.sessions.get(&key)?.clone();
        if session.expires_at <= Utc::now() {
            self.sessions.remove(&key);
            return None;
        }
        Some(session)
    }

    pub fn destroy(&self, token: &str) {
        self.sessions.remove(&hash_token(token));
    }

    pub fn cleanup(&self) {
        let now = Utc::now();
        self.sessions.retain(|_, session| session.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
