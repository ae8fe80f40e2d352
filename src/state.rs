use std::sync::Arc;

use crate::auth::session::SessionStore;
use crate::config::Config;
use crate::rate_limit::LoginRateLimiter;
use crate::store::{AccountStore, RecordStore};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub accounts: AccountStore,
    pub records: RecordStore,
    pub sessions: SessionStore,
    pub login_limiter: LoginRateLimiter,
}
