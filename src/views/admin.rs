use askama::Template;
use axum::extract::State;
use axum::response::Html;
use axum_extra::extract::CookieJar;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::Permission;
use crate::error::AppError;
use crate::models::UserView;
use crate::state::SharedState;
use crate::views::{render, Nav};

#[derive(Template)]
#[template(path = "admin/users.html")]
struct UsersTemplate {
    nav: Nav,
    users: Vec<UserLine>,
}

struct UserLine {
    username: String,
    email: String,
    role: String,
    created_at: String,
}

impl From<UserView> for UserLine {
    fn from(user: UserView) -> Self {
        Self {
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            created_at: user.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

pub async fn users_page(
    user: CurrentUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    user.require(Permission::ManageUsers)?;
    let (jar, nav) = Nav::build(jar, Some(&user));

    let users = state
        .accounts
        .list()
        .await
        .into_iter()
        .map(UserLine::from)
        .collect();

    let template = UsersTemplate { nav, users };
    Ok((jar, render(&template)?))
}
