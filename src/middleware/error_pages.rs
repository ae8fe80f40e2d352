use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::extractor::CurrentUser;
use crate::error::{render_error_page, ErrorPage};
use crate::state::SharedState;
use crate::views::Nav;

/// Redraw error pages with the signed-in user's navigation.
pub async fn with_user_nav(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    let user = CurrentUser::from_headers(req.headers(), &state);
    let response = next.run(req).await;

    let Some(user) = user else {
        return response;
    };
    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };
    render_error_page(response.status(), page.message, Nav::for_user(Some(&user)))
}
