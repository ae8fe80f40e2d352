use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::error::LoginRequired;
use crate::flash::{self, Flash};

/// Middleware that sends requests without a session to `/login` with a notice.
pub async fn redirect_unauthenticated(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.extensions().get::<LoginRequired>().is_some() {
        let jar = flash::push(
            CookieJar::new(),
            &Flash::warning("Please log in to access this page."),
        );
        (jar, Redirect::to("/login")).into_response()
    } else {
        response
    }
}
