//! Log-out route handler that invalidates the auth cookie and redirects the
//! client back to the log in page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;

use crate::{auth_cookie::invalidate_auth_cookie, endpoints};

/// Invalidate the auth cookie and redirect the client to the log-in page.
///
/// The log out button submits via HTMX, so the redirect is an HX-Redirect
/// header rather than a Location header.
pub async fn log_out(jar: PrivateCookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar);

    (
        StatusCode::SEE_OTHER,
        HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
        jar,
    )
        .into_response()
}
