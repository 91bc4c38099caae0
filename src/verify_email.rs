//! The route that consumes email verification links.
//!
//! The link emailed at registration carries an opaque token. Following it
//! marks the matching account as verified and clears the token, so a link can
//! only be used once.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::html;
use serde::Deserialize;

use crate::{
    Error,
    app_state::StoreState,
    endpoints,
    html::{base, error_page, link},
    user::verify_email_by_token,
};

/// The query parameters of a verification link.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    /// The token from the emailed link.
    pub token: String,
}

/// A route handler that marks an email address as verified.
///
/// An unknown or already-used token renders an error page rather than a
/// redirect, since the visitor followed a stale link and should be told so.
pub async fn verify_email(
    State(state): State<StoreState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(_) => return Error::DatabaseLockError.into_response(),
    };

    match verify_email_by_token(&params.token, &connection) {
        Ok(()) => {}
        Err(Error::NotFound) => {
            return error_page(
                "This verification link is invalid",
                "It may have been used already. Try logging in, \
                or register again to receive a new link.",
            );
        }
        Err(error) => return error.into_response(),
    }

    let content = html! {
        div class="flex justify-center items-center min-h-screen p-4"
        {
            div class="bg-white dark:bg-gray-800 p-8 rounded-2xl shadow-xl w-96 text-center"
            {
                h1 class="text-2xl font-bold text-gray-700 dark:text-white" { "Email verified" }
                p class="text-gray-500 dark:text-gray-400 my-4"
                {
                    "Your account is ready to use."
                }
                p { (link(endpoints::LOG_IN_VIEW, "Log in")) }
            }
        }
    };

    base("Email Verified", &content).into_response()
}
