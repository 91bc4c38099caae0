//! Spendbook is a web app for tracking personal income and expenses.
//!
//! Users register with an email address from an allowed domain, verify the
//! address via an emailed link, and then record signed transactions (positive
//! amounts are income, negative amounts are expenses) on a single tracker
//! page that shows the running balance.
//!
//! This library serves HTML pages directly from its route handlers.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth_cookie;
mod auth_middleware;
mod connectivity;
mod db;
mod endpoints;
mod forgot_password;
mod html;
mod ledger;
mod log_in;
mod log_out;
mod logging;
mod mailer;
mod pagination;
mod password;
mod registration;
mod routing;
mod session_gate;
mod transaction;
mod user;
mod verify_email;

pub use app_state::AppState;
pub use connectivity::{AlwaysOnline, ConnectivityProbe};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use mailer::{LogMailer, Mailer};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID};

use crate::{alert::alert_error, html::error_page};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email/password combination did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The credentials were correct but the email address has not been
    /// verified yet. Log-in must be refused until the verification link has
    /// been followed.
    #[error("email address has not been verified")]
    EmailNotVerified,

    /// The string used during registration is not a well-formed email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email address does not belong to one of the domains that are
    /// allowed to register. The string lists the allowed domains.
    #[error("email must belong to one of the allowed domains: {0}")]
    EmailNotAllowed(String),

    /// The email address is already registered.
    #[error("this email address is already registered")]
    EmailTaken,

    /// The password has fewer characters than the configured minimum.
    #[error("password should be at least {0} characters long")]
    PasswordTooShort(usize),

    /// The password and its confirmation did not match.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// A transaction was submitted without a description.
    #[error("description cannot be empty")]
    EmptyDescription,

    /// The transaction description exceeds the maximum length.
    #[error("description cannot be longer than {0} characters")]
    DescriptionTooLong(usize),

    /// The amount text is not an optional minus sign followed by digits with
    /// at most one decimal point, or it is too long to be accepted.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// The connectivity probe reported that the device is offline, so no
    /// backend call was attempted.
    #[error("no internet connection")]
    Offline,

    /// An email could not be handed over for delivery.
    ///
    /// The error string should only be logged on the server; clients get a
    /// generic message.
    #[error("could not send email: {0}")]
    EmailSendError(String),

    /// The user ID cookie is missing from the cookie jar in the request.
    #[error("no auth cookie in the cookie jar")]
    CookieMissing,

    /// There was an error formatting the expiry date for the auth cookie.
    #[error("could not format cookie expiry: {0}")]
    InvalidDateFormat(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist or that belongs to
    /// another user.
    #[error("tried to delete a transaction that is not in the ledger")]
    DeleteMissingTransaction,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::EmailTaken
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => Redirect::to(endpoints::REGISTER_VIEW).into_response(),
            // Any errors that are not handled above are not intended to be
            // shown to the client in full.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                error_page(
                    "Something went wrong",
                    "Try again later or check the server logs.",
                )
            }
        }
    }
}

impl Error {
    /// Render the error as an HTML alert fragment for HTMX requests.
    fn into_alert_response(self) -> Response {
        match self {
            Error::Offline => (
                StatusCode::SERVICE_UNAVAILABLE,
                alert_error("No internet connection. Please try again."),
            )
                .into_response(),
            Error::EmptyDescription => (
                StatusCode::UNPROCESSABLE_ENTITY,
                alert_error("Please enter a description."),
            )
                .into_response(),
            Error::DescriptionTooLong(max) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                alert_error(&format!(
                    "Descriptions can be at most {max} characters long."
                )),
            )
                .into_response(),
            Error::InvalidAmount(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                alert_error("Please enter a valid amount, e.g. -250 or 100.50."),
            )
                .into_response(),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                alert_error(
                    "The transaction could not be found. \
                    Try refreshing the page to see if it has already been deleted.",
                ),
            )
                .into_response(),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    alert_error("Something went wrong. Please try again."),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod error_tests {
    use crate::Error;

    #[test]
    fn unique_email_violation_maps_to_email_taken() {
        let sql_error = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ffi::ErrorCode::ConstraintViolation,
                extended_code: 2067,
            },
            Some("UNIQUE constraint failed: user.email".to_owned()),
        );

        assert_eq!(Error::from(sql_error), Error::EmailTaken);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
