//! Implements a struct that holds the state of the server.

use std::{
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, auth_cookie::DEFAULT_COOKIE_DURATION, connectivity::ConnectivityProbe, db::initialize,
    mailer::Mailer, pagination::PaginationConfig, password::DEFAULT_MIN_PASSWORD_LENGTH,
};

/// How long to wait before reporting an offline submission failure.
///
/// This simulates the round-trip the request would have taken, so the client
/// does not see an instant rejection. A design parameter, not a protocol
/// requirement.
pub const DEFAULT_OFFLINE_ERROR_DELAY: StdDuration = StdDuration::from_secs(2);

/// The state of the server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The email domains that are allowed to register an account.
    pub allowed_email_domains: Arc<Vec<String>>,

    /// The minimum number of characters a password must have.
    pub min_password_length: usize,

    /// The config that controls how to display pages of transactions.
    pub pagination_config: PaginationConfig,

    /// How long to wait before reporting an offline submission failure.
    pub offline_error_delay: StdDuration,

    /// Sends verification and password reset emails.
    pub mailer: Arc<dyn Mailer>,

    /// Consulted before any submission is persisted.
    pub connectivity: Arc<dyn ConnectivityProbe>,

    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the
    /// domain models. `allowed_email_domains` restricts registration, e.g.
    /// `["gmail.com"]`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        allowed_email_domains: Vec<String>,
        mailer: Arc<dyn Mailer>,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            allowed_email_domains: Arc::new(allowed_email_domains),
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            pagination_config: PaginationConfig::default(),
            offline_error_delay: DEFAULT_OFFLINE_ERROR_DELAY,
            mailer,
            connectivity,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret` string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

/// The state needed by the auth and guest middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// The state needed for registering a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The email domains that are allowed to register an account.
    pub allowed_email_domains: Arc<Vec<String>>,
    /// The minimum number of characters a password must have.
    pub min_password_length: usize,
    /// How long to wait before reporting an offline submission failure.
    pub offline_error_delay: StdDuration,
    /// Sends the verification email.
    pub mailer: Arc<dyn Mailer>,
    /// Consulted before the account is created.
    pub connectivity: Arc<dyn ConnectivityProbe>,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            allowed_email_domains: state.allowed_email_domains.clone(),
            min_password_length: state.min_password_length,
            offline_error_delay: state.offline_error_delay,
            mailer: state.mailer.clone(),
            connectivity: state.connectivity.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// How long to wait before reporting an offline submission failure.
    pub offline_error_delay: StdDuration,
    /// Consulted before the credentials are checked.
    pub connectivity: Arc<dyn ConnectivityProbe>,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            offline_error_delay: state.offline_error_delay,
            connectivity: state.connectivity.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The state needed to request a password reset link.
#[derive(Debug, Clone)]
pub struct ForgotPasswordState {
    /// How long to wait before reporting an offline submission failure.
    pub offline_error_delay: StdDuration,
    /// Sends the password reset email.
    pub mailer: Arc<dyn Mailer>,
    /// Consulted before the reset link is issued.
    pub connectivity: Arc<dyn ConnectivityProbe>,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ForgotPasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            offline_error_delay: state.offline_error_delay,
            mailer: state.mailer.clone(),
            connectivity: state.connectivity.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed to render the tracker page.
#[derive(Debug, Clone)]
pub struct TrackerState {
    /// The config that controls how to display pages of transactions.
    pub pagination_config: PaginationConfig,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TrackerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pagination_config: state.pagination_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed to create and delete transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// How long to wait before reporting an offline submission failure.
    pub offline_error_delay: StdDuration,
    /// Consulted before the transaction is persisted.
    pub connectivity: Arc<dyn ConnectivityProbe>,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            offline_error_delay: state.offline_error_delay,
            connectivity: state.connectivity.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed by routes that only read or update the store.
#[derive(Debug, Clone)]
pub struct StoreState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StoreState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
