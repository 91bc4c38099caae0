//! Code for creating the user table and fetching users from the database.
//!
//! A user account starts unverified: registration stores a verification
//! token which must be presented at the verify route before log-in is
//! allowed.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::OffsetDateTime;

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better
/// compile time errors, and more flexible generics that can have distinct
/// implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email address the user registered with.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// Whether the user has followed the emailed verification link.
    pub email_verified: bool,
}

/// Create an opaque, single-use token for email verification or password
/// reset links.
pub fn generate_token(email: &str) -> String {
    let timestamp = OffsetDateTime::now_utc().unix_timestamp_nanos();
    let digest = Sha512::digest(format!("{email}:{timestamp}"));

    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                email_verified INTEGER NOT NULL DEFAULT 0,
                verification_token TEXT,
                reset_token TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new, unverified user into the database.
///
/// `verification_token` is stored so that the verify route can later match it.
///
/// # Errors
///
/// Returns [Error::EmailTaken] if `email` is already registered, or
/// [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    email: &str,
    password_hash: PasswordHash,
    verification_token: &str,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, password, verification_token) VALUES (?1, ?2, ?3)",
        (email, password_hash.as_ref(), verification_token),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: email.to_owned(),
        password_hash,
        email_verified: false,
    })
}

/// Get the user from the database with an email equal to `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, password, email_verified FROM user WHERE email = :email",
        )?
        .query_row(&[(":email", email)], |row| {
            Ok(User {
                id: UserID::new(row.get(0)?),
                email: row.get(1)?,
                password_hash: PasswordHash::new_unchecked(&row.get::<_, String>(2)?),
                email_verified: row.get(3)?,
            })
        })
        .map_err(|error| error.into())
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password, email_verified FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], |row| {
            Ok(User {
                id: UserID::new(row.get(0)?),
                email: row.get(1)?,
                password_hash: PasswordHash::new_unchecked(&row.get::<_, String>(2)?),
                email_verified: row.get(3)?,
            })
        })
        .map_err(|error| error.into())
}

/// Mark the user holding `verification_token` as verified and clear the token,
/// so the link cannot be replayed.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user holds `verification_token`, or
/// [Error::SqlError] if some other SQL related error occurred.
pub fn verify_email_by_token(token: &str, connection: &Connection) -> Result<(), Error> {
    let rows_updated = connection.execute(
        "UPDATE user SET email_verified = 1, verification_token = NULL
         WHERE verification_token = ?1",
        (token,),
    )?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Store a password reset token against the user with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `email` does not belong to a registered user,
/// or [Error::SqlError] if some other SQL related error occurred.
pub fn set_reset_token(email: &str, token: &str, connection: &Connection) -> Result<(), Error> {
    let rows_updated = connection.execute(
        "UPDATE user SET reset_token = ?1 WHERE email = ?2",
        (token, email),
    )?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| {
            row.get::<_, i64>(0).map(|count| count as usize)
        })
        .map_err(|error| error.into())
}
