//! Transaction management for the expense tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and amount text validation
//! - Database functions for storing, querying, and deleting transactions
//! - The endpoints that create and delete transactions
//!
//! A transaction's amount is a signed decimal: positive amounts are income,
//! negative amounts are expenses. There is no separate type field, and there
//! is no edit operation; transactions are created, listed, and deleted.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, Row};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{Error, app_state::TransactionState, endpoints, user::UserID};

/// An alias for the integer IDs assigned by the database.
pub type DatabaseID = i64;

/// The maximum number of characters allowed in a description.
pub const MAX_DESCRIPTION_LENGTH: usize = 20;
/// The maximum number of characters accepted as amount text.
pub const MAX_AMOUNT_LENGTH: usize = 20;

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction, assigned by the database.
    pub id: DatabaseID,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned. Positive is income, negative is
    /// an expense.
    pub amount: f64,
    /// When the transaction was recorded. Set at creation, never changed.
    pub timestamp: OffsetDateTime,
    /// The user that owns this transaction.
    pub user_id: UserID,
}

/// The fields needed to insert a transaction; the database assigns the ID.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// When the transaction was recorded.
    pub timestamp: OffsetDateTime,
    /// The user that owns this transaction.
    pub user_id: UserID,
}

/// Parse amount text into a signed decimal.
///
/// Only strings consisting of an optional leading minus, digits, and at most
/// one decimal point are accepted, with at least one digit and at most
/// [MAX_AMOUNT_LENGTH] characters. A zero amount is rejected because the sign
/// alone distinguishes income from expenses.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] for anything else.
pub fn parse_amount(text: &str) -> Result<f64, Error> {
    let invalid = || Error::InvalidAmount(text.to_owned());

    if text.is_empty() || text.len() > MAX_AMOUNT_LENGTH {
        return Err(invalid());
    }

    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let mut digit_count = 0;
    let mut seen_decimal_point = false;

    for c in unsigned.chars() {
        match c {
            '0'..='9' => digit_count += 1,
            '.' if !seen_decimal_point => seen_decimal_point = true,
            _ => return Err(invalid()),
        }
    }

    if digit_count == 0 {
        return Err(invalid());
    }

    let amount: f64 = text.parse().map_err(|_| invalid())?;

    if amount == 0.0 {
        return Err(invalid());
    }

    Ok(amount)
}

/// Validate a description: non-empty after trimming, at most
/// [MAX_DESCRIPTION_LENGTH] characters.
///
/// # Errors
///
/// Returns [Error::EmptyDescription] or [Error::DescriptionTooLong].
pub fn validate_description(description: &str) -> Result<&str, Error> {
    let description = description.trim();

    if description.is_empty() {
        return Err(Error::EmptyDescription);
    }

    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(Error::DescriptionTooLong(MAX_DESCRIPTION_LENGTH));
    }

    Ok(description)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                timestamp TEXT NOT NULL,
                user_id INTEGER NOT NULL REFERENCES user(id)
                )",
        (),
    )?;

    Ok(())
}

/// Insert a new transaction into the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (description, amount, timestamp, user_id)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, description, amount, timestamp, user_id",
        )?
        .query_row(
            (
                &new_transaction.description,
                new_transaction.amount,
                new_transaction.timestamp,
                new_transaction.user_id.as_i64(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get all of `user_id`'s transactions, newest first.
///
/// This is always the full set: the tracker re-reads the whole ledger rather
/// than patching a cached copy, so the page always reflects stored truth.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, description, amount, timestamp, user_id FROM \"transaction\"
             WHERE user_id = :user_id
             ORDER BY timestamp DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Delete `user_id`'s transaction with ID `transaction_id`.
///
/// The owner filter means a user cannot delete another user's records even
/// with a guessed ID.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if no such transaction exists,
/// or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    transaction_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (transaction_id, user_id.as_i64()),
    )?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: row.get(2)?,
        timestamp: row.get(3)?,
        user_id: UserID::new(row.get(4)?),
    })
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// The form data for creating a transaction.
///
/// The amount arrives as text so that the server applies the same acceptance
/// rules as the input field, rather than trusting whatever the client's
/// number parsing produced.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// Text detailing the transaction.
    pub description: String,
    /// The amount text, e.g. "-250" or "100.50".
    pub amount: String,
}

/// A route handler for creating a new transaction.
///
/// Preconditions are checked in order: description, amount text, then
/// connectivity. The connectivity failure is reported after the configured
/// delay without attempting the insert. On success the client is redirected
/// to the tracker page, which re-reads the full ledger and renders an empty
/// form.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(data): Form<TransactionForm>,
) -> Response {
    let description = match validate_description(&data.description) {
        Ok(description) => description.to_owned(),
        Err(error) => return error.into_alert_response(),
    };

    let amount = match parse_amount(data.amount.trim()) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    if !state.connectivity.is_online() {
        tokio::time::sleep(state.offline_error_delay).await;
        return Error::Offline.into_alert_response();
    }

    let new_transaction = NewTransaction {
        description,
        amount,
        timestamp: OffsetDateTime::now_utc(),
        user_id,
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(_) => return Error::DatabaseLockError.into_alert_response(),
    };

    match create_transaction(new_transaction, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TRACKER_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for deleting a transaction by its database ID.
///
/// Deletion is immediate; there is no confirmation step and no undo. On
/// success the client is redirected to the tracker page, which re-reads the
/// full ledger.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(_) => return Error::DatabaseLockError.into_alert_response(),
    };

    match delete_transaction(transaction_id, user_id, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::TRACKER_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
