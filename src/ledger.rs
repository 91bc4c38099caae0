//! The tracker page: a balance summary, a form for recording new
//! transactions, and a paginated transaction history.
//!
//! The page is rebuilt from the database on every request. Mutations redirect
//! back here rather than patching the page in place, so what the user sees is
//! always the stored ledger.

use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    app_state::TrackerState,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, LINK_STYLE, base, format_amount, format_date,
        loading_spinner, text_input,
    },
    pagination::{clamp_page, page_count, page_window},
    transaction::Transaction,
    user::{UserID, get_user_by_id},
};

/// Totals derived from a user's full transaction history.
///
/// Income is the sum of the positive amounts and is never negative; expenses
/// is the sum of the negative amounts and keeps its sign. All three are
/// recomputed from the stored records, never adjusted incrementally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerSummary {
    /// The sum of all positive amounts.
    pub income: f64,
    /// The sum of all negative amounts. At most zero.
    pub expenses: f64,
    /// `income + expenses`. Negative when the user has spent more than they
    /// earned.
    pub balance: f64,
}

impl LedgerSummary {
    /// Compute the summary over `transactions`.
    pub fn of(transactions: &[Transaction]) -> Self {
        let income: f64 = transactions
            .iter()
            .filter(|transaction| transaction.amount > 0.0)
            .map(|transaction| transaction.amount)
            .sum();
        let expenses: f64 = transactions
            .iter()
            .filter(|transaction| transaction.amount < 0.0)
            .map(|transaction| transaction.amount)
            .sum();

        Self {
            income,
            expenses,
            balance: income + expenses,
        }
    }
}

/// Controls pagination of the transaction history.
#[derive(Deserialize)]
pub struct Pagination {
    /// The page number to display. Starts from 1.
    pub page: Option<u64>,
}

/// Render the tracker page for the signed-in user.
///
/// Out-of-range page numbers are clamped rather than rejected, so the link a
/// user followed before deleting the last record on a page still lands
/// somewhere sensible.
pub async fn get_tracker_page(
    State(state): State<TrackerState>,
    Extension(user_id): Extension<UserID>,
    Query(query_params): Query<Pagination>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(_) => return Error::DatabaseLockError.into_response(),
    };

    let user = match get_user_by_id(user_id, &connection) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    let transactions = match crate::transaction::get_transactions(user_id, &connection) {
        Ok(transactions) => transactions,
        Err(error) => return error.into_response(),
    };
    drop(connection);

    let summary = LedgerSummary::of(&transactions);

    let page_size = state.pagination_config.page_size;
    let requested_page = query_params
        .page
        .unwrap_or(state.pagination_config.default_page);
    let page_count = page_count(transactions.len(), page_size);
    let current_page = clamp_page(requested_page, page_count);
    let window = page_window(transactions.len(), current_page, page_size);
    let page_of_transactions = &transactions[window];

    let content = html! {
        div class="max-w-2xl mx-auto p-4 space-y-6"
        {
            (header(&user.email))
            (summary_cards(&summary))
            (transaction_form())
            (history(page_of_transactions, current_page, page_count))
        }
    };

    base("Expense Tracker", &content).into_response()
}

/// The page header with the signed-in user's email and a log out button.
fn header(email: &str) -> Markup {
    html! {
        header class="flex items-center justify-between"
        {
            div
            {
                h1 class="text-2xl font-bold dark:text-white" { "Expense Tracker" }
                p class="text-sm text-gray-500 dark:text-gray-400" { (email) }
            }

            button
                class=(LINK_STYLE)
                hx-post=(endpoints::LOG_OUT)
                { "Log out" }
        }
    }
}

/// The balance, income, and expense totals.
fn summary_cards(summary: &LedgerSummary) -> Markup {
    let card_style = "p-4 rounded-lg bg-white dark:bg-gray-800 shadow text-center";

    html! {
        section class="grid grid-cols-3 gap-4"
        {
            div class=(card_style)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Balance" }
                p class="text-lg font-bold dark:text-white" { (format_amount(summary.balance)) }
            }

            div class=(card_style)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Income" }
                p class="text-lg font-bold text-green-600" { (format_amount(summary.income)) }
            }

            div class=(card_style)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Expense" }
                // The card shows the magnitude; red already marks it as spending.
                p class="text-lg font-bold text-red-600" { (format_amount(-summary.expenses)) }
            }
        }
    }
}

/// The form for recording a new transaction.
///
/// Validation errors and the offline error replace the alert paragraph; a
/// successful submission redirects to the tracker page, which renders this
/// form empty again.
fn transaction_form() -> Markup {
    html! {
        form
            class="space-y-4 p-4 rounded-lg bg-white dark:bg-gray-800 shadow"
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#transaction-alert"
            hx-indicator="#transaction-spinner"
            hx-disabled-elt="find button"
        {
            h2 class="text-lg font-semibold dark:text-white" { "Add transaction" }

            (text_input("text", "description", "Description", "", "e.g. Groceries"))
            (text_input("text", "amount", "Amount", "", "Negative for expenses, e.g. -250"))

            p id="transaction-alert" {}

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                span { "Add" }
                span id="transaction-spinner" class="htmx-indicator" { (loading_spinner()) }
            }
        }
    }
}

/// The paginated transaction history with pagination controls.
fn history(transactions: &[Transaction], current_page: u64, page_count: u64) -> Markup {
    html! {
        section class="p-4 rounded-lg bg-white dark:bg-gray-800 shadow space-y-2"
        {
            h2 class="text-lg font-semibold dark:text-white" { "History" }

            @if transactions.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400" { "No transactions yet." }
            } @else {
                ul class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for transaction in transactions {
                        (history_row(transaction))
                    }
                }

                (pagination_controls(current_page, page_count))
            }
        }
    }
}

fn history_row(transaction: &Transaction) -> Markup {
    let amount_style = if transaction.amount < 0.0 {
        "font-semibold text-red-600"
    } else {
        "font-semibold text-green-600"
    };

    html! {
        li class="flex items-center justify-between py-2"
        {
            div
            {
                p class="dark:text-white" { (transaction.description) }
                p class="text-xs text-gray-500 dark:text-gray-400"
                    { (format_date(transaction.timestamp)) }
            }

            div class="flex items-center gap-3"
            {
                span class=(amount_style) { (format_amount(transaction.amount)) }

                button
                    class=(BUTTON_DELETE_STYLE)
                    hx-delete=(endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, transaction.id))
                    aria-label="Delete transaction"
                    { "✕" }
            }
        }
    }
}

/// Previous/next links around the current page indicator.
fn pagination_controls(current_page: u64, page_count: u64) -> Markup {
    html! {
        nav class="flex items-center justify-between pt-2 text-sm" aria-label="History pages"
        {
            @if current_page > 1 {
                a class=(LINK_STYLE)
                    href={ (endpoints::TRACKER_VIEW) "?page=" (current_page - 1) }
                    { "Previous" }
            } @else {
                span class="text-gray-400" { "Previous" }
            }

            span class="text-gray-500 dark:text-gray-400"
                { "Page " (current_page) " of " (page_count.max(1)) }

            @if current_page < page_count {
                a class=(LINK_STYLE)
                    href={ (endpoints::TRACKER_VIEW) "?page=" (current_page + 1) }
                    { "Next" }
            } @else {
                span class="text-gray-400" { "Next" }
            }
        }
    }
}


#[cfg(test)]
mod tracker_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::datetime;

    use crate::{
        app_state::TrackerState,
        db::initialize,
        endpoints,
        pagination::PaginationConfig,
        transaction::{NewTransaction, create_transaction},
        user::{UserID, create_user},
    };

    use super::get_tracker_page;

    fn get_test_server() -> (TestServer, TrackerState, UserID) {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        let user = create_user(
            "alice@gmail.com",
            crate::PasswordHash::new_unchecked("hash"),
            "token",
            &connection,
        )
        .expect("Could not create test user");

        let state = TrackerState {
            pagination_config: PaginationConfig::default(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route(endpoints::TRACKER_VIEW, get(get_tracker_page))
            .layer(Extension(user.id))
            .with_state(state.clone());

        let server = TestServer::new(app).expect("Could not create test server");

        (server, state, user.id)
    }

    fn insert_transactions(state: &TrackerState, user_id: UserID, amounts: &[f64]) {
        let connection = state.db_connection.lock().unwrap();

        for (i, &amount) in amounts.iter().enumerate() {
            let timestamp = datetime!(2026-08-01 09:00 UTC) + time::Duration::days(i as i64);
            create_transaction(
                NewTransaction {
                    description: format!("transaction {i}"),
                    amount,
                    timestamp,
                    user_id,
                },
                &connection,
            )
            .expect("Could not insert test transaction");
        }
    }

    #[tokio::test]
    async fn tracker_page_shows_email_and_totals() {
        let (server, state, user_id) = get_test_server();
        insert_transactions(&state, user_id, &[50_000.0, -12_000.0]);

        let response = server.get(endpoints::TRACKER_VIEW).await;
        response.assert_status_ok();

        let text = response.text();
        assert!(text.contains("alice@gmail.com"));
        assert!(
            text.contains(&crate::html::format_amount(50_000.0)),
            "want income total in: {text}"
        );
        assert!(
            text.contains(&crate::html::format_amount(12_000.0)),
            "want expense total in: {text}"
        );
        assert!(
            text.contains(&crate::html::format_amount(38_000.0)),
            "want balance in: {text}"
        );
    }

    #[tokio::test]
    async fn empty_history_shows_placeholder() {
        let (server, _, _) = get_test_server();

        let response = server.get(endpoints::TRACKER_VIEW).await;
        response.assert_status_ok();

        assert!(response.text().contains("No transactions yet."));
    }

    #[tokio::test]
    async fn history_shows_at_most_one_page_of_rows() {
        let (server, state, user_id) = get_test_server();
        insert_transactions(&state, user_id, &[-1.0, -2.0, -3.0, -4.0, -5.0, -6.0, -7.0]);

        let response = server.get(endpoints::TRACKER_VIEW).await;
        response.assert_status_ok();

        let html = Html::parse_document(&response.text());
        let row_selector = Selector::parse("ul > li").unwrap();
        let rows: Vec<_> = html.select(&row_selector).collect();

        assert_eq!(rows.len(), 5, "want one page of five rows");
        assert!(response.text().contains("Page 1 of 2"));
    }

    #[tokio::test]
    async fn second_page_holds_the_remainder() {
        let (server, state, user_id) = get_test_server();
        insert_transactions(&state, user_id, &[-1.0, -2.0, -3.0, -4.0, -5.0, -6.0, -7.0]);

        let response = server
            .get(endpoints::TRACKER_VIEW)
            .add_query_param("page", 2)
            .await;
        response.assert_status_ok();

        let html = Html::parse_document(&response.text());
        let row_selector = Selector::parse("ul > li").unwrap();
        let rows: Vec<_> = html.select(&row_selector).collect();

        assert_eq!(rows.len(), 2, "want the two oldest rows");
    }

    #[tokio::test]
    async fn out_of_range_page_is_clamped() {
        let (server, state, user_id) = get_test_server();
        insert_transactions(&state, user_id, &[-1.0, -2.0, -3.0]);

        let response = server
            .get(endpoints::TRACKER_VIEW)
            .add_query_param("page", 99)
            .await;
        response.assert_status_ok();

        assert!(response.text().contains("Page 1 of 1"));
    }
}
