//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth_middleware::{auth_guard, auth_guard_hx, guest_guard},
    endpoints,
    forgot_password::{forgot_password, get_forgot_password_page},
    ledger::get_tracker_page,
    log_in::{get_log_in_page, log_in},
    log_out::log_out,
    registration::{get_register_page, register_user},
    transaction::{create_transaction_endpoint, delete_transaction_endpoint},
    verify_email::verify_email,
};

/// Return a router with all the app's routes.
///
/// The three anonymous pages are behind the guest guard so a logged in user
/// lands on the tracker instead; the tracker and its mutation endpoints are
/// behind the auth guard. Anything else falls back to the landing page.
pub fn build_router(state: AppState) -> Router {
    let guest_routes = Router::new()
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .layer(middleware::from_fn_with_state(state.clone(), guest_guard));

    let unprotected_routes = Router::new()
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::LOG_IN_API, post(log_in))
        .route(endpoints::FORGOT_PASSWORD_API, post(forgot_password))
        .route(endpoints::VERIFY_EMAIL, get(verify_email))
        .route(endpoints::LOG_OUT, post(log_out));

    let protected_routes = Router::new()
        .route(endpoints::TRACKER_VIEW, get(get_tracker_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes need the HX-Redirect header for auth redirects to work
    // properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::DELETE_TRANSACTION,
                delete(delete_transaction_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(guest_routes)
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_fallback_redirect)
        .with_state(state)
}

/// Unknown paths land on the registration page.
async fn get_fallback_redirect() -> Redirect {
    Redirect::to(endpoints::REGISTER_VIEW)
}
