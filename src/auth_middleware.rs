//! Middleware that applies the session gate to incoming requests.
//!
//! `auth_guard` protects the tracker and its mutation endpoints,
//! `guest_guard` keeps logged in users away from the registration, log-in and
//! forgot-password pages. Handlers behind `auth_guard` can use the function
//! argument `Extension(user_id): Extension<UserID>` to receive the user ID.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;

use crate::{
    app_state::AuthState,
    auth_cookie::get_user_id_from_auth_cookie,
    endpoints,
    session_gate::{GateDecision, gate},
    user::UserID,
};

/// Read the session from the request's private cookie jar.
///
/// Returns the jar alongside the session so callers keep the request parts
/// they were given.
async fn extract_session(
    state: &AuthState,
    request: Request,
) -> (Request, Option<UserID>) {
    let (mut parts, body) = request.into_parts();

    let session = match PrivateCookieJar::from_request_parts(&mut parts, state).await {
        Ok(jar) => get_user_id_from_auth_cookie(&jar).ok(),
        Err(error) => {
            tracing::error!("Error getting cookie jar from request parts: {error:?}");
            None
        }
    };

    (Request::from_parts(parts, body), session)
}

#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    log_in_redirect: impl Fn() -> Response,
) -> Response {
    let (mut request, session) = extract_session(&state, request).await;

    match gate(session, request.uri().path()) {
        GateDecision::Allow => match session {
            Some(user_id) => {
                request.extensions_mut().insert(user_id);
                next.run(request).await
            }
            // Mutation endpoints are not in the gate's page set but still
            // require a session.
            None => log_in_redirect(),
        },
        GateDecision::RedirectToLogIn => log_in_redirect(),
        GateDecision::RedirectToTracker => {
            Redirect::to(endpoints::TRACKER_VIEW).into_response()
        }
    }
}

/// Middleware function that checks for a valid auth cookie.
///
/// The user ID is placed into the request and the request executed normally
/// if the cookie is valid, otherwise a redirect to the log-in page is
/// returned.
///
/// **Note**: The app state must contain an `axum_extra::extract::cookie::Key`
/// for decrypting and verifying the cookie contents.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, || {
        Redirect::to(endpoints::LOG_IN_VIEW).into_response()
    })
    .await
}

/// Like [auth_guard], but returns an `HX-Redirect` header so that HTMX
/// requests follow the redirect with a full page navigation.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, || {
        (
            HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
            StatusCode::OK,
        )
            .into_response()
    })
    .await
}

/// Middleware function that redirects logged in users to the tracker page.
///
/// Applied to the pages that only make sense for anonymous visitors:
/// registration, log-in, and forgot-password.
pub async fn guest_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (request, session) = extract_session(&state, request).await;

    match gate(session, request.uri().path()) {
        GateDecision::RedirectToTracker => Redirect::to(endpoints::TRACKER_VIEW).into_response(),
        _ => next.run(request).await,
    }
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router,
        extract::State,
        middleware,
        response::Html,
        routing::{get, post},
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use axum_test::TestServer;
    use sha2::{Digest, Sha512};

    use crate::{
        app_state::AuthState,
        auth_cookie::{COOKIE_USER_ID, DEFAULT_COOKIE_DURATION, set_auth_cookie},
        endpoints,
        user::UserID,
    };

    use super::{auth_guard, auth_guard_hx, guest_guard};

    async fn tracker_stub(Extension(user_id): Extension<UserID>) -> Html<String> {
        Html(format!("<h1>Tracker for {user_id}</h1>"))
    }

    async fn guest_stub() -> Html<&'static str> {
        Html("<h1>Log in</h1>")
    }

    async fn stub_log_in_route(
        State(_state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> PrivateCookieJar {
        set_auth_cookie(jar, UserID::new(1), DEFAULT_COOKIE_DURATION)
    }

    fn get_test_server() -> TestServer {
        let hash = Sha512::digest("42");
        let state = AuthState {
            cookie_key: Key::from(&hash),
        };

        let app = Router::new()
            .route(endpoints::TRACKER_VIEW, get(tracker_stub))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route(
                endpoints::TRANSACTIONS_API,
                post(tracker_stub).layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_guard_hx,
                )),
            )
            .route(
                endpoints::LOG_IN_VIEW,
                get(guest_stub).layer(middleware::from_fn_with_state(state.clone(), guest_guard)),
            )
            .route("/stub_log_in", post(stub_log_in_route))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn tracker_with_valid_cookie_succeeds() {
        let server = get_test_server();

        let response = server.post("/stub_log_in").await;
        response.assert_status_ok();
        let auth_cookie = response.cookie(COOKIE_USER_ID);

        server
            .get(endpoints::TRACKER_VIEW)
            .add_cookie(auth_cookie)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn tracker_without_cookie_redirects_to_log_in() {
        let server = get_test_server();

        let response = server.get(endpoints::TRACKER_VIEW).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn mutation_without_cookie_gets_hx_redirect() {
        let server = get_test_server();

        let response = server.post(endpoints::TRANSACTIONS_API).await;

        response.assert_status_ok();
        assert_eq!(response.header("hx-redirect"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn log_in_page_with_cookie_redirects_to_tracker() {
        let server = get_test_server();

        let response = server.post("/stub_log_in").await;
        let auth_cookie = response.cookie(COOKIE_USER_ID);

        let response = server
            .get(endpoints::LOG_IN_VIEW)
            .add_cookie(auth_cookie)
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::TRACKER_VIEW);
    }

    #[tokio::test]
    async fn log_in_page_without_cookie_is_served() {
        let server = get_test_server();

        server
            .get(endpoints::LOG_IN_VIEW)
            .await
            .assert_status_ok();
    }
}
