//! The log in page and the endpoint that checks credentials.
//!
//! Wrong email and wrong password produce the same message so the form does
//! not leak which addresses are registered. Correct credentials are still
//! refused while the email address is unverified, and that refusal clears any
//! auth cookie the client presented.

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    alert::alert_error,
    app_state::LogInState,
    auth_cookie::{invalidate_auth_cookie, set_auth_cookie},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, auth_card, base, link, loading_spinner, text_input},
    user::get_user_by_email,
};

fn log_in_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-target-error="#log-in-alert"
            hx-indicator="#log-in-spinner"
            hx-disabled-elt="find button"
            class="space-y-4"
        {
            (text_input("email", "email", "Email", "", "you@gmail.com"))
            (text_input("password", "password", "Password", "", "••••••••"))

            div class="text-right"
            {
                (link(endpoints::FORGOT_PASSWORD_VIEW, "Forgot password?"))
            }

            div id="log-in-alert" {}

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                span { "Log In" }
                span id="log-in-spinner" class="htmx-indicator" { (loading_spinner()) }
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "No account yet? "
                (link(endpoints::REGISTER_VIEW, "Sign up here"))
            }
        }
    }
}

/// Display the log in page.
pub async fn get_log_in_page() -> Response {
    let content = auth_card("Welcome back", "Log in to your tracker.", &log_in_form());

    base("Log In", &content).into_response()
}

/// The form data for logging in.
#[derive(Debug, Deserialize)]
pub struct LogInForm {
    /// The email address of the account.
    pub email: String,
    /// The password to check.
    pub password: String,
}

/// A route handler for logging in a user.
///
/// A verified user with matching credentials gets an auth cookie and a
/// redirect to the tracker. An unverified user with matching credentials gets
/// neither: the auth cookie is invalidated so that retrying the request
/// cannot smuggle a stale session past the verification requirement.
pub async fn log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(data): Form<LogInForm>,
) -> Response {
    if !state.connectivity.is_online() {
        tokio::time::sleep(state.offline_error_delay).await;
        return Error::Offline.into_alert_response();
    }

    let email = data.email.trim().to_lowercase();

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => return Error::DatabaseLockError.into_alert_response(),
        };

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return invalid_credentials_response(),
            Err(error) => return error.into_alert_response(),
        }
    };

    match user.password_hash.verify(&data.password) {
        Ok(true) => {}
        Ok(false) => return invalid_credentials_response(),
        Err(error) => {
            tracing::error!("an error occurred while verifying a password: {error}");
            return Error::HashingError(error.to_string()).into_alert_response();
        }
    }

    if !user.email_verified {
        let jar = invalidate_auth_cookie(jar);

        return (
            StatusCode::FORBIDDEN,
            jar,
            alert_error("Please verify your email before logging in."),
        )
            .into_response();
    }

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration);

    (
        StatusCode::SEE_OTHER,
        HxRedirect(endpoints::TRACKER_VIEW.to_owned()),
        jar,
    )
        .into_response()
}

/// The shared wrong-email/wrong-password response.
fn invalid_credentials_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        alert_error("Invalid email or password."),
    )
        .into_response()
}

#[cfg(test)]
mod get_log_in_page_tests {
    use axum::http::StatusCode;
    use scraper::{Html, Selector};

    use crate::endpoints;

    use super::get_log_in_page;

    #[tokio::test]
    async fn log_in_page_renders_form_and_links() {
        let response = get_log_in_page().await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let document = Html::parse_document(&String::from_utf8_lossy(&body));

        let form_selector = Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        let form = forms.first().unwrap();
        assert_eq!(form.value().attr("hx-post"), Some(endpoints::LOG_IN_API));

        let link_selector = Selector::parse("a[href]").unwrap();
        let hrefs: Vec<_> = form
            .select(&link_selector)
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert!(hrefs.contains(&endpoints::FORGOT_PASSWORD_VIEW));
        assert!(hrefs.contains(&endpoints::REGISTER_VIEW));
    }
}

#[cfg(test)]
mod log_in_tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde::Serialize;

    use crate::{
        PasswordHash,
        app_state::{LogInState, create_cookie_key},
        connectivity::{AlwaysOnline, test_probes::AlwaysOffline},
        db::initialize,
        endpoints,
        user::{create_user, generate_token, verify_email_by_token},
    };

    use super::log_in;

    const TEST_PASSWORD: &str = "hunter2";

    #[derive(Serialize)]
    struct LogInForm {
        email: String,
        password: String,
    }

    fn get_test_state(online: bool) -> LogInState {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        LogInState {
            cookie_key: create_cookie_key("42"),
            cookie_duration: time::Duration::hours(1),
            offline_error_delay: Duration::ZERO,
            connectivity: if online {
                Arc::new(AlwaysOnline)
            } else {
                Arc::new(AlwaysOffline)
            },
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn insert_user(state: &LogInState, email: &str, verified: bool) {
        let connection = state.db_connection.lock().unwrap();
        let token = generate_token(email);
        // Use a low bcrypt cost to keep the tests fast.
        let password_hash =
            PasswordHash::from_raw_password(TEST_PASSWORD, 4).expect("Could not hash password");

        create_user(email, password_hash, &token, &connection).expect("Could not create test user");

        if verified {
            verify_email_by_token(&token, &connection).expect("Could not verify test user");
        }
    }

    fn get_test_server(state: LogInState) -> TestServer {
        let app = Router::new()
            .route(endpoints::LOG_IN_API, post(log_in))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server")
    }

    #[tokio::test]
    async fn verified_user_gets_session_and_redirect() {
        let state = get_test_state(true);
        insert_user(&state, "alice@gmail.com", true);
        let server = get_test_server(state);

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&LogInForm {
                email: "alice@gmail.com".to_owned(),
                password: TEST_PASSWORD.to_owned(),
            })
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("hx-redirect").unwrap(),
            endpoints::TRACKER_VIEW
        );
        assert!(
            response.maybe_cookie("user_id").is_some(),
            "want an auth cookie to be set"
        );
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_get_the_same_message() {
        let state = get_test_state(true);
        insert_user(&state, "alice@gmail.com", true);
        let server = get_test_server(state);

        for form in [
            LogInForm {
                email: "alice@gmail.com".to_owned(),
                password: "wrong password".to_owned(),
            },
            LogInForm {
                email: "ghost@gmail.com".to_owned(),
                password: TEST_PASSWORD.to_owned(),
            },
        ] {
            let response = server.post(endpoints::LOG_IN_API).form(&form).await;

            response.assert_status(StatusCode::UNAUTHORIZED);
            assert!(response.text().contains("Invalid email or password."));
        }
    }

    #[tokio::test]
    async fn unverified_user_is_refused_despite_correct_credentials() {
        let state = get_test_state(true);
        insert_user(&state, "alice@gmail.com", false);
        let server = get_test_server(state);

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&LogInForm {
                email: "alice@gmail.com".to_owned(),
                password: TEST_PASSWORD.to_owned(),
            })
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        assert!(response.text().contains("verify your email"));
        assert!(
            response.headers().get("hx-redirect").is_none(),
            "an unverified log-in must not redirect to the tracker"
        );
    }

    #[tokio::test]
    async fn offline_log_in_is_refused_before_credentials_are_checked() {
        let state = get_test_state(false);
        insert_user(&state, "alice@gmail.com", true);
        let server = get_test_server(state);

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&LogInForm {
                email: "alice@gmail.com".to_owned(),
                password: TEST_PASSWORD.to_owned(),
            })
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.text().contains("No internet connection"));
    }
}
