//! The forgot-password page and the endpoint that issues reset links.
//!
//! A successful request stores a reset token, hands the reset link to the
//! [crate::Mailer], and renders a notice that navigates back to the log in
//! page after a short delay. The navigation is an HTMX load-delay trigger on
//! the notice itself, so replacing the notice cancels the pending navigation.

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    alert::{alert_error, alert_success},
    app_state::ForgotPasswordState,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, auth_card, base, link, loading_spinner, text_input},
    user::{generate_token, get_user_by_email, set_reset_token},
};

/// How long the success notice stays before navigating back to the log in
/// page.
const REDIRECT_DELAY_SECONDS: u8 = 5;

fn forgot_password_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::FORGOT_PASSWORD_API)
            hx-target-error="#forgot-password-alert"
            hx-indicator="#forgot-password-spinner"
            hx-disabled-elt="find button"
            class="space-y-4"
        {
            (text_input("email", "email", "Email", "", "you@gmail.com"))

            div id="forgot-password-alert" {}

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                span { "Send Reset Link" }
                span id="forgot-password-spinner" class="htmx-indicator" { (loading_spinner()) }
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Remembered it after all? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Display the forgot-password page.
pub async fn get_forgot_password_page() -> Response {
    let content = auth_card(
        "Reset your password",
        "We will email you a reset link.",
        &forgot_password_form(),
    );

    base("Forgot Password", &content).into_response()
}

/// The form data for requesting a password reset link.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    /// The email address to send the reset link to.
    pub email: String,
}

/// A route handler that issues a password reset link.
///
/// Unknown email addresses are reported as such, matching the registration
/// flow's domain allow-list: this deployment never has accounts outside a
/// small known set, so the address-enumeration trade-off is acceptable.
pub async fn forgot_password(
    State(state): State<ForgotPasswordState>,
    Form(data): Form<ForgotPasswordForm>,
) -> Response {
    if !state.connectivity.is_online() {
        tokio::time::sleep(state.offline_error_delay).await;
        return Error::Offline.into_alert_response();
    }

    let email = data.email.trim().to_lowercase();
    let reset_token = generate_token(&email);

    {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => return Error::DatabaseLockError.into_alert_response(),
        };

        if let Err(error) = get_user_by_email(&email, &connection)
            .and_then(|_| set_reset_token(&email, &reset_token, &connection))
        {
            return match error {
                Error::NotFound => (
                    StatusCode::NOT_FOUND,
                    alert_error("Email not found. Please try again."),
                )
                    .into_response(),
                error => error.into_alert_response(),
            };
        }
    }

    let reset_url = format!("/reset_password?token={reset_token}");

    if let Err(error) = state.mailer.send_password_reset(&email, &reset_url) {
        tracing::error!("could not send password reset email to {email}: {error}");
        return error.into_alert_response();
    }

    let notice = html! {
        (alert_success("Reset link sent. Check your inbox."))

        p class="text-sm font-light text-gray-500 dark:text-gray-400"
        {
            "Taking you back to the log in page..."
        }

        // Navigates once the notice has been on screen for the delay.
        // Removing this element (e.g. by submitting the form again) cancels
        // the pending navigation.
        div
            hx-get=(endpoints::LOG_IN_VIEW)
            hx-trigger={ "load delay:" (REDIRECT_DELAY_SECONDS) "s" }
            hx-target="body"
            hx-push-url="true"
            {}
    };

    (StatusCode::OK, notice).into_response()
}

#[cfg(test)]
mod get_forgot_password_page_tests {
    use axum::http::StatusCode;
    use scraper::{Html, Selector};

    use crate::endpoints;

    use super::get_forgot_password_page;

    #[tokio::test]
    async fn forgot_password_page_renders_email_form() {
        let response = get_forgot_password_page().await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let document = Html::parse_document(&String::from_utf8_lossy(&body));

        let form_selector = Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        let form = forms.first().unwrap();
        assert_eq!(
            form.value().attr("hx-post"),
            Some(endpoints::FORGOT_PASSWORD_API)
        );

        let input_selector = Selector::parse("input[type=email][name=email]").unwrap();
        assert_eq!(form.select(&input_selector).count(), 1);
    }
}
