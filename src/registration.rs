//! The registration page, which is also the landing page of the app.
//!
//! New accounts start unverified: the registration endpoint stores a
//! verification token and emails the matching link via the [crate::Mailer],
//! and the log-in flow refuses the account until the link has been followed.
//! Registration never sets an auth cookie.

use std::str::FromStr;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use email_address::EmailAddress;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    alert::{alert_error, alert_success},
    app_state::RegistrationState,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, auth_card, base, link, loading_spinner, text_input},
    password::{PasswordHash, ValidatedPassword},
    user::{create_user, generate_token},
};

fn registration_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-target-error="#register-alert"
            hx-indicator="#register-spinner"
            hx-disabled-elt="find button"
            class="space-y-4"
        {
            (text_input("email", "email", "Email", "", "you@gmail.com"))
            (text_input("password", "password", "Password", "", "••••••••"))
            (text_input("password", "confirm_password", "Confirm Password", "", "••••••••"))

            div id="register-alert" {}

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                span { "Sign Up" }
                span id="register-spinner" class="htmx-indicator" { (loading_spinner()) }
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let content = auth_card(
        "Create an account",
        "Track where your money goes.",
        &registration_form(),
    );

    base("Sign Up", &content).into_response()
}

/// The form data for registering a new user.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    /// The email address to register.
    pub email: String,
    /// The chosen password.
    pub password: String,
    /// The password, typed again.
    pub confirm_password: String,
}

/// A route handler for creating a new, unverified user.
///
/// Validation runs in order: email well-formed, email domain allowed,
/// password long enough, passwords matching. Only then is connectivity
/// checked and the account created. A verification email is sent via the
/// [crate::Mailer]; the response is a notice telling the user to check their
/// inbox, not a session.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(data): Form<RegisterForm>,
) -> Response {
    let email = data.email.trim().to_lowercase();

    if EmailAddress::from_str(&email).is_err() {
        return registration_error(Error::InvalidEmail(email));
    }

    if !is_email_domain_allowed(&email, &state.allowed_email_domains) {
        return registration_error(Error::EmailNotAllowed(
            state.allowed_email_domains.join(", "),
        ));
    }

    let validated_password = match ValidatedPassword::new(&data.password, state.min_password_length)
    {
        Ok(password) => password,
        Err(error) => return registration_error(error),
    };

    if data.password != data.confirm_password {
        return registration_error(Error::PasswordMismatch);
    }

    if !state.connectivity.is_online() {
        tokio::time::sleep(state.offline_error_delay).await;
        return registration_error(Error::Offline);
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return registration_error(error);
        }
    };

    let verification_token = generate_token(&email);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(_) => return registration_error(Error::DatabaseLockError),
    };

    if let Err(error) = create_user(&email, password_hash, &verification_token, &connection) {
        return registration_error(error);
    }
    drop(connection);

    let verify_url = format!("{}?token={verification_token}", endpoints::VERIFY_EMAIL);

    if let Err(error) = state.mailer.send_verification(&email, &verify_url) {
        tracing::error!("could not send verification email to {email}: {error}");
        return registration_error(error);
    }

    let notice = html! {
        (alert_success("Account created. Check your inbox for the verification link."))
        p class="text-sm font-light text-gray-500 dark:text-gray-400"
        {
            "Verified already? "
            (link(endpoints::LOG_IN_VIEW, "Log in here"))
        }
    };

    (StatusCode::CREATED, notice).into_response()
}

/// Check whether the domain part of `email` is in the allow-list.
fn is_email_domain_allowed(email: &str, allowed_domains: &[String]) -> bool {
    match email.rsplit_once('@') {
        Some((_, domain)) => allowed_domains
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(domain)),
        None => false,
    }
}

/// Render a registration failure as an alert fragment for the form's error
/// target.
fn registration_error(error: Error) -> Response {
    match error {
        Error::InvalidEmail(email) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            alert_error(&format!("\"{email}\" is not a valid email address.")),
        )
            .into_response(),
        Error::EmailNotAllowed(domains) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            alert_error(&format!(
                "Registration is limited to these email domains: {domains}."
            )),
        )
            .into_response(),
        Error::PasswordTooShort(min_length) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            alert_error(&format!(
                "Passwords must be at least {min_length} characters long."
            )),
        )
            .into_response(),
        Error::PasswordMismatch => (
            StatusCode::UNPROCESSABLE_ENTITY,
            alert_error("Passwords do not match."),
        )
            .into_response(),
        Error::EmailTaken => (
            StatusCode::CONFLICT,
            alert_error("This email address is already registered. Try logging in instead."),
        )
            .into_response(),
        error => error.into_alert_response(),
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::http::{StatusCode, header::CONTENT_TYPE};
    use scraper::{Html, Selector};

    use crate::endpoints;

    use super::get_register_page;

    #[tokio::test]
    async fn register_page_renders_sign_up_form() {
        let response = get_register_page().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let document = Html::parse_document(&String::from_utf8_lossy(&body));

        let form_selector = Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        let form = forms.first().unwrap();
        assert_eq!(form.value().attr("hx-post"), Some(endpoints::USERS));

        for (type_, name) in [
            ("email", "email"),
            ("password", "password"),
            ("password", "confirm_password"),
        ] {
            let selector_string = format!("input[type={type_}][name={name}]");
            let input_selector = Selector::parse(&selector_string).unwrap();
            assert_eq!(
                form.select(&input_selector).count(),
                1,
                "want 1 {name} input"
            );
        }

        let link_selector = Selector::parse("a[href]").unwrap();
        let links = form.select(&link_selector).collect::<Vec<_>>();
        assert!(
            links
                .iter()
                .any(|link| link.value().attr("href") == Some(endpoints::LOG_IN_VIEW)),
            "want a link to the log in page"
        );
    }
}
