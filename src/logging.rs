//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};

/// The credential form fields that must never reach the log.
const SENSITIVE_FIELDS: [&str; 2] = ["password", "confirm_password"];

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both are logged at the `info` level, truncated to [LOG_BODY_LENGTH_LIMIT]
/// bytes with the full body at `debug`. Password fields in form submissions
/// are redacted before anything is written.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let body_text = String::from_utf8_lossy(&body_bytes).to_string();

    let is_form_submission = parts.method == axum::http::Method::POST
        && parts.headers.get(CONTENT_TYPE)
            == Some(&"application/x-www-form-urlencoded".parse().unwrap());

    if is_form_submission {
        let mut display_text = body_text.clone();
        for field in SENSITIVE_FIELDS {
            display_text = redact_field(&display_text, field);
        }
        log_body("Received request", &format!("{parts:#?}"), &display_text);
    } else {
        log_body("Received request", &format!("{parts:#?}"), &body_text);
    }

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let body_text = String::from_utf8_lossy(&body_bytes).to_string();
    log_body("Sending response", &format!("{parts:#?}"), &body_text);

    Response::from_parts(parts, body_text.into())
}

/// Replace the value of `field_name` in urlencoded form text with asterisks.
fn redact_field(form_text: &str, field_name: &str) -> String {
    let start = match form_text.find(&format!("{field_name}=")) {
        Some(position) => position,
        None => return form_text.to_string(),
    };

    let end = match form_text[start..].find('&') {
        Some(offset) => start + offset,
        None => form_text.len(),
    };

    form_text.replace(&form_text[start..end], &format!("{field_name}=********"))
}

fn log_body(direction: &str, headers: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "{direction}: {headers}\nbody: {}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{direction}: {headers}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod redact_field_tests {
    use super::redact_field;

    #[test]
    fn redacts_field_in_the_middle_of_the_form() {
        let form_text = "email=alice%40gmail.com&password=hunter2&confirm_password=hunter2";

        let mut redacted = redact_field(form_text, "password");
        redacted = redact_field(&redacted, "confirm_password");

        assert!(!redacted.contains("hunter2"), "got: {redacted}");
        assert!(redacted.contains("email=alice%40gmail.com"));
    }

    #[test]
    fn redacts_field_at_the_end_of_the_form() {
        let form_text = "email=alice%40gmail.com&password=hunter2";

        let redacted = redact_field(form_text, "password");

        assert_eq!(redacted, "email=alice%40gmail.com&password=********");
    }

    #[test]
    fn leaves_forms_without_the_field_unchanged() {
        let form_text = "description=Coffee&amount=-250";

        assert_eq!(redact_field(form_text, "password"), form_text);
    }
}
