//! Shared HTML building blocks: the base document, the auth card used by the
//! credential pages, form styles, and display formatting for amounts and
//! dates.

use std::sync::OnceLock;

use axum::response::{IntoResponse, Response};
use maud::{DOCTYPE, Markup, html};
use numfmt::{Formatter, Precision};
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

// Link styles
pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 font-semibold hover:underline";

// Button styles
pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-3 bg-blue-600 \
    disabled:bg-blue-700 hover:enabled:bg-blue-700 text-white font-semibold \
    rounded-lg shadow-md transition";

pub const BUTTON_DELETE_STYLE: &str = "text-red-500 hover:text-red-700 \
    bg-transparent border-none cursor-pointer";

// Form styles
pub const FORM_LABEL_STYLE: &str = "block text-sm font-medium text-gray-700 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-3 rounded-lg text-sm \
    text-gray-900 dark:text-white bg-white dark:bg-gray-700 border \
    border-gray-300 dark:border-gray-600 focus-visible:outline-2 \
    focus-visible:outline-blue-500";

// Message styles
pub const ERROR_TEXT_STYLE: &str = "text-red-600 text-sm font-semibold bg-red-100 p-2 rounded-md";
pub const SUCCESS_TEXT_STYLE: &str = "text-green-600 text-sm font-semibold";

/// Render the HTML document skeleton around `content`.
pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Spendbook" }
                link href="/static/main.css" rel="stylesheet";

                script src="https://cdn.tailwindcss.com" {}
                script
                    src="https://unpkg.com/htmx.org@2.0.8/dist/htmx.min.js"
                    integrity="sha384-/TgkGk7p307TH7EXJDuUlgG3Ce1UVolAOFopFekQkkXihi5u/6OCvVKyz1W+idaz"
                    crossorigin="anonymous" {}
                script
                    src="https://unpkg.com/htmx-ext-response-targets@2.0.4"
                    crossorigin="anonymous" {}

                style
                {
                    r#"
                    .htmx-indicator {
                        display: none;
                    }

                    .htmx-request .htmx-indicator {
                        display: inline;
                    }
                    "#
                }
            }

            body
                hx-ext="response-targets"
                class="container max-w-full min-h-screen bg-gray-100 dark:bg-gray-900"
            {
                (content)
            }
        }
    }
}

/// The centered card that wraps the registration, log-in, and forgot-password
/// forms.
pub fn auth_card(form_title: &str, subtitle: &str, form: &Markup) -> Markup {
    html! {
        div class="flex justify-center items-center min-h-screen p-4"
        {
            div class="bg-white dark:bg-gray-800 p-8 rounded-2xl shadow-xl w-96 text-center"
            {
                h1 class="text-2xl font-bold text-gray-700 dark:text-white"
                {
                    (form_title)
                }

                p class="text-gray-500 dark:text-gray-400 mb-5" { (subtitle) }

                (form)
            }
        }
    }
}

/// A labelled single-line text input for the credential and transaction forms.
pub fn text_input(
    input_type: &str,
    name: &str,
    label: &str,
    value: &str,
    placeholder: &str,
) -> Markup {
    html! {
        div class="text-left"
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type=(input_type)
                name=(name)
                id=(name)
                placeholder=(placeholder)
                class=(FORM_TEXT_INPUT_STYLE)
                value=(value)
                required;
        }
    }
}

/// A full error page with a link back to the landing page.
pub fn error_page(description: &str, fix: &str) -> Response {
    let content = html! {
        div class="flex justify-center items-center min-h-screen p-4"
        {
            div class="bg-white dark:bg-gray-800 p-8 rounded-2xl shadow-xl w-96 text-center"
            {
                h1 class="text-2xl font-bold text-gray-700 dark:text-white" { (description) }
                p class="text-gray-500 dark:text-gray-400 my-4" { (fix) }
                p { (link("/", "Back to the start")) }
            }
        }
    };

    base("Error", &content).into_response()
}

/// The spinner shown inside submit buttons while a request is in flight.
pub fn loading_spinner() -> Markup {
    // Spinner SVG adapted from https://flowbite.com/docs/components/spinner/
    html! {
        svg
            aria-hidden="true"
            role="status"
            class="inline text-white w-4 h-4 me-2 mb-1 animate-spin"
            viewBox="0 0 100 101"
            fill="none"
            xmlns="http://www.w3.org/2000/svg"
        {
            path
                d="M100 50.5908C100 78.2051 77.6142 100.591 50 100.591C22.3858 100.591 0 78.2051 0 50.5908C0 22.9766 22.3858 0.59082 50 0.59082C77.6142 0.59082 100 22.9766 100 50.5908ZM9.08144 50.5908C9.08144 73.1895 27.4013 91.5094 50 91.5094C72.5987 91.5094 90.9186 73.1895 90.9186 50.5908C90.9186 27.9921 72.5987 9.67226 50 9.67226C27.4013 9.67226 9.08144 27.9921 9.08144 50.5908Z"
                fill="#E5E7EB" {}
            path
                d="M93.9676 39.0409C96.393 38.4038 97.8624 35.9116 97.0079 33.5539C95.2932 28.8227 92.871 24.3692 89.8167 20.348C85.8452 15.1192 80.8826 10.7238 75.2124 7.41289C69.5422 4.10194 63.2754 1.94025 56.7698 1.05124C51.7666 0.367541 46.6976 0.446843 41.7345 1.27873C39.2613 1.69328 37.813 4.19778 38.4501 6.62326C39.0873 9.04874 41.5694 10.4717 44.0505 10.1071C47.8511 9.54855 51.7191 9.52689 55.5402 10.0491C60.8642 10.7766 65.9928 12.5457 70.6331 15.2552C75.2735 17.9648 79.3347 21.5619 82.5849 25.841C84.9175 28.9121 86.7997 32.2913 88.1811 35.8758C89.083 38.2158 91.5421 39.6781 93.9676 39.0409Z"
                fill="currentColor" {}
        }
    }
}

/// A link with blue text for use in a `<p>` tag.
pub fn link(url: &str, text: &str) -> Markup {
    html! (
        a href=(url) class=(LINK_STYLE) { (text) }
    )
}

/// One crore, the upper display tier.
const CRORE: f64 = 10_000_000.0;
/// One lakh, the lower display tier.
const LAKH: f64 = 100_000.0;

/// Format a monetary amount for display, collapsing large magnitudes into
/// tiered units: amounts of at least one crore render as "₹x.xx Cr", at least
/// one lakh as "₹x.xx Lakh", and anything smaller as plain rupees.
///
/// This is presentation only; stored and summed values are never rounded.
pub fn format_amount(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let magnitude = amount.abs();

    if magnitude >= CRORE {
        format!("{sign}₹{:.2} Cr", magnitude / CRORE)
    } else if magnitude >= LAKH {
        format!("{sign}₹{:.2} Lakh", magnitude / LAKH)
    } else {
        format!("{sign}{}", format_rupees(magnitude))
    }
}

/// Format a magnitude below one lakh as rupees with two decimal places and
/// thousands separators.
fn format_rupees(magnitude: f64) -> String {
    static RUPEE_FMT: OnceLock<Formatter> = OnceLock::new();

    let formatter = RUPEE_FMT.get_or_init(|| {
        Formatter::currency("₹")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    let mut formatted_string = if magnitude > 0.0 {
        formatter.fmt_string(magnitude)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "₹0.00".to_owned()
    };

    // numfmt omits trailing zeros, so we must restore the two decimal places
    // ourselves. For example, "12.30" is rendered as "12.3" and "12.00" as "12".
    match formatted_string.rfind('.') {
        None => formatted_string.push_str(".00"),
        Some(index) if formatted_string.len() - index == 2 => formatted_string.push('0'),
        Some(_) => {}
    }

    formatted_string
}

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[day]/[month]/[year]");

/// Format a timestamp as a short date, e.g. "28/08/2026".
pub fn format_date(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(DATE_FORMAT)
        .unwrap_or_else(|_| timestamp.date().to_string())
}
