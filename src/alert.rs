//! Inline alert fragments rendered into a form's message area.

use maud::Markup;
use maud::html;

use crate::html::{ERROR_TEXT_STYLE, SUCCESS_TEXT_STYLE};

/// An error message paragraph, red text on a light red background.
pub fn alert_error(message: &str) -> Markup {
    html! {
        p class=(ERROR_TEXT_STYLE) { (message) }
    }
}

/// A success message paragraph, green text.
pub fn alert_success(message: &str) -> Markup {
    html! {
        p class=(SUCCESS_TEXT_STYLE) { (message) }
    }
}
