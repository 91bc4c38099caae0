//! The navigation rules that tie auth state to the page routes.
//!
//! The decision itself is a pure function so it can be tested without a
//! server; the middleware in [crate::auth_middleware] applies it to requests.

use crate::{endpoints, user::UserID};

/// The page routes that only make sense for a user who is not logged in.
const UNAUTHENTICATED_ONLY_PATHS: [&str; 3] = [
    endpoints::REGISTER_VIEW,
    endpoints::LOG_IN_VIEW,
    endpoints::FORGOT_PASSWORD_VIEW,
];

/// What to do with a page navigation, given the current auth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Serve the requested page.
    Allow,
    /// The user is already logged in and asked for a log-in/registration
    /// page; send them to the tracker instead.
    RedirectToTracker,
    /// The user is not logged in and asked for the tracker; send them to the
    /// log-in page.
    RedirectToLogIn,
}

/// Decide whether a navigation to `path` should be allowed or redirected for
/// a session that is `Some(user_id)` when logged in and `None` otherwise.
///
/// This function only decides; it never mutates session state.
pub fn gate(session: Option<UserID>, path: &str) -> GateDecision {
    match session {
        Some(_) if UNAUTHENTICATED_ONLY_PATHS.contains(&path) => GateDecision::RedirectToTracker,
        None if path == endpoints::TRACKER_VIEW => GateDecision::RedirectToLogIn,
        _ => GateDecision::Allow,
    }
}
