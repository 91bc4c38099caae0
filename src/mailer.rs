//! The outgoing email surface for the credential flows.
//!
//! Registration and password reset both end in "an email was sent"; this
//! module is the seam where delivery happens. The default [LogMailer] writes
//! the links to the application log, which is enough for a self-hosted
//! deployment where the operator reads the log, and keeps SMTP out of the
//! credential flows. A real deployment can substitute another [Mailer]
//! without touching the route handlers.

use std::fmt::Debug;

use crate::Error;

/// Sends account emails (verification links, password reset links).
pub trait Mailer: Send + Sync + Debug {
    /// Send an email containing the link that verifies `email`.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmailSendError] if the email could not be handed over
    /// for delivery.
    fn send_verification(&self, email: &str, verify_url: &str) -> Result<(), Error>;

    /// Send an email containing the password reset link for `email`.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmailSendError] if the email could not be handed over
    /// for delivery.
    fn send_password_reset(&self, email: &str, reset_url: &str) -> Result<(), Error>;
}

/// A [Mailer] that writes the links to the application log instead of
/// delivering email.
#[derive(Debug, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_verification(&self, email: &str, verify_url: &str) -> Result<(), Error> {
        tracing::info!("Verification link for {email}: {verify_url}");

        Ok(())
    }

    fn send_password_reset(&self, email: &str, reset_url: &str) -> Result<(), Error> {
        tracing::info!("Password reset link for {email}: {reset_url}");

        Ok(())
    }
}
