//! This file defines types that handle password validation and hashing.
//! `ValidatedPassword` wraps a string and ensures it meets the minimum length.
//! `PasswordHash` converts a `ValidatedPassword` into a salted and hashed password.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The default minimum number of characters a password must have.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// A password that has been validated, but not yet hashed.
///
/// This struct can be used to construct a [PasswordHash].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Create and validate a new password from a string.
    ///
    /// # Errors
    ///
    /// Returns [Error::PasswordTooShort] if the password has fewer than
    /// `min_length` characters.
    pub fn new(raw_password_string: &str, min_length: usize) -> Result<Self, Error> {
        if raw_password_string.chars().count() < min_length {
            return Err(Error::PasswordTooShort(min_length));
        }

        Ok(Self(raw_password_string.to_string()))
    }

    /// Create a new `ValidatedPassword` without any validation.
    ///
    /// The caller should ensure that `raw_password_string` is a valid password.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because
    /// if an invalid password is provided it may cause incorrect behaviour but
    /// will not affect memory safety.
    pub fn new_unchecked(raw_password_string: &str) -> Self {
        Self(raw_password_string.to_string())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Create a hashed password from a validated password with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to
    /// verify a password. A value of at least 12 is recommended. Pass in
    /// [PasswordHash::DEFAULT_COST] to use the recommended cost.
    ///
    /// # Errors
    ///
    /// This function will return an error if the password could not be hashed.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        match hash(&password.0, cost) {
            Ok(password_hash) => Ok(Self(password_hash)),
            Err(e) => Err(Error::HashingError(e.to_string())),
        }
    }

    /// Create a new `PasswordHash` from a string that is already a bcrypt hash.
    ///
    /// The caller should ensure that `raw_password_hash` came from a trusted
    /// source such as the application database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_string())
    }

    /// Validate and hash a raw password in one step. Intended for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is too short or could not be hashed.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        let password = ValidatedPassword::new(raw_password, DEFAULT_MIN_PASSWORD_LENGTH)?;

        Self::new(password, cost)
    }

    /// Check whether `raw_password` matches this password hash.
    ///
    /// # Errors
    ///
    /// Returns a [BcryptError] if the underlying library fails.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

#[cfg(test)]
mod validated_password_tests {
    use crate::{Error, password::DEFAULT_MIN_PASSWORD_LENGTH};

    use super::ValidatedPassword;

    #[test]
    fn accepts_password_at_minimum_length() {
        assert!(ValidatedPassword::new("hunter2", DEFAULT_MIN_PASSWORD_LENGTH).is_ok());
    }

    #[test]
    fn rejects_short_password() {
        let result = ValidatedPassword::new("abc12", DEFAULT_MIN_PASSWORD_LENGTH);

        assert_eq!(result, Err(Error::PasswordTooShort(6)));
    }

    #[test]
    fn rejects_empty_password() {
        let result = ValidatedPassword::new("", DEFAULT_MIN_PASSWORD_LENGTH);

        assert_eq!(result, Err(Error::PasswordTooShort(6)));
    }

    #[test]
    fn display_redacts_password() {
        let password = ValidatedPassword::new_unchecked("correcthorsebatterystaple");

        assert_eq!(password.to_string(), "********");
    }
}
