// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Password policy validation.
//!
//! This module enforces password requirements for intranet accounts.

use thiserror::Error;

/// Password policy errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    /// Password is too short.
    #[error("Password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    /// Password contains no letter.
    #[error("Password must contain at least one letter")]
    MissingLetter,

    /// Password contains no digit.
    #[error("Password must contain at least one digit")]
    MissingDigit,

    /// Password matches the login email.
    #[error("Password must not match the login email")]
    MatchesLoginEmail,

    /// Password and confirmation do not match.
    #[error("Password and confirmation do not match")]
    ConfirmationMismatch,
}

/// Password policy configuration.
pub struct PasswordPolicy {
    /// Minimum password length.
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 12 }
    }
}

impl PasswordPolicy {
    /// Validates a password against the policy.
    ///
    /// # Arguments
    ///
    /// * `password` - The password to validate
    /// * `confirmation` - The password confirmation
    /// * `login_email` - The account login email (password must not match)
    ///
    /// # Errors
    ///
    /// Returns a `PasswordPolicyError` if the password does not meet policy
    /// requirements.
    pub fn validate(
        &self,
        password: &str,
        confirmation: &str,
        login_email: &str,
    ) -> Result<(), PasswordPolicyError> {
        if password != confirmation {
            return Err(PasswordPolicyError::ConfirmationMismatch);
        }

        if password.chars().count() < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }

        if !password.chars().any(char::is_alphabetic) {
            return Err(PasswordPolicyError::MissingLetter);
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordPolicyError::MissingDigit);
        }

        if password.to_lowercase() == login_email.to_lowercase() {
            return Err(PasswordPolicyError::MatchesLoginEmail);
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        let policy: PasswordPolicy = PasswordPolicy::default();

        assert!(
            policy
                .validate("velo-saison-2026", "velo-saison-2026", "a@defi-velo.ch")
                .is_ok()
        );

        // Exactly 12 characters.
        assert!(
            policy
                .validate("abcdefghijk1", "abcdefghijk1", "a@defi-velo.ch")
                .is_ok()
        );
    }

    #[test]
    fn test_password_too_short() {
        let policy: PasswordPolicy = PasswordPolicy::default();

        let result: Result<(), PasswordPolicyError> =
            policy.validate("short1", "short1", "a@defi-velo.ch");
        assert_eq!(result, Err(PasswordPolicyError::TooShort { min_length: 12 }));
    }

    #[test]
    fn test_password_needs_letter_and_digit() {
        let policy: PasswordPolicy = PasswordPolicy::default();

        let result: Result<(), PasswordPolicyError> =
            policy.validate("123456789012", "123456789012", "a@defi-velo.ch");
        assert_eq!(result, Err(PasswordPolicyError::MissingLetter));

        let result: Result<(), PasswordPolicyError> =
            policy.validate("abcdefghijkl", "abcdefghijkl", "a@defi-velo.ch");
        assert_eq!(result, Err(PasswordPolicyError::MissingDigit));
    }

    #[test]
    fn test_password_must_not_match_login() {
        let policy: PasswordPolicy = PasswordPolicy::default();

        let result: Result<(), PasswordPolicyError> = policy.validate(
            "Admin1@defi-velo.ch",
            "Admin1@defi-velo.ch",
            "admin1@defi-velo.ch",
        );
        assert_eq!(result, Err(PasswordPolicyError::MatchesLoginEmail));
    }

    #[test]
    fn test_confirmation_mismatch() {
        let policy: PasswordPolicy = PasswordPolicy::default();

        let result: Result<(), PasswordPolicyError> =
            policy.validate("velo-saison-2026", "velo-saison-2027", "a@defi-velo.ch");
        assert_eq!(result, Err(PasswordPolicyError::ConfirmationMismatch));
    }
}
