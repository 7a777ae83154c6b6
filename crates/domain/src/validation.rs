// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;

/// Maximum length accepted for names and class labels.
const MAX_NAME_LENGTH: usize = 128;

/// Validates a person or organization name.
///
/// Names must be non-empty after trimming and at most 128 characters.
///
/// # Errors
///
/// Returns `DomainError::InvalidName` on violation.
pub fn validate_person_name(name: &str) -> Result<(), DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidName("name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::InvalidName(format!(
            "name exceeds {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validates an email address.
///
/// This is a shape check only: one `@` with non-empty local part and a
/// domain containing a dot. Deliverability is the mail system's problem.
///
/// # Errors
///
/// Returns `DomainError::InvalidEmail` on violation.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let trimmed = email.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(DomainError::InvalidEmail(trimmed.to_string()));
    };
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || trimmed.contains(char::is_whitespace)
    {
        return Err(DomainError::InvalidEmail(trimmed.to_string()));
    }
    Ok(())
}

/// Validates a school class name.
///
/// Class names must be non-empty after trimming and at most 128 characters.
///
/// # Errors
///
/// Returns `DomainError::InvalidClassName` on violation.
pub fn validate_class_name(name: &str) -> Result<(), DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidClassName(
            "class name must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::InvalidClassName(format!(
            "class name exceeds {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_person_name_accepts_normal_names() {
        assert!(validate_person_name("Claire Dubois").is_ok());
        assert!(validate_person_name("École de Prilly").is_ok());
    }

    #[test]
    fn test_person_name_rejects_empty_and_whitespace() {
        assert!(validate_person_name("").is_err());
        assert!(validate_person_name("   ").is_err());
    }

    #[test]
    fn test_person_name_rejects_overlong() {
        let long = "a".repeat(129);
        assert!(validate_person_name(&long).is_err());
        let ok = "a".repeat(128);
        assert!(validate_person_name(&ok).is_ok());
    }

    #[test]
    fn test_email_accepts_normal_addresses() {
        assert!(validate_email("claire@example.org").is_ok());
        assert!(validate_email("  claire.dubois@velo.example.ch ").is_ok());
    }

    #[test]
    fn test_email_rejects_malformed() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.org").is_err());
        assert!(validate_email("claire@").is_err());
        assert!(validate_email("claire@nodot").is_err());
        assert!(validate_email("claire@.ch").is_err());
        assert!(validate_email("claire@example.ch.").is_err());
        assert!(validate_email("cla ire@example.ch").is_err());
        assert!(validate_email("a@b@example.ch").is_err());
    }

    #[test]
    fn test_class_name_rules() {
        assert!(validate_class_name("5P-A").is_ok());
        assert!(validate_class_name("").is_err());
        assert!(validate_class_name("  ").is_err());
    }
}
