// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use crate::password_policy::PasswordPolicyError;
use defivelo_domain::DomainError;
use defivelo_persistence::PersistenceError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// What would have been required for this action.
        required: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized { action, required } => {
                write!(f, "Unauthorized: '{action}' requires {required}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain and persistence errors and represent the
/// API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed. The account does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// What would have been required for this action.
        required: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The request conflicts with an existing record.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
    },
    /// Password policy violation.
    PasswordPolicyViolation {
        /// A human-readable description of the policy violation.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized { action, required } => {
                write!(f, "Unauthorized: '{action}' requires {required}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Conflict { message } => {
                write!(f, "Conflict: {message}")
            }
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized { action, required } => {
                Self::Unauthorized { action, required }
            }
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked
/// directly.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidCanton(code) => ApiError::InvalidInput {
            field: String::from("canton"),
            message: format!("Invalid canton code '{code}': must be two letters"),
        },
        DomainError::InvalidName(msg) => ApiError::InvalidInput {
            field: String::from("name"),
            message: msg,
        },
        DomainError::InvalidEmail(msg) => ApiError::InvalidInput {
            field: String::from("email"),
            message: msg,
        },
        DomainError::InvalidSeasonSpan {
            month_start,
            n_months,
        } => ApiError::InvalidInput {
            field: String::from("season_span"),
            message: format!(
                "Invalid season span: month {month_start}, duration {n_months}. Both must be between 1 and 12"
            ),
        },
        DomainError::InvalidSeasonTransition { from, to } => ApiError::DomainRuleViolation {
            rule: String::from("season_lifecycle"),
            message: format!("Cannot transition season from {from} to {to}"),
        },
        DomainError::SeasonStateForbids { state, operation } => ApiError::DomainRuleViolation {
            rule: String::from("season_lifecycle"),
            message: format!("Operation '{operation}' is not allowed while the season is {state}"),
        },
        DomainError::SessionOutsideSeason { day } => ApiError::InvalidInput {
            field: String::from("day"),
            message: format!("Session day {day} falls outside the season's date range"),
        },
        DomainError::InvalidSessionTimes => ApiError::InvalidInput {
            field: String::from("end_time"),
            message: String::from("Session end time must be after its begin time"),
        },
        DomainError::InvalidClassName(msg) => ApiError::InvalidInput {
            field: String::from("class_name"),
            message: msg,
        },
        DomainError::InvalidParticipantCount { count, max } => ApiError::InvalidInput {
            field: String::from("n_participants"),
            message: format!("Invalid participant count: {count}. Must be between 1 and {max}"),
        },
        DomainError::EquipmentExceedsParticipants {
            kind,
            count,
            participants,
        } => ApiError::InvalidInput {
            field: String::from(kind),
            message: format!("Requested {count} {kind} for only {participants} participants"),
        },
        DomainError::TooManyHelpers { count } => ApiError::DomainRuleViolation {
            rule: String::from("max_two_helpers"),
            message: format!("A qualification allows at most 2 helpers, got {count}"),
        },
        DomainError::DuplicateStaffAssignment { profile_id } => ApiError::DomainRuleViolation {
            rule: String::from("distinct_staff"),
            message: format!("Profile {profile_id} holds more than one role in this qualification"),
        },
        DomainError::LeaderNotQualified { profile_id } => ApiError::DomainRuleViolation {
            rule: String::from("leader_capability"),
            message: format!("Profile {profile_id} is not qualified to lead"),
        },
        DomainError::ActorNotQualified { profile_id } => ApiError::DomainRuleViolation {
            rule: String::from("actor_capability"),
            message: format!("Profile {profile_id} is not qualified as an actor"),
        },
        DomainError::NotAvailable {
            profile_id,
            session_id,
        } => ApiError::DomainRuleViolation {
            rule: String::from("availability_required"),
            message: format!(
                "Profile {profile_id} has not declared availability for session {session_id}"
            ),
        },
        DomainError::InvalidInvoiceTransition { from, to } => ApiError::DomainRuleViolation {
            rule: String::from("invoice_lifecycle"),
            message: format!("Cannot transition invoice from {from} to {to}"),
        },
        DomainError::InvoiceLocked { reference } => ApiError::DomainRuleViolation {
            rule: String::from("invoice_immutable"),
            message: format!("Invoice {reference} is no longer a draft and cannot be modified"),
        },
        DomainError::TimesheetValidated { profile_id, day } => ApiError::DomainRuleViolation {
            rule: String::from("timesheet_validated"),
            message: format!(
                "Timesheet for profile {profile_id} on {day} is validated and cannot be recomputed"
            ),
        },
        DomainError::CostOverflow => ApiError::Internal {
            message: String::from("Arithmetic overflow while computing costs"),
        },
        DomainError::DateParseError { date_string, error } => ApiError::InvalidInput {
            field: String::from("date"),
            message: format!("Failed to parse date '{date_string}': {error}"),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Not-found and conflict conditions keep their shape; everything else is
/// an internal error so storage details are not leaked.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::NotFound(what) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message: what,
        },
        PersistenceError::AccountNotFound(what) => ApiError::ResourceNotFound {
            resource_type: String::from("Account"),
            message: format!("Account not found: {what}"),
        },
        PersistenceError::LoginSessionNotFound(what) => ApiError::ResourceNotFound {
            resource_type: String::from("LoginSession"),
            message: format!("Login session not found: {what}"),
        },
        PersistenceError::Conflict(message) => ApiError::Conflict { message },
        _ => ApiError::Internal {
            message: format!("Persistence error: {err}"),
        },
    }
}
