// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::season::SeasonState;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Canton code is not exactly two letters.
    InvalidCanton(String),
    /// A person or organization name is empty or invalid.
    InvalidName(String),
    /// An email address is empty or malformed.
    InvalidEmail(String),
    /// Season month or duration is out of range.
    InvalidSeasonSpan {
        /// The start month (1-12).
        month_start: u8,
        /// The duration in months (1-12).
        n_months: u8,
    },
    /// A season lifecycle transition is not allowed.
    InvalidSeasonTransition {
        /// The current state.
        from: SeasonState,
        /// The requested state.
        to: SeasonState,
    },
    /// The operation is not permitted in the season's current state.
    SeasonStateForbids {
        /// The current state.
        state: SeasonState,
        /// The operation that was attempted.
        operation: &'static str,
    },
    /// Session day does not fall within the season's date range.
    SessionOutsideSeason {
        /// The session day (ISO 8601 date string).
        day: String,
    },
    /// Session end time is not after its begin time.
    InvalidSessionTimes,
    /// Class name is empty or invalid.
    InvalidClassName(String),
    /// Participant count is out of range.
    InvalidParticipantCount {
        /// The invalid count.
        count: u16,
        /// The maximum allowed per class.
        max: u16,
    },
    /// Bike or helmet count exceeds the participant count.
    EquipmentExceedsParticipants {
        /// The equipment kind ("bikes" or "helmets").
        kind: &'static str,
        /// The equipment count.
        count: u16,
        /// The participant count.
        participants: u16,
    },
    /// More than two helpers assigned to a qualification.
    TooManyHelpers {
        /// The number of helpers requested.
        count: usize,
    },
    /// The same person holds more than one role in a qualification.
    DuplicateStaffAssignment {
        /// The offending profile ID.
        profile_id: i64,
    },
    /// The assigned leader lacks the `can_lead` capability.
    LeaderNotQualified {
        /// The offending profile ID.
        profile_id: i64,
    },
    /// The assigned actor lacks the `is_actor` capability.
    ActorNotQualified {
        /// The offending profile ID.
        profile_id: i64,
    },
    /// A profile was chosen for a session it did not declare availability for.
    NotAvailable {
        /// The offending profile ID.
        profile_id: i64,
        /// The session ID.
        session_id: i64,
    },
    /// Invoice status transition is not allowed.
    InvalidInvoiceTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },
    /// The invoice is no longer a draft and cannot be modified.
    InvoiceLocked {
        /// The invoice reference.
        reference: String,
    },
    /// The timesheet has already been validated and cannot be recomputed.
    TimesheetValidated {
        /// The profile ID.
        profile_id: i64,
        /// The day (ISO 8601 date string).
        day: String,
    },
    /// Arithmetic overflow while computing costs.
    CostOverflow,
    /// Failed to parse a date from a string.
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCanton(code) => {
                write!(f, "Invalid canton code '{code}': must be two letters")
            }
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {msg}"),
            Self::InvalidSeasonSpan {
                month_start,
                n_months,
            } => {
                write!(
                    f,
                    "Invalid season span: month {month_start}, duration {n_months}. Both must be between 1 and 12"
                )
            }
            Self::InvalidSeasonTransition { from, to } => {
                write!(f, "Cannot transition season from {from} to {to}")
            }
            Self::SeasonStateForbids { state, operation } => {
                write!(f, "Operation '{operation}' is not allowed while the season is {state}")
            }
            Self::SessionOutsideSeason { day } => {
                write!(f, "Session day {day} falls outside the season's date range")
            }
            Self::InvalidSessionTimes => {
                write!(f, "Session end time must be after its begin time")
            }
            Self::InvalidClassName(msg) => write!(f, "Invalid class name: {msg}"),
            Self::InvalidParticipantCount { count, max } => {
                write!(
                    f,
                    "Invalid participant count: {count}. Must be between 1 and {max}"
                )
            }
            Self::EquipmentExceedsParticipants {
                kind,
                count,
                participants,
            } => {
                write!(
                    f,
                    "Requested {count} {kind} for only {participants} participants"
                )
            }
            Self::TooManyHelpers { count } => {
                write!(f, "A qualification allows at most 2 helpers, got {count}")
            }
            Self::DuplicateStaffAssignment { profile_id } => {
                write!(
                    f,
                    "Profile {profile_id} holds more than one role in this qualification"
                )
            }
            Self::LeaderNotQualified { profile_id } => {
                write!(f, "Profile {profile_id} is not qualified to lead")
            }
            Self::ActorNotQualified { profile_id } => {
                write!(f, "Profile {profile_id} is not qualified as an actor")
            }
            Self::NotAvailable {
                profile_id,
                session_id,
            } => {
                write!(
                    f,
                    "Profile {profile_id} has not declared availability for session {session_id}"
                )
            }
            Self::InvalidInvoiceTransition { from, to } => {
                write!(f, "Cannot transition invoice from {from} to {to}")
            }
            Self::InvoiceLocked { reference } => {
                write!(f, "Invoice {reference} is no longer a draft and cannot be modified")
            }
            Self::TimesheetValidated { profile_id, day } => {
                write!(
                    f,
                    "Timesheet for profile {profile_id} on {day} is validated and cannot be recomputed"
                )
            }
            Self::CostOverflow => write!(f, "Arithmetic overflow while computing costs"),
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
