// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Serializable row representations and the date/time storage encoding.
//!
//! Dates are stored as `YYYY-MM-DD`, times of day as `HH:MM`, and
//! timestamps as RFC 3339 strings. All conversions go through the helpers
//! here so the encoding stays uniform across tables.

use defivelo_domain::DomainError;
use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

use crate::error::PersistenceError;

const DAY_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]");

/// Formats a calendar day for storage.
///
/// # Errors
///
/// Returns an error if formatting fails.
pub fn format_day(day: Date) -> Result<String, PersistenceError> {
    day.format(&DAY_FORMAT)
        .map_err(|e| PersistenceError::Other(format!("Failed to format date: {e}")))
}

/// Parses a stored calendar day.
///
/// # Errors
///
/// Returns an error if the stored string is not a valid `YYYY-MM-DD` date.
pub fn parse_day(value: &str) -> Result<Date, PersistenceError> {
    Date::parse(value, &DAY_FORMAT).map_err(|e| {
        PersistenceError::from(DomainError::DateParseError {
            date_string: value.to_string(),
            error: e.to_string(),
        })
    })
}

/// Formats a time of day for storage.
///
/// # Errors
///
/// Returns an error if formatting fails.
pub fn format_time_of_day(value: Time) -> Result<String, PersistenceError> {
    value
        .format(&TIME_FORMAT)
        .map_err(|e| PersistenceError::Other(format!("Failed to format time: {e}")))
}

/// Parses a stored time of day.
///
/// # Errors
///
/// Returns an error if the stored string is not a valid `HH:MM` time.
pub fn parse_time_of_day(value: &str) -> Result<Time, PersistenceError> {
    Time::parse(value, &TIME_FORMAT).map_err(|e| {
        PersistenceError::from(DomainError::DateParseError {
            date_string: value.to_string(),
            error: e.to_string(),
        })
    })
}

/// Returns the current UTC time as an RFC 3339 timestamp string.
///
/// # Errors
///
/// Returns an error if formatting fails.
pub fn now_utc_string() -> Result<String, PersistenceError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::Other(format!("Failed to format timestamp: {e}")))
}

/// Parses a stored RFC 3339 timestamp.
///
/// # Errors
///
/// Returns an error if the stored string is not a valid timestamp.
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| PersistenceError::Other(format!("Failed to parse timestamp '{value}': {e}")))
}

/// Serializable representation of an intranet login account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountData {
    pub account_id: i64,
    pub login_email: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: String,
    pub managed_cantons: String,
    pub profile_id: Option<i64>,
    pub is_disabled: bool,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

/// Serializable representation of a login session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSessionData {
    pub login_session_id: i64,
    pub session_token: String,
    pub account_id: i64,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}

/// Serializable representation of an invoice header.
///
/// Lines are stored separately and carried as domain `InvoiceLine` values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceData {
    pub invoice_id: i64,
    pub reference: String,
    pub season_id: i64,
    pub organization_id: i64,
    pub status: String,
    pub created_at: String,
}
