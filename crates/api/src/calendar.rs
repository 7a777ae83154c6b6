// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! iCalendar feed of a volunteer's chosen assignments.
//!
//! The feed is addressed by the profile's calendar token instead of a
//! login session: the token is the capability, so no other auth applies.

use defivelo_domain::{ChosenRole, Organization, Session, VolunteerProfile};
use defivelo_persistence::Persistence;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

use crate::error::{ApiError, translate_persistence_error};

/// Compact date-time format for DTSTART/DTEND, rendered as floating local
/// time.
const ICS_DATETIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year][month][day]T[hour][minute][second]");

/// Escapes text per RFC 5545 section 3.3.11.
fn escape_ics_text(text: &str) -> String {
    let mut escaped: String = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

fn format_ics_datetime(day: Date, time_of_day: Time) -> Result<String, ApiError> {
    day.with_time(time_of_day)
        .format(&ICS_DATETIME_FORMAT)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to format calendar timestamp: {e}"),
        })
}

fn role_label(role: ChosenRole) -> &'static str {
    match role {
        ChosenRole::Leader => "Moniteur 2",
        ChosenRole::Helper => "Moniteur 1",
        ChosenRole::Actor => "Intervenant",
        ChosenRole::NotChosen => "",
    }
}

/// Renders the iCalendar feed for the profile holding the given token.
///
/// Returns `None` when no profile carries the token, so the server can
/// answer 404 without revealing whether tokens exist.
///
/// # Errors
///
/// Returns an error if a query fails or a record cannot be rendered.
pub fn render_calendar_feed(
    persistence: &mut Persistence,
    calendar_token: &str,
) -> Result<Option<String>, ApiError> {
    let profile: Option<VolunteerProfile> = persistence
        .get_profile_by_calendar_token(calendar_token)
        .map_err(translate_persistence_error)?;
    let Some(profile) = profile else {
        return Ok(None);
    };
    let profile_id: i64 = profile.profile_id.ok_or_else(|| ApiError::Internal {
        message: String::from("Profile is missing its database ID"),
    })?;

    let assignments: Vec<(Session, ChosenRole)> = persistence
        .list_chosen_sessions_for_profile(profile_id)
        .map_err(translate_persistence_error)?;

    let dtstamp: String = format_ics_datetime(
        OffsetDateTime::now_utc().date(),
        OffsetDateTime::now_utc().time(),
    )?;

    let mut feed: String = String::new();
    feed.push_str("BEGIN:VCALENDAR\r\n");
    feed.push_str("VERSION:2.0\r\n");
    feed.push_str("PRODID:-//Defi Velo//Intranet//FR\r\n");
    feed.push_str("CALSCALE:GREGORIAN\r\n");

    for (session, role) in &assignments {
        if *role == ChosenRole::NotChosen {
            continue;
        }
        let session_id: i64 = session.session_id.ok_or_else(|| ApiError::Internal {
            message: String::from("Session is missing its database ID"),
        })?;
        let organization: Organization = persistence
            .get_organization(session.organization_id)
            .map_err(translate_persistence_error)?;

        feed.push_str("BEGIN:VEVENT\r\n");
        feed.push_str(&format!("UID:session-{session_id}@defi-velo\r\n"));
        feed.push_str(&format!("DTSTAMP:{dtstamp}Z\r\n"));
        feed.push_str(&format!(
            "DTSTART:{}\r\n",
            format_ics_datetime(session.day, session.begin_time)?
        ));
        feed.push_str(&format!(
            "DTEND:{}\r\n",
            format_ics_datetime(session.day, session.end_time)?
        ));
        feed.push_str(&format!(
            "SUMMARY:{}\r\n",
            escape_ics_text(&format!(
                "Défi Vélo ({}) - {}",
                role_label(*role),
                organization.name
            ))
        ));
        feed.push_str(&format!(
            "LOCATION:{}\r\n",
            escape_ics_text(&format!(
                "{}, {} {}",
                organization.address_street, organization.address_zip, organization.address_city
            ))
        ));
        feed.push_str("END:VEVENT\r\n");
    }

    feed.push_str("END:VCALENDAR\r\n");
    Ok(Some(feed))
}
