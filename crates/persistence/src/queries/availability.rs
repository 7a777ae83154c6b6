// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Availability and chosen-role queries.

use defivelo_domain::{ChosenRole, Session, SessionAvailability};
use diesel::prelude::*;
use diesel::SqliteConnection;
use time::Date;

use crate::data_models::{format_day, parse_day};
use crate::diesel_schema::{availabilities, sessions};
use crate::error::PersistenceError;
use crate::queries::seasons::SessionRow;

/// Diesel Queryable struct for availability rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = availabilities)]
pub(crate) struct AvailabilityRow {
    availability_id: i64,
    profile_id: i64,
    session_id: i64,
    availability: String,
    chosen_as: String,
}

impl TryFrom<AvailabilityRow> for SessionAvailability {
    type Error = PersistenceError;

    fn try_from(row: AvailabilityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            availability_id: Some(row.availability_id),
            profile_id: row.profile_id,
            session_id: row.session_id,
            availability: row.availability.parse()?,
            chosen_as: row.chosen_as.parse()?,
        })
    }
}

/// Retrieves one volunteer's availability record for one session.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no declaration exists.
pub fn get_availability(
    conn: &mut SqliteConnection,
    profile_id: i64,
    session_id: i64,
) -> Result<Option<SessionAvailability>, PersistenceError> {
    let result: Result<AvailabilityRow, diesel::result::Error> = availabilities::table
        .filter(availabilities::profile_id.eq(profile_id))
        .filter(availabilities::session_id.eq(session_id))
        .select(AvailabilityRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(row.try_into()?)),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Lists all availability records for a session.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_availabilities_for_session(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Vec<SessionAvailability>, PersistenceError> {
    let rows: Vec<AvailabilityRow> = availabilities::table
        .filter(availabilities::session_id.eq(session_id))
        .order(availabilities::profile_id.asc())
        .select(AvailabilityRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Lists all availability records for the given sessions.
///
/// Backs the per-season availability grid.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_availabilities_for_sessions(
    conn: &mut SqliteConnection,
    session_ids: &[i64],
) -> Result<Vec<SessionAvailability>, PersistenceError> {
    let rows: Vec<AvailabilityRow> = availabilities::table
        .filter(availabilities::session_id.eq_any(session_ids))
        .order((
            availabilities::profile_id.asc(),
            availabilities::session_id.asc(),
        ))
        .select(AvailabilityRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Lists the sessions a volunteer was chosen to work, with the role.
///
/// Backs the personal calendar feed. Ordered by day, then begin time.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_chosen_sessions_for_profile(
    conn: &mut SqliteConnection,
    profile_id: i64,
) -> Result<Vec<(Session, ChosenRole)>, PersistenceError> {
    let rows: Vec<(SessionRow, String)> = availabilities::table
        .inner_join(sessions::table)
        .filter(availabilities::profile_id.eq(profile_id))
        .filter(availabilities::chosen_as.ne("NotChosen"))
        .order((sessions::day.asc(), sessions::begin_time.asc()))
        .select((SessionRow::as_select(), availabilities::chosen_as))
        .load(conn)?;

    rows.into_iter()
        .map(|(session_row, chosen)| Ok((session_row.try_into()?, chosen.parse()?)))
        .collect()
}

/// Lists `(profile_id, day, chosen_as)` for every chosen assignment in a
/// date range.
///
/// Backs timesheet generation: the caller aggregates the rows into per-day
/// role counts.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_chosen_roles_in_range(
    conn: &mut SqliteConnection,
    range_begin: Date,
    range_end: Date,
) -> Result<Vec<(i64, Date, ChosenRole)>, PersistenceError> {
    let begin: String = format_day(range_begin)?;
    let end: String = format_day(range_end)?;

    let rows: Vec<(i64, String, String)> = availabilities::table
        .inner_join(sessions::table)
        .filter(availabilities::chosen_as.ne("NotChosen"))
        .filter(sessions::day.ge(&begin))
        .filter(sessions::day.le(&end))
        .order((availabilities::profile_id.asc(), sessions::day.asc()))
        .select((availabilities::profile_id, sessions::day, availabilities::chosen_as))
        .load(conn)?;

    rows.into_iter()
        .map(|(profile_id, day, chosen)| Ok((profile_id, parse_day(&day)?, chosen.parse()?)))
        .collect()
}
