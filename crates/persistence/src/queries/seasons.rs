// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Season, session, and qualification queries.
//!
//! Sessions belong to a season by date range and organization canton, not
//! by foreign key. The season is a query window over the session table.

use defivelo_domain::{Canton, Qualification, Season, Session, StaffAssignment};
use diesel::prelude::*;
use diesel::SqliteConnection;
use time::Date;
use tracing::debug;

use crate::data_models::{format_day, parse_day, parse_time_of_day};
use crate::diesel_schema::{organizations, qualifications, sessions};
use crate::error::PersistenceError;

/// Diesel Queryable struct for season rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = crate::diesel_schema::seasons)]
pub(crate) struct SeasonRow {
    season_id: i64,
    year: i32,
    month_start: i32,
    n_months: i32,
    cantons: String,
    state: String,
    cost_per_participant_cents: i64,
    cost_per_bike_cents: i64,
}

impl TryFrom<SeasonRow> for Season {
    type Error = PersistenceError;

    fn try_from(row: SeasonRow) -> Result<Self, Self::Error> {
        let narrow = |value: i32, what: &str| {
            u8::try_from(value)
                .map_err(|_| PersistenceError::CorruptRecord(format!("{what} out of range: {value}")))
        };
        Ok(Self {
            season_id: Some(row.season_id),
            year: u16::try_from(row.year).map_err(|_| {
                PersistenceError::CorruptRecord(format!("year out of range: {}", row.year))
            })?,
            month_start: narrow(row.month_start, "month_start")?,
            n_months: narrow(row.n_months, "n_months")?,
            cantons: Canton::parse_list(&row.cantons)?,
            state: row.state.parse()?,
            cost_per_participant_cents: row.cost_per_participant_cents,
            cost_per_bike_cents: row.cost_per_bike_cents,
        })
    }
}

/// Diesel Queryable struct for session rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = sessions)]
pub(crate) struct SessionRow {
    session_id: i64,
    organization_id: i64,
    day: String,
    begin_time: String,
    end_time: String,
    fallback_plan: Option<String>,
}

impl TryFrom<SessionRow> for Session {
    type Error = PersistenceError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: Some(row.session_id),
            organization_id: row.organization_id,
            day: parse_day(&row.day)?,
            begin_time: parse_time_of_day(&row.begin_time)?,
            end_time: parse_time_of_day(&row.end_time)?,
            fallback_plan: row.fallback_plan,
        })
    }
}

/// Diesel Queryable struct for qualification rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = qualifications)]
pub(crate) struct QualificationRow {
    qualification_id: i64,
    session_id: i64,
    class_name: String,
    n_participants: i32,
    n_bikes: i32,
    n_helmets: i32,
    leader_id: Option<i64>,
    helper1_id: Option<i64>,
    helper2_id: Option<i64>,
    actor_id: Option<i64>,
}

impl TryFrom<QualificationRow> for Qualification {
    type Error = PersistenceError;

    fn try_from(row: QualificationRow) -> Result<Self, Self::Error> {
        let narrow = |value: i32, what: &str| {
            u16::try_from(value)
                .map_err(|_| PersistenceError::CorruptRecord(format!("{what} out of range: {value}")))
        };
        let helper_ids: Vec<i64> = [row.helper1_id, row.helper2_id]
            .into_iter()
            .flatten()
            .collect();
        Ok(Self {
            qualification_id: Some(row.qualification_id),
            session_id: row.session_id,
            class_name: row.class_name,
            n_participants: narrow(row.n_participants, "n_participants")?,
            n_bikes: narrow(row.n_bikes, "n_bikes")?,
            n_helmets: narrow(row.n_helmets, "n_helmets")?,
            staff: StaffAssignment {
                leader_id: row.leader_id,
                helper_ids,
                actor_id: row.actor_id,
            },
        })
    }
}

/// Retrieves a season by ID.
///
/// # Errors
///
/// Returns an error if the season does not exist or the query fails.
pub fn get_season(conn: &mut SqliteConnection, season_id: i64) -> Result<Season, PersistenceError> {
    debug!("Looking up season by ID: {}", season_id);

    let row: SeasonRow = crate::diesel_schema::seasons::table
        .filter(crate::diesel_schema::seasons::season_id.eq(season_id))
        .select(SeasonRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Season {season_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    row.try_into()
}

/// Lists all seasons, most recent first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_seasons(conn: &mut SqliteConnection) -> Result<Vec<Season>, PersistenceError> {
    let rows: Vec<SeasonRow> = crate::diesel_schema::seasons::table
        .order((
            crate::diesel_schema::seasons::year.desc(),
            crate::diesel_schema::seasons::month_start.desc(),
        ))
        .select(SeasonRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Retrieves a session by ID.
///
/// # Errors
///
/// Returns an error if the session does not exist or the query fails.
pub fn get_session(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Session, PersistenceError> {
    debug!("Looking up session by ID: {}", session_id);

    let row: SessionRow = sessions::table
        .filter(sessions::session_id.eq(session_id))
        .select(SessionRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Session {session_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    row.try_into()
}

/// Lists the sessions of a season: those whose day falls within the
/// season's range and whose organization is in one of its cantons.
///
/// Ordered by day, then begin time.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_sessions_in_season(
    conn: &mut SqliteConnection,
    season: &Season,
) -> Result<Vec<Session>, PersistenceError> {
    let begin: String = format_day(season.begin()?)?;
    let end: String = format_day(season.end()?)?;
    let codes: Vec<&str> = season.cantons.iter().map(Canton::code).collect();

    let rows: Vec<SessionRow> = sessions::table
        .inner_join(organizations::table)
        .filter(sessions::day.ge(&begin))
        .filter(sessions::day.le(&end))
        .filter(organizations::canton.eq_any(&codes))
        .order((sessions::day.asc(), sessions::begin_time.asc()))
        .select(SessionRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Lists one organization's sessions within a date range.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_sessions_for_organization(
    conn: &mut SqliteConnection,
    organization_id: i64,
    range_begin: Date,
    range_end: Date,
) -> Result<Vec<Session>, PersistenceError> {
    let begin: String = format_day(range_begin)?;
    let end: String = format_day(range_end)?;

    let rows: Vec<SessionRow> = sessions::table
        .filter(sessions::organization_id.eq(organization_id))
        .filter(sessions::day.ge(&begin))
        .filter(sessions::day.le(&end))
        .order((sessions::day.asc(), sessions::begin_time.asc()))
        .select(SessionRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Retrieves a qualification by ID.
///
/// # Errors
///
/// Returns an error if the qualification does not exist or the query fails.
pub fn get_qualification(
    conn: &mut SqliteConnection,
    qualification_id: i64,
) -> Result<Qualification, PersistenceError> {
    let row: QualificationRow = qualifications::table
        .filter(qualifications::qualification_id.eq(qualification_id))
        .select(QualificationRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Qualification {qualification_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    row.try_into()
}

/// Lists the qualifications of a session ordered by class name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_qualifications_for_session(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Vec<Qualification>, PersistenceError> {
    let rows: Vec<QualificationRow> = qualifications::table
        .filter(qualifications::session_id.eq(session_id))
        .order(qualifications::class_name.asc())
        .select(QualificationRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}
