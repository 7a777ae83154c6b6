// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Season, session, and qualification mutations.

use defivelo_domain::{Canton, Qualification, Season, Session, StaffAssignment};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::data_models::{format_day, format_time_of_day};
use crate::diesel_schema::{availabilities, qualifications, seasons, sessions};
use crate::error::PersistenceError;
use crate::sqlite::last_insert_rowid;

/// Creates a new season.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_season(
    conn: &mut SqliteConnection,
    season: &Season,
) -> Result<i64, PersistenceError> {
    info!(
        "Creating season: {}-{:02} over {} months",
        season.year, season.month_start, season.n_months
    );

    diesel::insert_into(seasons::table)
        .values((
            seasons::year.eq(i32::from(season.year)),
            seasons::month_start.eq(i32::from(season.month_start)),
            seasons::n_months.eq(i32::from(season.n_months)),
            seasons::cantons.eq(Canton::format_list(&season.cantons)),
            seasons::state.eq(season.state.as_str()),
            seasons::cost_per_participant_cents.eq(season.cost_per_participant_cents),
            seasons::cost_per_bike_cents.eq(season.cost_per_bike_cents),
        ))
        .execute(conn)?;

    last_insert_rowid(conn)
}

/// Updates a season's span, cantons, and prices.
///
/// # Errors
///
/// Returns an error if the season doesn't exist or the update fails.
pub fn update_season(
    conn: &mut SqliteConnection,
    season_id: i64,
    season: &Season,
) -> Result<(), PersistenceError> {
    let updated = diesel::update(seasons::table.filter(seasons::season_id.eq(season_id)))
        .set((
            seasons::year.eq(i32::from(season.year)),
            seasons::month_start.eq(i32::from(season.month_start)),
            seasons::n_months.eq(i32::from(season.n_months)),
            seasons::cantons.eq(Canton::format_list(&season.cantons)),
            seasons::cost_per_participant_cents.eq(season.cost_per_participant_cents),
            seasons::cost_per_bike_cents.eq(season.cost_per_bike_cents),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Season {season_id}")));
    }
    Ok(())
}

/// Updates a season's lifecycle state.
///
/// The transition must already have been validated against the domain
/// lifecycle rules.
///
/// # Errors
///
/// Returns an error if the season doesn't exist or the update fails.
pub fn update_season_state(
    conn: &mut SqliteConnection,
    season_id: i64,
    state: &str,
) -> Result<(), PersistenceError> {
    info!("Transitioning season {} to {}", season_id, state);

    let updated = diesel::update(seasons::table.filter(seasons::season_id.eq(season_id)))
        .set(seasons::state.eq(state))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Season {season_id}")));
    }
    Ok(())
}

/// Creates a new session.
///
/// # Errors
///
/// Returns an error if the insert fails or the `(organization, day, begin)`
/// slot is already taken.
pub fn create_session(
    conn: &mut SqliteConnection,
    session: &Session,
) -> Result<i64, PersistenceError> {
    info!(
        "Creating session for organization {} on {}",
        session.organization_id, session.day
    );

    diesel::insert_into(sessions::table)
        .values((
            sessions::organization_id.eq(session.organization_id),
            sessions::day.eq(format_day(session.day)?),
            sessions::begin_time.eq(format_time_of_day(session.begin_time)?),
            sessions::end_time.eq(format_time_of_day(session.end_time)?),
            sessions::fallback_plan.eq(&session.fallback_plan),
        ))
        .execute(conn)?;

    last_insert_rowid(conn)
}

/// Updates an existing session.
///
/// # Errors
///
/// Returns an error if the session doesn't exist or the update fails.
pub fn update_session(
    conn: &mut SqliteConnection,
    session_id: i64,
    session: &Session,
) -> Result<(), PersistenceError> {
    let updated = diesel::update(sessions::table.filter(sessions::session_id.eq(session_id)))
        .set((
            sessions::organization_id.eq(session.organization_id),
            sessions::day.eq(format_day(session.day)?),
            sessions::begin_time.eq(format_time_of_day(session.begin_time)?),
            sessions::end_time.eq(format_time_of_day(session.end_time)?),
            sessions::fallback_plan.eq(&session.fallback_plan),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Session {session_id}")));
    }
    Ok(())
}

/// Deletes a session together with its qualifications and availabilities.
///
/// Runs in a transaction so a partial delete is never visible.
///
/// # Errors
///
/// Returns an error if the session doesn't exist or the delete fails.
pub fn delete_session(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<(), PersistenceError> {
    info!("Deleting session: {}", session_id);

    conn.transaction(|conn| {
        diesel::delete(availabilities::table.filter(availabilities::session_id.eq(session_id)))
            .execute(conn)?;
        diesel::delete(qualifications::table.filter(qualifications::session_id.eq(session_id)))
            .execute(conn)?;
        let deleted =
            diesel::delete(sessions::table.filter(sessions::session_id.eq(session_id)))
                .execute(conn)?;

        if deleted == 0 {
            return Err(PersistenceError::NotFound(format!("Session {session_id}")));
        }
        Ok(())
    })
}

/// Extracts the two helper slots from a staff assignment.
fn helper_slots(staff: &StaffAssignment) -> (Option<i64>, Option<i64>) {
    (
        staff.helper_ids.first().copied(),
        staff.helper_ids.get(1).copied(),
    )
}

/// Creates a new qualification.
///
/// # Errors
///
/// Returns an error if the insert fails or the class name is already used
/// within the session.
pub fn create_qualification(
    conn: &mut SqliteConnection,
    qualification: &Qualification,
) -> Result<i64, PersistenceError> {
    info!(
        "Creating qualification '{}' for session {}",
        qualification.class_name, qualification.session_id
    );

    let (helper1, helper2) = helper_slots(&qualification.staff);

    diesel::insert_into(qualifications::table)
        .values((
            qualifications::session_id.eq(qualification.session_id),
            qualifications::class_name.eq(&qualification.class_name),
            qualifications::n_participants.eq(i32::from(qualification.n_participants)),
            qualifications::n_bikes.eq(i32::from(qualification.n_bikes)),
            qualifications::n_helmets.eq(i32::from(qualification.n_helmets)),
            qualifications::leader_id.eq(qualification.staff.leader_id),
            qualifications::helper1_id.eq(helper1),
            qualifications::helper2_id.eq(helper2),
            qualifications::actor_id.eq(qualification.staff.actor_id),
        ))
        .execute(conn)?;

    last_insert_rowid(conn)
}

/// Updates a qualification's class data.
///
/// Staff assignments are updated separately via `update_qualification_staff`.
///
/// # Errors
///
/// Returns an error if the qualification doesn't exist or the update fails.
pub fn update_qualification(
    conn: &mut SqliteConnection,
    qualification_id: i64,
    qualification: &Qualification,
) -> Result<(), PersistenceError> {
    let updated = diesel::update(
        qualifications::table.filter(qualifications::qualification_id.eq(qualification_id)),
    )
    .set((
        qualifications::class_name.eq(&qualification.class_name),
        qualifications::n_participants.eq(i32::from(qualification.n_participants)),
        qualifications::n_bikes.eq(i32::from(qualification.n_bikes)),
        qualifications::n_helmets.eq(i32::from(qualification.n_helmets)),
    ))
    .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Qualification {qualification_id}"
        )));
    }
    Ok(())
}

/// Replaces a qualification's staff assignment.
///
/// # Errors
///
/// Returns an error if the qualification doesn't exist or the update fails.
pub fn update_qualification_staff(
    conn: &mut SqliteConnection,
    qualification_id: i64,
    staff: &StaffAssignment,
) -> Result<(), PersistenceError> {
    let (helper1, helper2) = helper_slots(staff);

    let updated = diesel::update(
        qualifications::table.filter(qualifications::qualification_id.eq(qualification_id)),
    )
    .set((
        qualifications::leader_id.eq(staff.leader_id),
        qualifications::helper1_id.eq(helper1),
        qualifications::helper2_id.eq(helper2),
        qualifications::actor_id.eq(staff.actor_id),
    ))
    .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Qualification {qualification_id}"
        )));
    }
    Ok(())
}

/// Deletes a qualification.
///
/// # Errors
///
/// Returns an error if the qualification doesn't exist or the delete fails.
pub fn delete_qualification(
    conn: &mut SqliteConnection,
    qualification_id: i64,
) -> Result<(), PersistenceError> {
    let deleted = diesel::delete(
        qualifications::table.filter(qualifications::qualification_id.eq(qualification_id)),
    )
    .execute(conn)?;

    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Qualification {qualification_id}"
        )));
    }
    Ok(())
}
