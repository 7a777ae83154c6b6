// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Availability and chosen-role mutations.

use defivelo_domain::{Availability, ChosenRole};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::diesel_schema::availabilities;
use crate::error::PersistenceError;
use crate::sqlite::last_insert_rowid;

/// Records or updates a volunteer's declared availability for a session.
///
/// Upserts on the `(profile, session)` pair. A fresh declaration resets
/// the chosen role to `NotChosen`; changing an existing declaration leaves
/// the chosen role untouched.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn set_availability(
    conn: &mut SqliteConnection,
    profile_id: i64,
    session_id: i64,
    availability: Availability,
) -> Result<i64, PersistenceError> {
    debug!(
        "Setting availability {} for profile {} on session {}",
        availability, profile_id, session_id
    );

    let existing: Option<i64> = availabilities::table
        .filter(availabilities::profile_id.eq(profile_id))
        .filter(availabilities::session_id.eq(session_id))
        .select(availabilities::availability_id)
        .first(conn)
        .optional()?;

    if let Some(availability_id) = existing {
        diesel::update(
            availabilities::table.filter(availabilities::availability_id.eq(availability_id)),
        )
        .set(availabilities::availability.eq(availability.as_str()))
        .execute(conn)?;
        Ok(availability_id)
    } else {
        diesel::insert_into(availabilities::table)
            .values((
                availabilities::profile_id.eq(profile_id),
                availabilities::session_id.eq(session_id),
                availabilities::availability.eq(availability.as_str()),
                availabilities::chosen_as.eq(ChosenRole::NotChosen.as_str()),
            ))
            .execute(conn)?;
        last_insert_rowid(conn)
    }
}

/// Sets the role a volunteer was chosen for on a session.
///
/// The choice must already have been validated against the declared
/// availability.
///
/// # Errors
///
/// Returns an error if no availability record exists for the pair.
pub fn set_chosen_role(
    conn: &mut SqliteConnection,
    profile_id: i64,
    session_id: i64,
    role: ChosenRole,
) -> Result<(), PersistenceError> {
    debug!(
        "Choosing profile {} as {} on session {}",
        profile_id, role, session_id
    );

    let updated = diesel::update(
        availabilities::table
            .filter(availabilities::profile_id.eq(profile_id))
            .filter(availabilities::session_id.eq(session_id)),
    )
    .set(availabilities::chosen_as.eq(role.as_str()))
    .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Availability for profile {profile_id} on session {session_id}"
        )));
    }
    Ok(())
}
