// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Organization and volunteer profile mutations.

use defivelo_domain::{Organization, VolunteerProfile};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::diesel_schema::{organizations, profiles};
use crate::error::PersistenceError;
use crate::sqlite::last_insert_rowid;

/// Creates a new organization.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_organization(
    conn: &mut SqliteConnection,
    organization: &Organization,
) -> Result<i64, PersistenceError> {
    info!("Creating organization: {}", organization.name);

    diesel::insert_into(organizations::table)
        .values((
            organizations::name.eq(&organization.name),
            organizations::address_street.eq(&organization.address_street),
            organizations::address_zip.eq(&organization.address_zip),
            organizations::address_city.eq(&organization.address_city),
            organizations::canton.eq(organization.canton.code()),
            organizations::coordinator_name.eq(&organization.coordinator_name),
        ))
        .execute(conn)?;

    last_insert_rowid(conn)
}

/// Updates an existing organization.
///
/// # Errors
///
/// Returns an error if the organization doesn't exist or the update fails.
pub fn update_organization(
    conn: &mut SqliteConnection,
    organization_id: i64,
    organization: &Organization,
) -> Result<(), PersistenceError> {
    let updated = diesel::update(
        organizations::table.filter(organizations::organization_id.eq(organization_id)),
    )
    .set((
        organizations::name.eq(&organization.name),
        organizations::address_street.eq(&organization.address_street),
        organizations::address_zip.eq(&organization.address_zip),
        organizations::address_city.eq(&organization.address_city),
        organizations::canton.eq(organization.canton.code()),
        organizations::coordinator_name.eq(&organization.coordinator_name),
    ))
    .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Organization {organization_id}"
        )));
    }
    Ok(())
}

/// Deletes an organization.
///
/// Fails with a foreign key violation if the organization still has
/// sessions.
///
/// # Errors
///
/// Returns an error if the organization doesn't exist or is referenced.
pub fn delete_organization(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> Result<(), PersistenceError> {
    info!("Deleting organization: {}", organization_id);

    let deleted = diesel::delete(
        organizations::table.filter(organizations::organization_id.eq(organization_id)),
    )
    .execute(conn)?;

    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Organization {organization_id}"
        )));
    }
    Ok(())
}

/// Creates a new volunteer profile.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `profile` - The validated profile to store
/// * `calendar_token` - The generated calendar feed token
///
/// # Errors
///
/// Returns an error if the insert fails or the email already exists.
pub fn create_profile(
    conn: &mut SqliteConnection,
    profile: &VolunteerProfile,
    calendar_token: &str,
) -> Result<i64, PersistenceError> {
    info!("Creating profile: {}", profile.sort_name());

    diesel::insert_into(profiles::table)
        .values((
            profiles::first_name.eq(&profile.first_name),
            profiles::last_name.eq(&profile.last_name),
            profiles::email.eq(&profile.email),
            profiles::canton.eq(profile.canton.code()),
            profiles::can_lead.eq(i32::from(profile.can_lead)),
            profiles::is_actor.eq(i32::from(profile.is_actor)),
            profiles::has_bike.eq(i32::from(profile.has_bike)),
            profiles::calendar_token.eq(calendar_token),
        ))
        .execute(conn)?;

    last_insert_rowid(conn)
}

/// Updates an existing volunteer profile.
///
/// The calendar feed token is left untouched.
///
/// # Errors
///
/// Returns an error if the profile doesn't exist or the update fails.
pub fn update_profile(
    conn: &mut SqliteConnection,
    profile_id: i64,
    profile: &VolunteerProfile,
) -> Result<(), PersistenceError> {
    let updated = diesel::update(profiles::table.filter(profiles::profile_id.eq(profile_id)))
        .set((
            profiles::first_name.eq(&profile.first_name),
            profiles::last_name.eq(&profile.last_name),
            profiles::email.eq(&profile.email),
            profiles::canton.eq(profile.canton.code()),
            profiles::can_lead.eq(i32::from(profile.can_lead)),
            profiles::is_actor.eq(i32::from(profile.is_actor)),
            profiles::has_bike.eq(i32::from(profile.has_bike)),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Profile {profile_id}")));
    }
    Ok(())
}

/// Deletes a volunteer profile.
///
/// Fails with a foreign key violation if the profile is still referenced
/// by availabilities, qualifications, or timesheets.
///
/// # Errors
///
/// Returns an error if the profile doesn't exist or is referenced.
pub fn delete_profile(
    conn: &mut SqliteConnection,
    profile_id: i64,
) -> Result<(), PersistenceError> {
    info!("Deleting profile: {}", profile_id);

    let deleted = diesel::delete(profiles::table.filter(profiles::profile_id.eq(profile_id)))
        .execute(conn)?;

    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!("Profile {profile_id}")));
    }
    Ok(())
}
