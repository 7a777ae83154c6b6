// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Organization and volunteer profile queries.

use defivelo_domain::{Canton, Organization, VolunteerProfile};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::diesel_schema::{organizations, profiles};
use crate::error::PersistenceError;

/// Diesel Queryable struct for organization rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = organizations)]
pub(crate) struct OrganizationRow {
    organization_id: i64,
    name: String,
    address_street: String,
    address_zip: String,
    address_city: String,
    canton: String,
    coordinator_name: Option<String>,
}

impl TryFrom<OrganizationRow> for Organization {
    type Error = PersistenceError;

    fn try_from(row: OrganizationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            organization_id: Some(row.organization_id),
            name: row.name,
            address_street: row.address_street,
            address_zip: row.address_zip,
            address_city: row.address_city,
            canton: Canton::new(&row.canton)?,
            coordinator_name: row.coordinator_name,
        })
    }
}

/// Diesel Queryable struct for profile rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = profiles)]
pub(crate) struct ProfileRow {
    profile_id: i64,
    first_name: String,
    last_name: String,
    email: String,
    canton: String,
    can_lead: i32,
    is_actor: i32,
    has_bike: i32,
}

impl TryFrom<ProfileRow> for VolunteerProfile {
    type Error = PersistenceError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            profile_id: Some(row.profile_id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            canton: Canton::new(&row.canton)?,
            can_lead: row.can_lead != 0,
            is_actor: row.is_actor != 0,
            has_bike: row.has_bike != 0,
        })
    }
}

/// Retrieves an organization by ID.
///
/// # Errors
///
/// Returns an error if the organization does not exist or the query fails.
pub fn get_organization(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> Result<Organization, PersistenceError> {
    debug!("Looking up organization by ID: {}", organization_id);

    let row: OrganizationRow = organizations::table
        .filter(organizations::organization_id.eq(organization_id))
        .select(OrganizationRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Organization {organization_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    row.try_into()
}

/// Lists all organizations ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_organizations(
    conn: &mut SqliteConnection,
) -> Result<Vec<Organization>, PersistenceError> {
    let rows: Vec<OrganizationRow> = organizations::table
        .order(organizations::name.asc())
        .select(OrganizationRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Lists all organizations affiliated with one of the given cantons.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_organizations_in_cantons(
    conn: &mut SqliteConnection,
    cantons: &[Canton],
) -> Result<Vec<Organization>, PersistenceError> {
    let codes: Vec<&str> = cantons.iter().map(Canton::code).collect();
    let rows: Vec<OrganizationRow> = organizations::table
        .filter(organizations::canton.eq_any(&codes))
        .order(organizations::name.asc())
        .select(OrganizationRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Retrieves a volunteer profile by ID.
///
/// # Errors
///
/// Returns an error if the profile does not exist or the query fails.
pub fn get_profile(
    conn: &mut SqliteConnection,
    profile_id: i64,
) -> Result<VolunteerProfile, PersistenceError> {
    debug!("Looking up profile by ID: {}", profile_id);

    let row: ProfileRow = profiles::table
        .filter(profiles::profile_id.eq(profile_id))
        .select(ProfileRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Profile {profile_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    row.try_into()
}

/// Retrieves a volunteer profile by its calendar feed token.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no profile carries the token.
pub fn get_profile_by_calendar_token(
    conn: &mut SqliteConnection,
    token: &str,
) -> Result<Option<VolunteerProfile>, PersistenceError> {
    let result: Result<ProfileRow, diesel::result::Error> = profiles::table
        .filter(profiles::calendar_token.eq(token))
        .select(ProfileRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(row.try_into()?)),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Retrieves the calendar feed token for a profile.
///
/// # Errors
///
/// Returns an error if the profile does not exist or the query fails.
pub fn get_calendar_token(
    conn: &mut SqliteConnection,
    profile_id: i64,
) -> Result<String, PersistenceError> {
    profiles::table
        .filter(profiles::profile_id.eq(profile_id))
        .select(profiles::calendar_token)
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Profile {profile_id}"))
            }
            other => PersistenceError::from(other),
        })
}

/// Lists all volunteer profiles ordered by last name, then first name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_profiles(
    conn: &mut SqliteConnection,
) -> Result<Vec<VolunteerProfile>, PersistenceError> {
    let rows: Vec<ProfileRow> = profiles::table
        .order((profiles::last_name.asc(), profiles::first_name.asc()))
        .select(ProfileRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Lists the volunteer profiles with the given IDs.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_profiles_by_ids(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> Result<Vec<VolunteerProfile>, PersistenceError> {
    let rows: Vec<ProfileRow> = profiles::table
        .filter(profiles::profile_id.eq_any(ids))
        .select(ProfileRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Lists all volunteer profiles affiliated with one of the given cantons.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_profiles_in_cantons(
    conn: &mut SqliteConnection,
    cantons: &[Canton],
) -> Result<Vec<VolunteerProfile>, PersistenceError> {
    let codes: Vec<&str> = cantons.iter().map(Canton::code).collect();
    let rows: Vec<ProfileRow> = profiles::table
        .filter(profiles::canton.eq_any(&codes))
        .order((profiles::last_name.asc(), profiles::first_name.asc()))
        .select(ProfileRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}
