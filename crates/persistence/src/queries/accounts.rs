// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account and login session queries.

use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::data_models::{AccountData, LoginSessionData};
use crate::diesel_schema::{accounts, login_sessions};
use crate::error::PersistenceError;

/// Diesel Queryable struct for account rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = accounts)]
struct AccountRow {
    account_id: i64,
    login_email: String,
    display_name: String,
    password_hash: String,
    role: String,
    managed_cantons: String,
    profile_id: Option<i64>,
    is_disabled: i32,
    created_at: String,
    last_login_at: Option<String>,
}

impl From<AccountRow> for AccountData {
    fn from(row: AccountRow) -> Self {
        Self {
            account_id: row.account_id,
            login_email: row.login_email,
            display_name: row.display_name,
            password_hash: row.password_hash,
            role: row.role,
            managed_cantons: row.managed_cantons,
            profile_id: row.profile_id,
            is_disabled: row.is_disabled != 0,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        }
    }
}

/// Diesel Queryable struct for login session rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = login_sessions)]
struct LoginSessionRow {
    login_session_id: i64,
    session_token: String,
    account_id: i64,
    created_at: String,
    last_activity_at: String,
    expires_at: String,
}

/// Retrieves an account by login email.
///
/// The email is normalized to lowercase for case-insensitive lookup.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the account is not found.
pub fn get_account_by_login(
    conn: &mut SqliteConnection,
    login_email: &str,
) -> Result<Option<AccountData>, PersistenceError> {
    let normalized: String = login_email.to_lowercase();

    debug!("Looking up account by login_email: {}", normalized);

    let result: Result<AccountRow, diesel::result::Error> = accounts::table
        .filter(accounts::login_email.eq(&normalized))
        .select(AccountRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(row.into())),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Retrieves an account by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the account is not found.
pub fn get_account_by_id(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<Option<AccountData>, PersistenceError> {
    debug!("Looking up account by ID: {}", account_id);

    let result: Result<AccountRow, diesel::result::Error> = accounts::table
        .filter(accounts::account_id.eq(account_id))
        .select(AccountRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(row.into())),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Lists all accounts ordered by login email.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_accounts(conn: &mut SqliteConnection) -> Result<Vec<AccountData>, PersistenceError> {
    let rows: Vec<AccountRow> = accounts::table
        .order(accounts::login_email.asc())
        .select(AccountRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Counts the number of active power user accounts.
///
/// Used to prevent disabling or deleting the last power user.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_active_power_users(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(accounts::table
        .filter(accounts::role.eq("PowerUser"))
        .filter(accounts::is_disabled.eq(0))
        .count()
        .get_result(conn)?)
}

/// Retrieves a login session by token.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the session is not found.
pub fn get_login_session_by_token(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<Option<LoginSessionData>, PersistenceError> {
    debug!("Looking up login session by token");

    let result: Result<LoginSessionRow, diesel::result::Error> = login_sessions::table
        .filter(login_sessions::session_token.eq(session_token))
        .select(LoginSessionRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(LoginSessionData {
            login_session_id: row.login_session_id,
            session_token: row.session_token,
            account_id: row.account_id,
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
            expires_at: row.expires_at,
        })),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Verifies a password against a stored bcrypt hash.
///
/// # Errors
///
/// Returns an error if the hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| PersistenceError::Other(format!("Failed to verify password: {e}")))
}
