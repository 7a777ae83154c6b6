// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account and login session mutations.

use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::{debug, info};

use crate::data_models::now_utc_string;
use crate::diesel_schema::{accounts, login_sessions};
use crate::error::PersistenceError;
use crate::sqlite::last_insert_rowid;

/// Creates a new account.
///
/// The login email is normalized to lowercase for case-insensitive
/// uniqueness. The password is hashed with bcrypt before storage.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `login_email` - The login email (will be normalized)
/// * `display_name` - The display name
/// * `password` - The plain-text password (will be hashed)
/// * `role` - The role (`PowerUser`, `Coordinator`, or `Collaborator`)
/// * `managed_cantons` - Comma-separated canton codes for coordinators
/// * `profile_id` - The linked volunteer profile for collaborators
///
/// # Errors
///
/// Returns an error if the account cannot be created or the login email
/// already exists.
pub fn create_account(
    conn: &mut SqliteConnection,
    login_email: &str,
    display_name: &str,
    password: &str,
    role: &str,
    managed_cantons: &str,
    profile_id: Option<i64>,
) -> Result<i64, PersistenceError> {
    let normalized: String = login_email.to_lowercase();

    info!(
        "Creating account with login_email: {}, role: {}",
        normalized, role
    );

    let password_hash: String = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))?;
    let created_at: String = now_utc_string()?;

    diesel::insert_into(accounts::table)
        .values((
            accounts::login_email.eq(&normalized),
            accounts::display_name.eq(display_name),
            accounts::password_hash.eq(&password_hash),
            accounts::role.eq(role),
            accounts::managed_cantons.eq(managed_cantons),
            accounts::profile_id.eq(profile_id),
            accounts::is_disabled.eq(0),
            accounts::created_at.eq(&created_at),
        ))
        .execute(conn)?;

    last_insert_rowid(conn)
}

/// Updates an account's display name, role, managed cantons, and profile link.
///
/// # Errors
///
/// Returns an error if the account doesn't exist or the update fails.
pub fn update_account(
    conn: &mut SqliteConnection,
    account_id: i64,
    display_name: &str,
    role: &str,
    managed_cantons: &str,
    profile_id: Option<i64>,
) -> Result<(), PersistenceError> {
    let updated = diesel::update(accounts::table.filter(accounts::account_id.eq(account_id)))
        .set((
            accounts::display_name.eq(display_name),
            accounts::role.eq(role),
            accounts::managed_cantons.eq(managed_cantons),
            accounts::profile_id.eq(profile_id),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::AccountNotFound(account_id.to_string()));
    }
    Ok(())
}

/// Updates an account's password.
///
/// # Errors
///
/// Returns an error if the account doesn't exist or the update fails.
pub fn update_password(
    conn: &mut SqliteConnection,
    account_id: i64,
    new_password: &str,
) -> Result<(), PersistenceError> {
    info!("Updating password for account: {}", account_id);

    let password_hash: String = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))?;

    let updated = diesel::update(accounts::table.filter(accounts::account_id.eq(account_id)))
        .set(accounts::password_hash.eq(&password_hash))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::AccountNotFound(account_id.to_string()));
    }
    Ok(())
}

/// Disables an account.
///
/// # Errors
///
/// Returns an error if the account doesn't exist or the update fails.
pub fn disable_account(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<(), PersistenceError> {
    info!("Disabling account: {}", account_id);

    let updated = diesel::update(accounts::table.filter(accounts::account_id.eq(account_id)))
        .set(accounts::is_disabled.eq(1))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::AccountNotFound(account_id.to_string()));
    }
    Ok(())
}

/// Re-enables a disabled account.
///
/// # Errors
///
/// Returns an error if the account doesn't exist or the update fails.
pub fn enable_account(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<(), PersistenceError> {
    info!("Enabling account: {}", account_id);

    let updated = diesel::update(accounts::table.filter(accounts::account_id.eq(account_id)))
        .set(accounts::is_disabled.eq(0))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::AccountNotFound(account_id.to_string()));
    }
    Ok(())
}

/// Deletes an account that has never been used.
///
/// An account that has logged in at least once is kept for traceability
/// and must be disabled instead.
///
/// # Errors
///
/// Returns an error if the account doesn't exist or has already been
/// used.
pub fn delete_account(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<(), PersistenceError> {
    info!("Deleting account: {}", account_id);

    let last_login: Option<Option<String>> = accounts::table
        .filter(accounts::account_id.eq(account_id))
        .select(accounts::last_login_at)
        .first(conn)
        .optional()?;
    match last_login {
        None => return Err(PersistenceError::AccountNotFound(account_id.to_string())),
        Some(Some(_)) => {
            return Err(PersistenceError::Conflict(format!(
                "Account {account_id} has been used and can only be disabled"
            )));
        }
        Some(None) => {}
    }

    diesel::delete(login_sessions::table.filter(login_sessions::account_id.eq(account_id)))
        .execute(conn)?;
    diesel::delete(accounts::table.filter(accounts::account_id.eq(account_id))).execute(conn)?;
    Ok(())
}

/// Updates the last login timestamp for an account.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_last_login(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<(), PersistenceError> {
    let now: String = now_utc_string()?;
    diesel::update(accounts::table.filter(accounts::account_id.eq(account_id)))
        .set(accounts::last_login_at.eq(&now))
        .execute(conn)?;
    Ok(())
}

/// Creates a new login session for an account.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `session_token` - The unique session token
/// * `account_id` - The account ID
/// * `expires_at` - The expiration timestamp (RFC 3339)
///
/// # Errors
///
/// Returns an error if the session cannot be created.
pub fn create_login_session(
    conn: &mut SqliteConnection,
    session_token: &str,
    account_id: i64,
    expires_at: &str,
) -> Result<i64, PersistenceError> {
    debug!("Creating login session for account: {}", account_id);

    let now: String = now_utc_string()?;

    diesel::insert_into(login_sessions::table)
        .values((
            login_sessions::session_token.eq(session_token),
            login_sessions::account_id.eq(account_id),
            login_sessions::created_at.eq(&now),
            login_sessions::last_activity_at.eq(&now),
            login_sessions::expires_at.eq(expires_at),
        ))
        .execute(conn)?;

    last_insert_rowid(conn)
}

/// Updates the last activity timestamp for a login session.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_login_session_activity(
    conn: &mut SqliteConnection,
    login_session_id: i64,
) -> Result<(), PersistenceError> {
    let now: String = now_utc_string()?;
    diesel::update(
        login_sessions::table.filter(login_sessions::login_session_id.eq(login_session_id)),
    )
    .set(login_sessions::last_activity_at.eq(&now))
    .execute(conn)?;
    Ok(())
}

/// Deletes a login session by token.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_login_session(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<(), PersistenceError> {
    diesel::delete(login_sessions::table.filter(login_sessions::session_token.eq(session_token)))
        .execute(conn)?;
    Ok(())
}

/// Deletes all login sessions for an account.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_login_sessions_for_account(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<usize, PersistenceError> {
    Ok(
        diesel::delete(login_sessions::table.filter(login_sessions::account_id.eq(account_id)))
            .execute(conn)?,
    )
}

/// Deletes all expired login sessions.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_expired_login_sessions(
    conn: &mut SqliteConnection,
) -> Result<usize, PersistenceError> {
    let now: String = now_utc_string()?;
    Ok(
        diesel::delete(login_sessions::table.filter(login_sessions::expires_at.lt(&now)))
            .execute(conn)?,
    )
}
