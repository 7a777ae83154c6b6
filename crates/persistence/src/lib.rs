// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Défi Vélo intranet.
//!
//! This crate stores the canonical application data (accounts, the
//! directory, seasons and their sessions, availabilities, invoices, and
//! timesheets) in `SQLite` via Diesel.
//!
//! `SQLite` is the only backend. File-based databases are used in
//! production; unique shared in-memory databases back the test suite.
//! Consistency across multi-row writes is delegated to database
//! transactions, and foreign key enforcement is verified at startup.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use defivelo_domain::{
    Availability, Canton, ChosenRole, InvoiceLine, Organization, Qualification, Season, Session,
    SessionAvailability, SessionBilling, StaffAssignment, TimesheetEntry, VolunteerProfile,
};
use diesel::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::Date;

mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
mod sqlite;

#[cfg(test)]
mod tests;

pub use data_models::{AccountData, InvoiceData, LoginSessionData, now_utc_string, parse_timestamp};
pub use error::PersistenceError;

/// Counter handing out distinct names for shared-cache in-memory databases,
/// so concurrently running tests never see each other's data.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call gets its own database instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("memdb_test_{db_id}");
        let shared_memory_url = format!("file:{db_name}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = sqlite::open_database(&shared_memory_url)?;
        sqlite::check_foreign_keys(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = sqlite::open_database(path_str)?;
        sqlite::enable_wal(&mut conn)?;
        sqlite::check_foreign_keys(&mut conn)?;

        Ok(Self { conn })
    }

    // ========================================================================
    // Accounts & Login Sessions
    // ========================================================================

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be created.
    pub fn create_account(
        &mut self,
        login_email: &str,
        display_name: &str,
        password: &str,
        role: &str,
        managed_cantons: &str,
        profile_id: Option<i64>,
    ) -> Result<i64, PersistenceError> {
        mutations::accounts::create_account(
            &mut self.conn,
            login_email,
            display_name,
            password,
            role,
            managed_cantons,
            profile_id,
        )
    }

    /// Retrieves an account by login email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_account_by_login(
        &mut self,
        login_email: &str,
    ) -> Result<Option<AccountData>, PersistenceError> {
        queries::accounts::get_account_by_login(&mut self.conn, login_email)
    }

    /// Retrieves an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_account_by_id(
        &mut self,
        account_id: i64,
    ) -> Result<Option<AccountData>, PersistenceError> {
        queries::accounts::get_account_by_id(&mut self.conn, account_id)
    }

    /// Lists all accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_accounts(&mut self) -> Result<Vec<AccountData>, PersistenceError> {
        queries::accounts::list_accounts(&mut self.conn)
    }

    /// Counts the number of active power user accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_active_power_users(&mut self) -> Result<i64, PersistenceError> {
        queries::accounts::count_active_power_users(&mut self.conn)
    }

    /// Updates an account's mutable fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the account doesn't exist.
    pub fn update_account(
        &mut self,
        account_id: i64,
        display_name: &str,
        role: &str,
        managed_cantons: &str,
        profile_id: Option<i64>,
    ) -> Result<(), PersistenceError> {
        mutations::accounts::update_account(
            &mut self.conn,
            account_id,
            display_name,
            role,
            managed_cantons,
            profile_id,
        )
    }

    /// Updates an account's password.
    ///
    /// # Errors
    ///
    /// Returns an error if the account doesn't exist or the update fails.
    pub fn update_password(
        &mut self,
        account_id: i64,
        new_password: &str,
    ) -> Result<(), PersistenceError> {
        mutations::accounts::update_password(&mut self.conn, account_id, new_password)
    }

    /// Disables an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account doesn't exist or the update fails.
    pub fn disable_account(&mut self, account_id: i64) -> Result<(), PersistenceError> {
        mutations::accounts::disable_account(&mut self.conn, account_id)
    }

    /// Re-enables a disabled account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account doesn't exist or the update fails.
    pub fn enable_account(&mut self, account_id: i64) -> Result<(), PersistenceError> {
        mutations::accounts::enable_account(&mut self.conn, account_id)
    }

    /// Deletes an account that has never logged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the account doesn't exist or has been used.
    pub fn delete_account(&mut self, account_id: i64) -> Result<(), PersistenceError> {
        mutations::accounts::delete_account(&mut self.conn, account_id)
    }

    /// Updates the last login timestamp for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn update_last_login(&mut self, account_id: i64) -> Result<(), PersistenceError> {
        mutations::accounts::update_last_login(&mut self.conn, account_id)
    }

    /// Verifies a password against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns an error if password verification fails.
    pub fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, PersistenceError> {
        queries::accounts::verify_password(password, password_hash)
    }

    /// Creates a new login session for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be created.
    pub fn create_login_session(
        &mut self,
        session_token: &str,
        account_id: i64,
        expires_at: &str,
    ) -> Result<i64, PersistenceError> {
        mutations::accounts::create_login_session(
            &mut self.conn,
            session_token,
            account_id,
            expires_at,
        )
    }

    /// Retrieves a login session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_login_session_by_token(
        &mut self,
        session_token: &str,
    ) -> Result<Option<LoginSessionData>, PersistenceError> {
        queries::accounts::get_login_session_by_token(&mut self.conn, session_token)
    }

    /// Updates the last activity timestamp for a login session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn update_login_session_activity(
        &mut self,
        login_session_id: i64,
    ) -> Result<(), PersistenceError> {
        mutations::accounts::update_login_session_activity(&mut self.conn, login_session_id)
    }

    /// Deletes a login session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_login_session(&mut self, session_token: &str) -> Result<(), PersistenceError> {
        mutations::accounts::delete_login_session(&mut self.conn, session_token)
    }

    /// Deletes all login sessions for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_login_sessions_for_account(
        &mut self,
        account_id: i64,
    ) -> Result<usize, PersistenceError> {
        mutations::accounts::delete_login_sessions_for_account(&mut self.conn, account_id)
    }

    /// Deletes all expired login sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_expired_login_sessions(&mut self) -> Result<usize, PersistenceError> {
        mutations::accounts::delete_expired_login_sessions(&mut self.conn)
    }

    // ========================================================================
    // Directory: Organizations & Profiles
    // ========================================================================

    /// Creates a new organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_organization(
        &mut self,
        organization: &Organization,
    ) -> Result<i64, PersistenceError> {
        mutations::directory::create_organization(&mut self.conn, organization)
    }

    /// Retrieves an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the organization does not exist.
    pub fn get_organization(
        &mut self,
        organization_id: i64,
    ) -> Result<Organization, PersistenceError> {
        queries::directory::get_organization(&mut self.conn, organization_id)
    }

    /// Lists all organizations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_organizations(&mut self) -> Result<Vec<Organization>, PersistenceError> {
        queries::directory::list_organizations(&mut self.conn)
    }

    /// Lists all organizations affiliated with one of the given cantons.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_organizations_in_cantons(
        &mut self,
        cantons: &[Canton],
    ) -> Result<Vec<Organization>, PersistenceError> {
        queries::directory::list_organizations_in_cantons(&mut self.conn, cantons)
    }

    /// Updates an existing organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the organization doesn't exist.
    pub fn update_organization(
        &mut self,
        organization_id: i64,
        organization: &Organization,
    ) -> Result<(), PersistenceError> {
        mutations::directory::update_organization(&mut self.conn, organization_id, organization)
    }

    /// Deletes an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the organization doesn't exist or is referenced.
    pub fn delete_organization(&mut self, organization_id: i64) -> Result<(), PersistenceError> {
        mutations::directory::delete_organization(&mut self.conn, organization_id)
    }

    /// Creates a new volunteer profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_profile(
        &mut self,
        profile: &VolunteerProfile,
        calendar_token: &str,
    ) -> Result<i64, PersistenceError> {
        mutations::directory::create_profile(&mut self.conn, profile, calendar_token)
    }

    /// Retrieves a volunteer profile by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile does not exist.
    pub fn get_profile(&mut self, profile_id: i64) -> Result<VolunteerProfile, PersistenceError> {
        queries::directory::get_profile(&mut self.conn, profile_id)
    }

    /// Retrieves a volunteer profile by its calendar feed token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_profile_by_calendar_token(
        &mut self,
        token: &str,
    ) -> Result<Option<VolunteerProfile>, PersistenceError> {
        queries::directory::get_profile_by_calendar_token(&mut self.conn, token)
    }

    /// Retrieves the calendar feed token for a profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile does not exist.
    pub fn get_calendar_token(&mut self, profile_id: i64) -> Result<String, PersistenceError> {
        queries::directory::get_calendar_token(&mut self.conn, profile_id)
    }

    /// Lists all volunteer profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_profiles(&mut self) -> Result<Vec<VolunteerProfile>, PersistenceError> {
        queries::directory::list_profiles(&mut self.conn)
    }

    /// Lists the volunteer profiles with the given IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_profiles_by_ids(
        &mut self,
        ids: &[i64],
    ) -> Result<Vec<VolunteerProfile>, PersistenceError> {
        queries::directory::list_profiles_by_ids(&mut self.conn, ids)
    }

    /// Lists all volunteer profiles affiliated with one of the given cantons.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_profiles_in_cantons(
        &mut self,
        cantons: &[Canton],
    ) -> Result<Vec<VolunteerProfile>, PersistenceError> {
        queries::directory::list_profiles_in_cantons(&mut self.conn, cantons)
    }

    /// Updates an existing volunteer profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile doesn't exist.
    pub fn update_profile(
        &mut self,
        profile_id: i64,
        profile: &VolunteerProfile,
    ) -> Result<(), PersistenceError> {
        mutations::directory::update_profile(&mut self.conn, profile_id, profile)
    }

    /// Deletes a volunteer profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile doesn't exist or is referenced.
    pub fn delete_profile(&mut self, profile_id: i64) -> Result<(), PersistenceError> {
        mutations::directory::delete_profile(&mut self.conn, profile_id)
    }

    // ========================================================================
    // Seasons, Sessions & Qualifications
    // ========================================================================

    /// Creates a new season.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_season(&mut self, season: &Season) -> Result<i64, PersistenceError> {
        mutations::seasons::create_season(&mut self.conn, season)
    }

    /// Retrieves a season by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the season does not exist.
    pub fn get_season(&mut self, season_id: i64) -> Result<Season, PersistenceError> {
        queries::seasons::get_season(&mut self.conn, season_id)
    }

    /// Lists all seasons, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_seasons(&mut self) -> Result<Vec<Season>, PersistenceError> {
        queries::seasons::list_seasons(&mut self.conn)
    }

    /// Updates a season's span, cantons, and prices.
    ///
    /// # Errors
    ///
    /// Returns an error if the season doesn't exist.
    pub fn update_season(
        &mut self,
        season_id: i64,
        season: &Season,
    ) -> Result<(), PersistenceError> {
        mutations::seasons::update_season(&mut self.conn, season_id, season)
    }

    /// Updates a season's lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns an error if the season doesn't exist.
    pub fn update_season_state(
        &mut self,
        season_id: i64,
        state: &str,
    ) -> Result<(), PersistenceError> {
        mutations::seasons::update_season_state(&mut self.conn, season_id, state)
    }

    /// Creates a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails or the slot is already taken.
    pub fn create_session(&mut self, session: &Session) -> Result<i64, PersistenceError> {
        mutations::seasons::create_session(&mut self.conn, session)
    }

    /// Retrieves a session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the session does not exist.
    pub fn get_session(&mut self, session_id: i64) -> Result<Session, PersistenceError> {
        queries::seasons::get_session(&mut self.conn, session_id)
    }

    /// Lists the sessions of a season.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_sessions_in_season(
        &mut self,
        season: &Season,
    ) -> Result<Vec<Session>, PersistenceError> {
        queries::seasons::list_sessions_in_season(&mut self.conn, season)
    }

    /// Lists one organization's sessions within a date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_sessions_for_organization(
        &mut self,
        organization_id: i64,
        range_begin: Date,
        range_end: Date,
    ) -> Result<Vec<Session>, PersistenceError> {
        queries::seasons::list_sessions_for_organization(
            &mut self.conn,
            organization_id,
            range_begin,
            range_end,
        )
    }

    /// Updates an existing session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session doesn't exist.
    pub fn update_session(
        &mut self,
        session_id: i64,
        session: &Session,
    ) -> Result<(), PersistenceError> {
        mutations::seasons::update_session(&mut self.conn, session_id, session)
    }

    /// Deletes a session together with its qualifications and availabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the session doesn't exist.
    pub fn delete_session(&mut self, session_id: i64) -> Result<(), PersistenceError> {
        mutations::seasons::delete_session(&mut self.conn, session_id)
    }

    /// Creates a new qualification.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_qualification(
        &mut self,
        qualification: &Qualification,
    ) -> Result<i64, PersistenceError> {
        mutations::seasons::create_qualification(&mut self.conn, qualification)
    }

    /// Retrieves a qualification by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the qualification does not exist.
    pub fn get_qualification(
        &mut self,
        qualification_id: i64,
    ) -> Result<Qualification, PersistenceError> {
        queries::seasons::get_qualification(&mut self.conn, qualification_id)
    }

    /// Lists the qualifications of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_qualifications_for_session(
        &mut self,
        session_id: i64,
    ) -> Result<Vec<Qualification>, PersistenceError> {
        queries::seasons::list_qualifications_for_session(&mut self.conn, session_id)
    }

    /// Updates a qualification's class data.
    ///
    /// # Errors
    ///
    /// Returns an error if the qualification doesn't exist.
    pub fn update_qualification(
        &mut self,
        qualification_id: i64,
        qualification: &Qualification,
    ) -> Result<(), PersistenceError> {
        mutations::seasons::update_qualification(&mut self.conn, qualification_id, qualification)
    }

    /// Replaces a qualification's staff assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the qualification doesn't exist.
    pub fn update_qualification_staff(
        &mut self,
        qualification_id: i64,
        staff: &StaffAssignment,
    ) -> Result<(), PersistenceError> {
        mutations::seasons::update_qualification_staff(&mut self.conn, qualification_id, staff)
    }

    /// Deletes a qualification.
    ///
    /// # Errors
    ///
    /// Returns an error if the qualification doesn't exist.
    pub fn delete_qualification(&mut self, qualification_id: i64) -> Result<(), PersistenceError> {
        mutations::seasons::delete_qualification(&mut self.conn, qualification_id)
    }

    // ========================================================================
    // Availabilities
    // ========================================================================

    /// Records or updates a volunteer's declared availability for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_availability(
        &mut self,
        profile_id: i64,
        session_id: i64,
        availability: Availability,
    ) -> Result<i64, PersistenceError> {
        mutations::availability::set_availability(
            &mut self.conn,
            profile_id,
            session_id,
            availability,
        )
    }

    /// Sets the role a volunteer was chosen for on a session.
    ///
    /// # Errors
    ///
    /// Returns an error if no availability record exists for the pair.
    pub fn set_chosen_role(
        &mut self,
        profile_id: i64,
        session_id: i64,
        role: ChosenRole,
    ) -> Result<(), PersistenceError> {
        mutations::availability::set_chosen_role(&mut self.conn, profile_id, session_id, role)
    }

    /// Retrieves one volunteer's availability record for one session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_availability(
        &mut self,
        profile_id: i64,
        session_id: i64,
    ) -> Result<Option<SessionAvailability>, PersistenceError> {
        queries::availability::get_availability(&mut self.conn, profile_id, session_id)
    }

    /// Lists all availability records for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_availabilities_for_session(
        &mut self,
        session_id: i64,
    ) -> Result<Vec<SessionAvailability>, PersistenceError> {
        queries::availability::list_availabilities_for_session(&mut self.conn, session_id)
    }

    /// Lists all availability records for the given sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_availabilities_for_sessions(
        &mut self,
        session_ids: &[i64],
    ) -> Result<Vec<SessionAvailability>, PersistenceError> {
        queries::availability::list_availabilities_for_sessions(&mut self.conn, session_ids)
    }

    /// Lists the sessions a volunteer was chosen to work, with the role.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_chosen_sessions_for_profile(
        &mut self,
        profile_id: i64,
    ) -> Result<Vec<(Session, ChosenRole)>, PersistenceError> {
        queries::availability::list_chosen_sessions_for_profile(&mut self.conn, profile_id)
    }

    /// Lists every chosen assignment in a date range as
    /// `(profile_id, day, role)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_chosen_roles_in_range(
        &mut self,
        range_begin: Date,
        range_end: Date,
    ) -> Result<Vec<(i64, Date, ChosenRole)>, PersistenceError> {
        queries::availability::list_chosen_roles_in_range(&mut self.conn, range_begin, range_end)
    }

    // ========================================================================
    // Invoices & Timesheets
    // ========================================================================

    /// Creates an invoice with an allocated `DV-<year>-<seq>` reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the organization already has an invoice for the
    /// season or the insert fails.
    pub fn create_invoice(
        &mut self,
        season_id: i64,
        organization_id: i64,
        ref_year: u16,
        lines: &[InvoiceLine],
    ) -> Result<(i64, String), PersistenceError> {
        mutations::billing::create_invoice(
            &mut self.conn,
            season_id,
            organization_id,
            ref_year,
            lines,
        )
    }

    /// Retrieves an invoice header by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice does not exist.
    pub fn get_invoice(&mut self, invoice_id: i64) -> Result<InvoiceData, PersistenceError> {
        queries::billing::get_invoice(&mut self.conn, invoice_id)
    }

    /// Retrieves the invoice for one organization in one season, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_invoice_for_organization(
        &mut self,
        season_id: i64,
        organization_id: i64,
    ) -> Result<Option<InvoiceData>, PersistenceError> {
        queries::billing::get_invoice_for_organization(&mut self.conn, season_id, organization_id)
    }

    /// Lists all invoices of a season.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_invoices_for_season(
        &mut self,
        season_id: i64,
    ) -> Result<Vec<InvoiceData>, PersistenceError> {
        queries::billing::list_invoices_for_season(&mut self.conn, season_id)
    }

    /// Lists the lines of an invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_invoice_lines(
        &mut self,
        invoice_id: i64,
    ) -> Result<Vec<InvoiceLine>, PersistenceError> {
        queries::billing::list_invoice_lines(&mut self.conn, invoice_id)
    }

    /// Replaces the lines of a draft invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn replace_invoice_lines(
        &mut self,
        invoice_id: i64,
        lines: &[InvoiceLine],
    ) -> Result<(), PersistenceError> {
        mutations::billing::replace_invoice_lines(&mut self.conn, invoice_id, lines)
    }

    /// Updates an invoice's status.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice doesn't exist.
    pub fn update_invoice_status(
        &mut self,
        invoice_id: i64,
        status: &str,
    ) -> Result<(), PersistenceError> {
        mutations::billing::update_invoice_status(&mut self.conn, invoice_id, status)
    }

    /// Collects per-session billing inputs for one organization in a range.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_session_billing(
        &mut self,
        organization_id: i64,
        range_begin: Date,
        range_end: Date,
    ) -> Result<Vec<SessionBilling>, PersistenceError> {
        queries::billing::list_session_billing(
            &mut self.conn,
            organization_id,
            range_begin,
            range_end,
        )
    }

    /// Stores a computed timesheet entry, upserting on `(profile, day)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn upsert_timesheet(&mut self, entry: &TimesheetEntry) -> Result<i64, PersistenceError> {
        mutations::billing::upsert_timesheet(&mut self.conn, entry)
    }

    /// Retrieves one volunteer's timesheet entry for one day, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_timesheet(
        &mut self,
        profile_id: i64,
        day: Date,
    ) -> Result<Option<TimesheetEntry>, PersistenceError> {
        queries::billing::get_timesheet(&mut self.conn, profile_id, day)
    }

    /// Lists all timesheet entries in a date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_timesheets_in_range(
        &mut self,
        range_begin: Date,
        range_end: Date,
    ) -> Result<Vec<TimesheetEntry>, PersistenceError> {
        queries::billing::list_timesheets_in_range(&mut self.conn, range_begin, range_end)
    }

    /// Marks a timesheet entry as validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry doesn't exist.
    pub fn set_timesheet_validated(&mut self, timesheet_id: i64) -> Result<(), PersistenceError> {
        mutations::billing::set_timesheet_validated(&mut self.conn, timesheet_id)
    }
}
