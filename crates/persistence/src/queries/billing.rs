// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Invoice and timesheet queries.

use defivelo_domain::{DayRoleCounts, InvoiceLine, SessionBilling, TimesheetEntry};
use diesel::prelude::*;
use diesel::SqliteConnection;
use time::Date;
use tracing::debug;

use crate::data_models::{InvoiceData, format_day, parse_day};
use crate::diesel_schema::{invoice_lines, invoices, qualifications, sessions, timesheets};
use crate::error::PersistenceError;

/// Diesel Queryable struct for invoice header rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = invoices)]
struct InvoiceRow {
    invoice_id: i64,
    reference: String,
    season_id: i64,
    organization_id: i64,
    status: String,
    created_at: String,
}

impl From<InvoiceRow> for InvoiceData {
    fn from(row: InvoiceRow) -> Self {
        Self {
            invoice_id: row.invoice_id,
            reference: row.reference,
            season_id: row.season_id,
            organization_id: row.organization_id,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// Diesel Queryable struct for invoice line rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = invoice_lines)]
struct InvoiceLineRow {
    session_id: i64,
    day: String,
    n_participants: i32,
    n_bikes: i32,
    cost_participants_cents: i64,
    cost_bikes_cents: i64,
    bike_reduction_percent: i64,
    cost_bikes_reduced_cents: i64,
}

impl TryFrom<InvoiceLineRow> for InvoiceLine {
    type Error = PersistenceError;

    fn try_from(row: InvoiceLineRow) -> Result<Self, Self::Error> {
        let narrow = |value: i32, what: &str| {
            u16::try_from(value)
                .map_err(|_| PersistenceError::CorruptRecord(format!("{what} out of range: {value}")))
        };
        Ok(Self {
            session_id: row.session_id,
            day: parse_day(&row.day)?,
            n_participants: narrow(row.n_participants, "n_participants")?,
            n_bikes: narrow(row.n_bikes, "n_bikes")?,
            cost_participants_cents: row.cost_participants_cents,
            cost_bikes_cents: row.cost_bikes_cents,
            bike_reduction_percent: row.bike_reduction_percent,
            cost_bikes_reduced_cents: row.cost_bikes_reduced_cents,
        })
    }
}

/// Diesel Queryable struct for timesheet rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = timesheets)]
struct TimesheetRow {
    timesheet_id: i64,
    profile_id: i64,
    day: String,
    n_leader: i32,
    n_helper: i32,
    n_actor: i32,
    amount_cents: i64,
    validated: i32,
}

impl TryFrom<TimesheetRow> for TimesheetEntry {
    type Error = PersistenceError;

    fn try_from(row: TimesheetRow) -> Result<Self, Self::Error> {
        let narrow = |value: i32, what: &str| {
            u16::try_from(value)
                .map_err(|_| PersistenceError::CorruptRecord(format!("{what} out of range: {value}")))
        };
        Ok(Self {
            timesheet_id: Some(row.timesheet_id),
            profile_id: row.profile_id,
            day: parse_day(&row.day)?,
            counts: DayRoleCounts {
                n_leader: narrow(row.n_leader, "n_leader")?,
                n_helper: narrow(row.n_helper, "n_helper")?,
                n_actor: narrow(row.n_actor, "n_actor")?,
            },
            amount_cents: row.amount_cents,
            validated: row.validated != 0,
        })
    }
}

/// Retrieves an invoice header by ID.
///
/// # Errors
///
/// Returns an error if the invoice does not exist or the query fails.
pub fn get_invoice(
    conn: &mut SqliteConnection,
    invoice_id: i64,
) -> Result<InvoiceData, PersistenceError> {
    debug!("Looking up invoice by ID: {}", invoice_id);

    let row: InvoiceRow = invoices::table
        .filter(invoices::invoice_id.eq(invoice_id))
        .select(InvoiceRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Invoice {invoice_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    Ok(row.into())
}

/// Retrieves the invoice for one organization in one season, if any.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_invoice_for_organization(
    conn: &mut SqliteConnection,
    season_id: i64,
    organization_id: i64,
) -> Result<Option<InvoiceData>, PersistenceError> {
    let result: Result<InvoiceRow, diesel::result::Error> = invoices::table
        .filter(invoices::season_id.eq(season_id))
        .filter(invoices::organization_id.eq(organization_id))
        .select(InvoiceRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(row.into())),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Lists all invoices of a season ordered by reference sequence.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_invoices_for_season(
    conn: &mut SqliteConnection,
    season_id: i64,
) -> Result<Vec<InvoiceData>, PersistenceError> {
    let rows: Vec<InvoiceRow> = invoices::table
        .filter(invoices::season_id.eq(season_id))
        .order(invoices::ref_seq.asc())
        .select(InvoiceRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Lists the lines of an invoice ordered by day, then session.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_invoice_lines(
    conn: &mut SqliteConnection,
    invoice_id: i64,
) -> Result<Vec<InvoiceLine>, PersistenceError> {
    let rows: Vec<InvoiceLineRow> = invoice_lines::table
        .filter(invoice_lines::invoice_id.eq(invoice_id))
        .order((invoice_lines::day.asc(), invoice_lines::session_id.asc()))
        .select(InvoiceLineRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Collects per-session billing inputs for one organization in a date range.
///
/// Participant and bike counts are summed over each session's
/// qualifications. Sessions without qualifications bill zero.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_session_billing(
    conn: &mut SqliteConnection,
    organization_id: i64,
    range_begin: Date,
    range_end: Date,
) -> Result<Vec<SessionBilling>, PersistenceError> {
    let begin: String = format_day(range_begin)?;
    let end: String = format_day(range_end)?;

    let session_rows: Vec<(i64, String)> = sessions::table
        .filter(sessions::organization_id.eq(organization_id))
        .filter(sessions::day.ge(&begin))
        .filter(sessions::day.le(&end))
        .order((sessions::day.asc(), sessions::session_id.asc()))
        .select((sessions::session_id, sessions::day))
        .load(conn)?;

    let mut billings: Vec<SessionBilling> = Vec::with_capacity(session_rows.len());
    for (session_id, day) in session_rows {
        let counts: Vec<(i32, i32)> = qualifications::table
            .filter(qualifications::session_id.eq(session_id))
            .select((qualifications::n_participants, qualifications::n_bikes))
            .load(conn)?;

        let mut n_participants: u16 = 0;
        let mut n_bikes: u16 = 0;
        for (participants, bikes) in counts {
            n_participants = n_participants.saturating_add(
                u16::try_from(participants).map_err(|_| {
                    PersistenceError::CorruptRecord(format!(
                        "n_participants out of range: {participants}"
                    ))
                })?,
            );
            n_bikes = n_bikes.saturating_add(u16::try_from(bikes).map_err(|_| {
                PersistenceError::CorruptRecord(format!("n_bikes out of range: {bikes}"))
            })?);
        }

        billings.push(SessionBilling {
            session_id,
            day: parse_day(&day)?,
            n_participants,
            n_bikes,
        });
    }

    Ok(billings)
}

/// Retrieves one volunteer's timesheet entry for one day, if any.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_timesheet(
    conn: &mut SqliteConnection,
    profile_id: i64,
    day: Date,
) -> Result<Option<TimesheetEntry>, PersistenceError> {
    let day_str: String = format_day(day)?;

    let result: Result<TimesheetRow, diesel::result::Error> = timesheets::table
        .filter(timesheets::profile_id.eq(profile_id))
        .filter(timesheets::day.eq(&day_str))
        .select(TimesheetRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(row.try_into()?)),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Lists all timesheet entries in a date range, ordered by profile and day.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_timesheets_in_range(
    conn: &mut SqliteConnection,
    range_begin: Date,
    range_end: Date,
) -> Result<Vec<TimesheetEntry>, PersistenceError> {
    let begin: String = format_day(range_begin)?;
    let end: String = format_day(range_end)?;

    let rows: Vec<TimesheetRow> = timesheets::table
        .filter(timesheets::day.ge(&begin))
        .filter(timesheets::day.le(&end))
        .order((timesheets::profile_id.asc(), timesheets::day.asc()))
        .select(TimesheetRow::as_select())
        .load(conn)?;

    rows.into_iter().map(TryInto::try_into).collect()
}
