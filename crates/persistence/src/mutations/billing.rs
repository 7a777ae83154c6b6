// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Invoice and timesheet mutations.
//!
//! Invoice references are `DV-<year>-<seq>` with a per-year sequence. The
//! sequence is allocated and the header and lines inserted in a single
//! transaction, so concurrent creation cannot produce duplicate or gapped
//! references within a connection.

use defivelo_domain::{InvoiceLine, TimesheetEntry};
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::data_models::{format_day, now_utc_string};
use crate::diesel_schema::{invoice_lines, invoices, timesheets};
use crate::error::PersistenceError;
use crate::sqlite::last_insert_rowid;

/// Creates an invoice for one organization in one season.
///
/// Allocates the next `DV-<year>-<seq>` reference and inserts the header
/// and all lines atomically.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `season_id` - The season being settled
/// * `organization_id` - The billed organization
/// * `ref_year` - The year component of the reference
/// * `lines` - The computed invoice lines
///
/// # Returns
///
/// The invoice ID and the allocated reference.
///
/// # Errors
///
/// Returns an error if the organization already has an invoice for the
/// season or the insert fails.
pub fn create_invoice(
    conn: &mut SqliteConnection,
    season_id: i64,
    organization_id: i64,
    ref_year: u16,
    lines: &[InvoiceLine],
) -> Result<(i64, String), PersistenceError> {
    info!(
        "Creating invoice for organization {} in season {}",
        organization_id, season_id
    );

    conn.transaction(|conn| {
        let last_seq: Option<i32> = invoices::table
            .filter(invoices::ref_year.eq(i32::from(ref_year)))
            .select(max(invoices::ref_seq))
            .first(conn)?;
        let seq: i32 = last_seq.unwrap_or(0) + 1;
        let reference: String = format!("DV-{ref_year}-{seq}");
        let created_at: String = now_utc_string()?;

        diesel::insert_into(invoices::table)
            .values((
                invoices::reference.eq(&reference),
                invoices::ref_year.eq(i32::from(ref_year)),
                invoices::ref_seq.eq(seq),
                invoices::season_id.eq(season_id),
                invoices::organization_id.eq(organization_id),
                invoices::status.eq("Draft"),
                invoices::created_at.eq(&created_at),
            ))
            .execute(conn)?;
        let invoice_id: i64 = last_insert_rowid(conn)?;

        insert_lines(conn, invoice_id, lines)?;

        Ok((invoice_id, reference))
    })
}

/// Replaces the lines of a draft invoice with freshly computed ones.
///
/// The caller must have checked that the invoice is still a draft.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn replace_invoice_lines(
    conn: &mut SqliteConnection,
    invoice_id: i64,
    lines: &[InvoiceLine],
) -> Result<(), PersistenceError> {
    info!("Refreshing lines of invoice {}", invoice_id);

    conn.transaction(|conn| {
        diesel::delete(invoice_lines::table.filter(invoice_lines::invoice_id.eq(invoice_id)))
            .execute(conn)?;
        insert_lines(conn, invoice_id, lines)
    })
}

fn insert_lines(
    conn: &mut SqliteConnection,
    invoice_id: i64,
    lines: &[InvoiceLine],
) -> Result<(), PersistenceError> {
    for line in lines {
        diesel::insert_into(invoice_lines::table)
            .values((
                invoice_lines::invoice_id.eq(invoice_id),
                invoice_lines::session_id.eq(line.session_id),
                invoice_lines::day.eq(format_day(line.day)?),
                invoice_lines::n_participants.eq(i32::from(line.n_participants)),
                invoice_lines::n_bikes.eq(i32::from(line.n_bikes)),
                invoice_lines::cost_participants_cents.eq(line.cost_participants_cents),
                invoice_lines::cost_bikes_cents.eq(line.cost_bikes_cents),
                invoice_lines::bike_reduction_percent.eq(line.bike_reduction_percent),
                invoice_lines::cost_bikes_reduced_cents.eq(line.cost_bikes_reduced_cents),
            ))
            .execute(conn)?;
    }
    Ok(())
}

/// Updates an invoice's status.
///
/// The transition must already have been validated against the domain
/// status rules.
///
/// # Errors
///
/// Returns an error if the invoice doesn't exist or the update fails.
pub fn update_invoice_status(
    conn: &mut SqliteConnection,
    invoice_id: i64,
    status: &str,
) -> Result<(), PersistenceError> {
    info!("Transitioning invoice {} to {}", invoice_id, status);

    let updated = diesel::update(invoices::table.filter(invoices::invoice_id.eq(invoice_id)))
        .set(invoices::status.eq(status))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Invoice {invoice_id}")));
    }
    Ok(())
}

/// Stores a computed timesheet entry, upserting on `(profile, day)`.
///
/// Validated entries are never overwritten; the caller must check the
/// validation flag first.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn upsert_timesheet(
    conn: &mut SqliteConnection,
    entry: &TimesheetEntry,
) -> Result<i64, PersistenceError> {
    let day: String = format_day(entry.day)?;

    let existing: Option<i64> = timesheets::table
        .filter(timesheets::profile_id.eq(entry.profile_id))
        .filter(timesheets::day.eq(&day))
        .select(timesheets::timesheet_id)
        .first(conn)
        .optional()?;

    if let Some(timesheet_id) = existing {
        diesel::update(timesheets::table.filter(timesheets::timesheet_id.eq(timesheet_id)))
            .set((
                timesheets::n_leader.eq(i32::from(entry.counts.n_leader)),
                timesheets::n_helper.eq(i32::from(entry.counts.n_helper)),
                timesheets::n_actor.eq(i32::from(entry.counts.n_actor)),
                timesheets::amount_cents.eq(entry.amount_cents),
            ))
            .execute(conn)?;
        Ok(timesheet_id)
    } else {
        diesel::insert_into(timesheets::table)
            .values((
                timesheets::profile_id.eq(entry.profile_id),
                timesheets::day.eq(&day),
                timesheets::n_leader.eq(i32::from(entry.counts.n_leader)),
                timesheets::n_helper.eq(i32::from(entry.counts.n_helper)),
                timesheets::n_actor.eq(i32::from(entry.counts.n_actor)),
                timesheets::amount_cents.eq(entry.amount_cents),
                timesheets::validated.eq(0),
            ))
            .execute(conn)?;
        last_insert_rowid(conn)
    }
}

/// Marks a timesheet entry as validated.
///
/// # Errors
///
/// Returns an error if the entry doesn't exist or the update fails.
pub fn set_timesheet_validated(
    conn: &mut SqliteConnection,
    timesheet_id: i64,
) -> Result<(), PersistenceError> {
    info!("Validating timesheet {}", timesheet_id);

    let updated = diesel::update(timesheets::table.filter(timesheets::timesheet_id.eq(timesheet_id)))
        .set(timesheets::validated.eq(1))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Timesheet {timesheet_id}"
        )));
    }
    Ok(())
}
