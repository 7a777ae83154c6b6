// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! CSV exports: season sessions, salaries, and invoice lines.
//!
//! Exports render to an in-memory CSV string; the server layer attaches
//! the content type and filename.

use defivelo_domain::{InvoiceLine, Organization, Qualification, Season, Session, TimesheetEntry};
use defivelo_persistence::{InvoiceData, Persistence};
use time::Date;

use crate::auth::{AuthenticatedAccount, AuthorizationService};
use crate::error::{ApiError, translate_persistence_error};
use crate::handlers::{compute_timesheets_in_range, format_day, format_time, parse_day_field};

/// Formats centimes as a decimal franc amount, e.g. `220.50`.
fn format_chf(cents: i64) -> String {
    let francs: i64 = cents / 100;
    let rappen: i64 = (cents % 100).abs();
    format!("{francs}.{rappen:02}")
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String, ApiError> {
    let buffer: Vec<u8> = writer.into_inner().map_err(|e| ApiError::Internal {
        message: format!("Failed to flush CSV writer: {e}"),
    })?;
    String::from_utf8(buffer).map_err(|e| ApiError::Internal {
        message: format!("CSV output is not valid UTF-8: {e}"),
    })
}

fn write_record(
    writer: &mut csv::Writer<Vec<u8>>,
    record: &[String],
) -> Result<(), ApiError> {
    writer.write_record(record).map_err(|e| ApiError::Internal {
        message: format!("Failed to write CSV record: {e}"),
    })
}

/// Exports a season's sessions as CSV, one row per session with
/// qualification totals.
///
/// # Errors
///
/// Returns an error if unauthorized or a query fails.
pub fn export_sessions_csv(
    persistence: &mut Persistence,
    season_id: i64,
    account: &AuthenticatedAccount,
) -> Result<String, ApiError> {
    let season: Season = persistence
        .get_season(season_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "export_sessions_csv")?;
    AuthorizationService::require_all_cantons(account, &season.cantons, "export_sessions_csv")?;

    let sessions: Vec<Session> = persistence
        .list_sessions_in_season(&season)
        .map_err(translate_persistence_error)?;

    let mut writer: csv::Writer<Vec<u8>> = csv::Writer::from_writer(Vec::new());
    write_record(
        &mut writer,
        &[
            String::from("day"),
            String::from("begin_time"),
            String::from("end_time"),
            String::from("organization"),
            String::from("canton"),
            String::from("n_classes"),
            String::from("n_participants"),
            String::from("n_bikes"),
            String::from("n_helmets"),
            String::from("fallback_plan"),
        ],
    )?;

    for session in &sessions {
        let session_id: i64 = session.session_id.ok_or_else(|| ApiError::Internal {
            message: String::from("Session is missing its database ID"),
        })?;
        let organization: Organization = persistence
            .get_organization(session.organization_id)
            .map_err(translate_persistence_error)?;
        let qualifications: Vec<Qualification> = persistence
            .list_qualifications_for_session(session_id)
            .map_err(translate_persistence_error)?;
        let n_participants: u32 = qualifications
            .iter()
            .map(|q| u32::from(q.n_participants))
            .sum();
        let n_bikes: u32 = qualifications.iter().map(|q| u32::from(q.n_bikes)).sum();
        let n_helmets: u32 = qualifications.iter().map(|q| u32::from(q.n_helmets)).sum();

        write_record(
            &mut writer,
            &[
                format_day(session.day)?,
                format_time(session.begin_time)?,
                format_time(session.end_time)?,
                organization.name.clone(),
                organization.canton.code().to_string(),
                qualifications.len().to_string(),
                n_participants.to_string(),
                n_bikes.to_string(),
                n_helmets.to_string(),
                session.fallback_plan.clone().unwrap_or_default(),
            ],
        )?;
    }

    finish_csv(writer)
}

/// Exports salary entries over a date range as CSV, one row per volunteer
/// and day.
///
/// Coordinators see only volunteers in their managed cantons.
///
/// # Errors
///
/// Returns an error if unauthorized or the computation fails.
pub fn export_salary_csv(
    persistence: &mut Persistence,
    from: &str,
    to: &str,
    account: &AuthenticatedAccount,
) -> Result<String, ApiError> {
    AuthorizationService::require_staff(account, "export_salary_csv")?;
    let range_begin: Date = parse_day_field("from", from)?;
    let range_end: Date = parse_day_field("to", to)?;

    let entries: Vec<TimesheetEntry> =
        compute_timesheets_in_range(persistence, range_begin, range_end)?;

    let mut writer: csv::Writer<Vec<u8>> = csv::Writer::from_writer(Vec::new());
    write_record(
        &mut writer,
        &[
            String::from("last_name"),
            String::from("first_name"),
            String::from("canton"),
            String::from("day"),
            String::from("n_leader"),
            String::from("n_helper"),
            String::from("n_actor"),
            String::from("amount_chf"),
            String::from("validated"),
        ],
    )?;

    for entry in &entries {
        let profile: defivelo_domain::VolunteerProfile = persistence
            .get_profile(entry.profile_id)
            .map_err(translate_persistence_error)?;
        if !account.manages_canton(&profile.canton) {
            continue;
        }
        write_record(
            &mut writer,
            &[
                profile.last_name.clone(),
                profile.first_name.clone(),
                profile.canton.code().to_string(),
                format_day(entry.day)?,
                entry.counts.n_leader.to_string(),
                entry.counts.n_helper.to_string(),
                entry.counts.n_actor.to_string(),
                format_chf(entry.amount_cents),
                entry.validated.to_string(),
            ],
        )?;
    }

    finish_csv(writer)
}

/// Exports one invoice as CSV: a header row per line plus a total row.
///
/// # Errors
///
/// Returns an error if unauthorized or the invoice does not exist.
pub fn export_invoice_csv(
    persistence: &mut Persistence,
    invoice_id: i64,
    account: &AuthenticatedAccount,
) -> Result<String, ApiError> {
    let invoice: InvoiceData = persistence
        .get_invoice(invoice_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(invoice.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "export_invoice_csv")?;
    AuthorizationService::require_canton(account, &organization.canton, "export_invoice_csv")?;

    let lines: Vec<InvoiceLine> = persistence
        .list_invoice_lines(invoice_id)
        .map_err(translate_persistence_error)?;

    let mut writer: csv::Writer<Vec<u8>> = csv::Writer::from_writer(Vec::new());
    write_record(
        &mut writer,
        &[
            String::from("reference"),
            String::from("organization"),
            String::from("day"),
            String::from("n_participants"),
            String::from("n_bikes"),
            String::from("cost_participants_chf"),
            String::from("cost_bikes_chf"),
            String::from("bike_reduction_percent"),
            String::from("cost_bikes_reduced_chf"),
            String::from("total_chf"),
        ],
    )?;

    let mut total_cents: i64 = 0;
    for line in &lines {
        total_cents += line.total_cents();
        write_record(
            &mut writer,
            &[
                invoice.reference.clone(),
                organization.name.clone(),
                format_day(line.day)?,
                line.n_participants.to_string(),
                line.n_bikes.to_string(),
                format_chf(line.cost_participants_cents),
                format_chf(line.cost_bikes_cents),
                line.bike_reduction_percent.to_string(),
                format_chf(line.cost_bikes_reduced_cents),
                format_chf(line.total_cents()),
            ],
        )?;
    }
    write_record(
        &mut writer,
        &[
            invoice.reference.clone(),
            organization.name,
            String::from("TOTAL"),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            format_chf(total_cents),
        ],
    )?;

    finish_csv(writer)
}
