// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Invoice line computation.
//!
//! This module aggregates per-session participant and bike counts into
//! invoice lines, applying the consecutive-day bike cost reduction.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::Date;

/// The bike cost reduction table, keyed by consecutive-day run length.
///
/// A run of 1 day earns no reduction; runs of 5 or more days are capped at
/// the last entry.
pub const BIKE_REDUCTION_TABLE: [(u32, i64); 4] = [(2, 5), (3, 10), (4, 20), (5, 30)];

/// The status of an invoice.
///
/// Lines may only be regenerated while `Draft`; `Sent` and `Paid` invoices
/// are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InvoiceStatus {
    /// Being assembled. Lines are regenerated from sessions on demand.
    #[default]
    Draft,
    /// Sent to the organization. Immutable.
    Sent,
    /// Payment received. Immutable.
    Paid,
}

impl InvoiceStatus {
    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Sent => "Sent",
            Self::Paid => "Paid",
        }
    }

    /// Checks if a transition from this status to another is valid.
    ///
    /// Valid transitions are Draft → Sent and Sent → Paid.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Sent) | (Self::Sent, Self::Paid)
        )
    }

    /// Returns whether the invoice's lines may still be modified.
    #[must_use]
    pub const fn is_mutable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(Self::Draft),
            "Sent" => Ok(Self::Sent),
            "Paid" => Ok(Self::Paid),
            _ => Err(DomainError::InvalidInvoiceTransition {
                from: s.to_string(),
                to: String::new(),
            }),
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-session billing inputs for one organization.
///
/// Counts are the sums over the session's qualifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBilling {
    /// The session being billed.
    pub session_id: i64,
    /// The session day.
    pub day: Date,
    /// Total participants across the session's qualifications.
    pub n_participants: u16,
    /// Total rental bikes across the session's qualifications.
    pub n_bikes: u16,
}

/// One computed invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// The session this line bills.
    pub session_id: i64,
    /// The session day.
    pub day: Date,
    /// Total participants billed.
    pub n_participants: u16,
    /// Total bikes billed.
    pub n_bikes: u16,
    /// Participant cost in centimes, before any reduction.
    pub cost_participants_cents: i64,
    /// Bike cost in centimes, before reduction.
    pub cost_bikes_cents: i64,
    /// The applied reduction percentage (0, 5, 10, 20, or 30).
    pub bike_reduction_percent: i64,
    /// Bike cost in centimes after reduction, floored toward zero.
    pub cost_bikes_reduced_cents: i64,
}

impl InvoiceLine {
    /// Returns the line total in centimes.
    #[must_use]
    pub const fn total_cents(&self) -> i64 {
        self.cost_participants_cents + self.cost_bikes_reduced_cents
    }
}

/// Maps a consecutive-day run length to a bike cost reduction percentage.
///
/// Runs of 5 or more days are capped at the table's last entry (30%).
#[must_use]
pub fn bike_reduction_percent(run_length: u32) -> i64 {
    let mut percent: i64 = 0;
    for (days, pct) in BIKE_REDUCTION_TABLE {
        if run_length >= days {
            percent = pct;
        }
    }
    percent
}

/// Computes the length of the maximal run of consecutive calendar days
/// containing `day` within `days`.
///
/// `days` must be sorted ascending and free of duplicates; the caller is
/// expected to have collected the distinct session days of one organization
/// within one season. If `day` is not present the length is 0.
#[must_use]
pub fn consecutive_run_length(days: &[Date], day: Date) -> u32 {
    let Some(pos) = days.iter().position(|d| *d == day) else {
        return 0;
    };

    let mut length: u32 = 1;
    // Walk backward while each previous entry is exactly one day earlier.
    let mut cursor = pos;
    while cursor > 0 {
        if days[cursor - 1].next_day() == Some(days[cursor]) {
            length += 1;
            cursor -= 1;
        } else {
            break;
        }
    }
    // Walk forward while each next entry is exactly one day later.
    cursor = pos;
    while cursor + 1 < days.len() {
        if days[cursor].next_day() == Some(days[cursor + 1]) {
            length += 1;
            cursor += 1;
        } else {
            break;
        }
    }
    length
}

/// Computes invoice lines for one organization's sessions in a season.
///
/// For each session, the participant cost is `participants x participant
/// price` and the bike cost is `bikes x bike price` reduced by the
/// percentage earned by the maximal consecutive-day run containing the
/// session's day. Reduction math floors toward zero.
///
/// # Arguments
///
/// * `sessions` - The organization's sessions in the season, in any order
/// * `cost_per_participant_cents` - The season's participant price
/// * `cost_per_bike_cents` - The season's bike price
///
/// # Errors
///
/// Returns `DomainError::CostOverflow` if any cost multiplication
/// overflows `i64`.
pub fn compute_invoice_lines(
    sessions: &[SessionBilling],
    cost_per_participant_cents: i64,
    cost_per_bike_cents: i64,
) -> Result<Vec<InvoiceLine>, DomainError> {
    // Distinct sorted days drive the run computation. Two sessions on the
    // same day count as one day of the run.
    let mut days: Vec<Date> = sessions.iter().map(|s| s.day).collect();
    days.sort_unstable();
    days.dedup();

    let mut ordered: Vec<&SessionBilling> = sessions.iter().collect();
    ordered.sort_unstable_by_key(|s| (s.day, s.session_id));

    let mut lines: Vec<InvoiceLine> = Vec::with_capacity(ordered.len());
    for session in ordered {
        let cost_participants_cents: i64 = i64::from(session.n_participants)
            .checked_mul(cost_per_participant_cents)
            .ok_or(DomainError::CostOverflow)?;
        let cost_bikes_cents: i64 = i64::from(session.n_bikes)
            .checked_mul(cost_per_bike_cents)
            .ok_or(DomainError::CostOverflow)?;

        let run_length: u32 = consecutive_run_length(&days, session.day);
        let percent: i64 = bike_reduction_percent(run_length);
        let cost_bikes_reduced_cents: i64 = cost_bikes_cents
            .checked_mul(100 - percent)
            .ok_or(DomainError::CostOverflow)?
            / 100;

        lines.push(InvoiceLine {
            session_id: session.session_id,
            day: session.day,
            n_participants: session.n_participants,
            n_bikes: session.n_bikes,
            cost_participants_cents,
            cost_bikes_cents,
            bike_reduction_percent: percent,
            cost_bikes_reduced_cents,
        });
    }

    Ok(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use time::Month;

    fn d(day: u8) -> Date {
        Date::from_calendar_date(2026, Month::May, day).unwrap()
    }

    fn billing(session_id: i64, day: u8, participants: u16, bikes: u16) -> SessionBilling {
        SessionBilling {
            session_id,
            day: d(day),
            n_participants: participants,
            n_bikes: bikes,
        }
    }

    #[test]
    fn test_reduction_table_thresholds() {
        assert_eq!(bike_reduction_percent(0), 0);
        assert_eq!(bike_reduction_percent(1), 0);
        assert_eq!(bike_reduction_percent(2), 5);
        assert_eq!(bike_reduction_percent(3), 10);
        assert_eq!(bike_reduction_percent(4), 20);
        assert_eq!(bike_reduction_percent(5), 30);
        // Capped at 30% past the table.
        assert_eq!(bike_reduction_percent(6), 30);
        assert_eq!(bike_reduction_percent(30), 30);
    }

    #[test]
    fn test_run_length_single_day() {
        let days = vec![d(4)];
        assert_eq!(consecutive_run_length(&days, d(4)), 1);
    }

    #[test]
    fn test_run_length_day_absent() {
        let days = vec![d(4), d(5)];
        assert_eq!(consecutive_run_length(&days, d(9)), 0);
    }

    #[test]
    fn test_run_length_middle_of_run() {
        let days = vec![d(4), d(5), d(6), d(8)];
        assert_eq!(consecutive_run_length(&days, d(5)), 3);
        assert_eq!(consecutive_run_length(&days, d(8)), 1);
    }

    #[test]
    fn test_run_length_spans_month_boundary() {
        let days = vec![
            Date::from_calendar_date(2026, Month::April, 30).unwrap(),
            Date::from_calendar_date(2026, Month::May, 1).unwrap(),
        ];
        assert_eq!(consecutive_run_length(&days, days[0]), 2);
    }

    #[test]
    fn test_single_session_no_reduction() {
        let sessions = vec![billing(1, 4, 20, 10)];
        let lines = compute_invoice_lines(&sessions, 1000, 6000).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].cost_participants_cents, 20_000);
        assert_eq!(lines[0].cost_bikes_cents, 60_000);
        assert_eq!(lines[0].bike_reduction_percent, 0);
        assert_eq!(lines[0].cost_bikes_reduced_cents, 60_000);
        assert_eq!(lines[0].total_cents(), 80_000);
    }

    #[test]
    fn test_two_consecutive_days_five_percent() {
        let sessions = vec![billing(1, 4, 20, 10), billing(2, 5, 20, 10)];
        let lines = compute_invoice_lines(&sessions, 1000, 6000).unwrap();

        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert_eq!(line.bike_reduction_percent, 5);
            assert_eq!(line.cost_bikes_reduced_cents, 57_000);
        }
    }

    #[test]
    fn test_five_day_week_thirty_percent() {
        let sessions: Vec<SessionBilling> =
            (4..9).map(|day| billing(i64::from(day), day, 15, 8)).collect();
        let lines = compute_invoice_lines(&sessions, 1000, 6000).unwrap();

        for line in &lines {
            assert_eq!(line.bike_reduction_percent, 30);
            // 8 bikes x 6000 = 48000; minus 30% = 33600
            assert_eq!(line.cost_bikes_reduced_cents, 33_600);
        }
    }

    #[test]
    fn test_gap_splits_runs() {
        // Mon+Tue, gap, Thu alone: the pair gets 5%, the singleton 0%.
        let sessions = vec![billing(1, 4, 10, 5), billing(2, 5, 10, 5), billing(3, 7, 10, 5)];
        let lines = compute_invoice_lines(&sessions, 1000, 6000).unwrap();

        assert_eq!(lines[0].bike_reduction_percent, 5);
        assert_eq!(lines[1].bike_reduction_percent, 5);
        assert_eq!(lines[2].bike_reduction_percent, 0);
    }

    #[test]
    fn test_two_sessions_same_day_count_once() {
        // Two sessions on the 4th and one on the 5th: run length is 2 days,
        // not 3, so every line gets 5%.
        let sessions = vec![billing(1, 4, 10, 5), billing(2, 4, 12, 6), billing(3, 5, 10, 5)];
        let lines = compute_invoice_lines(&sessions, 1000, 6000).unwrap();

        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert_eq!(line.bike_reduction_percent, 5);
        }
    }

    #[test]
    fn test_lines_ordered_by_day_then_session() {
        let sessions = vec![billing(9, 6, 10, 5), billing(2, 4, 10, 5), billing(5, 4, 10, 5)];
        let lines = compute_invoice_lines(&sessions, 1000, 6000).unwrap();

        let order: Vec<i64> = lines.iter().map(|l| l.session_id).collect();
        assert_eq!(order, vec![2, 5, 9]);
    }

    #[test]
    fn test_reduction_floors_toward_zero() {
        // 1 bike at 99 centimes with 5%: 99 * 95 / 100 = 94.05 -> 94.
        let sessions = vec![billing(1, 4, 1, 1), billing(2, 5, 1, 1)];
        let lines = compute_invoice_lines(&sessions, 0, 99).unwrap();

        assert_eq!(lines[0].cost_bikes_reduced_cents, 94);
    }

    #[test]
    fn test_empty_input_yields_no_lines() {
        let lines = compute_invoice_lines(&[], 1000, 6000).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_invoice_status_transitions() {
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Sent));
        assert!(InvoiceStatus::Sent.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Draft));
        assert!(InvoiceStatus::Draft.is_mutable());
        assert!(!InvoiceStatus::Sent.is_mutable());
    }
}
