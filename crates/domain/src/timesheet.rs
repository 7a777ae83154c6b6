// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Timesheet amount computation.
//!
//! A timesheet entry covers one volunteer on one day. The chosen-role
//! records of that day's sessions are counted per role and multiplied by
//! the fixed day rates.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use time::Date;

/// Pay per session worked as a qualification leader, in centimes.
pub const LEADER_RATE_CENTS: i64 = 12_000;

/// Pay per session worked as a helper, in centimes.
pub const HELPER_RATE_CENTS: i64 = 10_000;

/// Pay per session worked as the subject-matter actor, in centimes.
pub const ACTOR_RATE_CENTS: i64 = 8_000;

/// How many sessions a volunteer worked in each role on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayRoleCounts {
    /// Sessions worked as leader.
    pub n_leader: u16,
    /// Sessions worked as helper.
    pub n_helper: u16,
    /// Sessions worked as actor.
    pub n_actor: u16,
}

impl DayRoleCounts {
    /// Returns whether the volunteer worked at all on this day.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.n_leader > 0 || self.n_helper > 0 || self.n_actor > 0
    }
}

/// One volunteer's pay record for one day.
///
/// Unique per `(profile, day)`. Once validated by a coordinator the entry
/// is locked against recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimesheetEntry {
    /// Canonical identifier assigned by the database.
    pub timesheet_id: Option<i64>,
    /// The volunteer being paid.
    pub profile_id: i64,
    /// The day worked.
    pub day: Date,
    /// Session counts per role.
    pub counts: DayRoleCounts,
    /// The computed amount in centimes.
    pub amount_cents: i64,
    /// Whether a coordinator has validated this entry.
    pub validated: bool,
}

/// Computes a timesheet entry from a day's role counts.
///
/// The amount is the sum of each count multiplied by its role's day rate.
///
/// # Arguments
///
/// * `profile_id` - The volunteer being paid
/// * `day` - The day worked
/// * `counts` - Sessions worked per role on that day
///
/// # Errors
///
/// Returns `DomainError::CostOverflow` if the amount overflows `i64`.
pub fn compute_timesheet_entry(
    profile_id: i64,
    day: Date,
    counts: DayRoleCounts,
) -> Result<TimesheetEntry, DomainError> {
    let leader_pay = i64::from(counts.n_leader)
        .checked_mul(LEADER_RATE_CENTS)
        .ok_or(DomainError::CostOverflow)?;
    let helper_pay = i64::from(counts.n_helper)
        .checked_mul(HELPER_RATE_CENTS)
        .ok_or(DomainError::CostOverflow)?;
    let actor_pay = i64::from(counts.n_actor)
        .checked_mul(ACTOR_RATE_CENTS)
        .ok_or(DomainError::CostOverflow)?;
    let amount_cents = leader_pay
        .checked_add(helper_pay)
        .and_then(|sum| sum.checked_add(actor_pay))
        .ok_or(DomainError::CostOverflow)?;

    Ok(TimesheetEntry {
        timesheet_id: None,
        profile_id,
        day,
        counts,
        amount_cents,
        validated: false,
    })
}
