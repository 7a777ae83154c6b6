// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod availability;
mod error;
mod invoice;
mod season;
mod session;
mod timesheet;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use availability::{Availability, ChosenRole, SessionAvailability};
pub use error::DomainError;
pub use invoice::{
    BIKE_REDUCTION_TABLE, InvoiceLine, InvoiceStatus, SessionBilling, bike_reduction_percent,
    compute_invoice_lines, consecutive_run_length,
};
pub use season::{
    DEFAULT_COST_PER_BIKE_CENTS, DEFAULT_COST_PER_PARTICIPANT_CENTS, Season, SeasonState,
};
pub use session::{
    MAX_HELPERS, MAX_PARTICIPANTS_PER_CLASS, Qualification, Session, StaffAssignment,
    validate_staffing,
};
pub use timesheet::{
    ACTOR_RATE_CENTS, HELPER_RATE_CENTS, LEADER_RATE_CENTS, DayRoleCounts, TimesheetEntry,
    compute_timesheet_entry,
};
pub use types::{Canton, Organization, VolunteerProfile};
pub use validation::{validate_class_name, validate_email, validate_person_name};
