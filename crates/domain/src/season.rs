// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::Canton;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, Month};

/// Default participant price per session, in centimes.
pub const DEFAULT_COST_PER_PARTICIPANT_CENTS: i64 = 1000;

/// Default bike rental price per session, in centimes.
pub const DEFAULT_COST_PER_BIKE_CENTS: i64 = 6000;

/// Represents the lifecycle state of a season.
///
/// The lifecycle is strictly linear and gates which operations are
/// permitted at each phase of the planning workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SeasonState {
    /// Initial state after creation. Structural editing only.
    #[default]
    Planning,
    /// Volunteers declare per-session availability.
    Open,
    /// Coordinators assign staff from declared availabilities.
    Running,
    /// Sessions are over. Timesheets and invoices are produced.
    Finished,
    /// Fully read-only.
    Archived,
}

impl FromStr for SeasonState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Planning" => Ok(Self::Planning),
            "Open" => Ok(Self::Open),
            "Running" => Ok(Self::Running),
            "Finished" => Ok(Self::Finished),
            "Archived" => Ok(Self::Archived),
            _ => Err(DomainError::InvalidName(format!(
                "Unknown season state: {s}"
            ))),
        }
    }
}

impl std::fmt::Display for SeasonState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl SeasonState {
    /// Converts this state to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Open => "Open",
            Self::Running => "Running",
            Self::Finished => "Finished",
            Self::Archived => "Archived",
        }
    }

    /// Checks if a transition from this state to another is valid.
    ///
    /// Valid transitions are:
    /// - Planning → Open
    /// - Open → Running
    /// - Running → Finished
    /// - Finished → Archived
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Planning, Self::Open)
                | (Self::Open, Self::Running)
                | (Self::Running, Self::Finished)
                | (Self::Finished, Self::Archived)
        )
    }

    /// Returns whether sessions and qualifications may be created or edited.
    #[must_use]
    pub const fn allows_structural_changes(&self) -> bool {
        matches!(self, Self::Planning | Self::Open)
    }

    /// Returns whether volunteers may declare or change availability.
    #[must_use]
    pub const fn allows_availability_entry(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns whether coordinators may set `chosen_as` assignments.
    #[must_use]
    pub const fn allows_staff_assignment(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns whether timesheets may be validated and invoices created.
    #[must_use]
    pub const fn allows_settlement(&self) -> bool {
        matches!(self, Self::Finished | Self::Archived)
    }

    /// Returns whether the season is fully read-only.
    #[must_use]
    pub const fn is_archived(&self) -> bool {
        matches!(self, Self::Archived)
    }
}

/// A planning period scoping sessions to a date range and a set of cantons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    /// Canonical identifier assigned by the database.
    /// `None` indicates the season has not been persisted yet.
    pub season_id: Option<i64>,
    /// The calendar year the season starts in.
    pub year: u16,
    /// First month of the season (1-12).
    pub month_start: u8,
    /// Duration in months (1-12).
    pub n_months: u8,
    /// The cantons this season covers.
    pub cantons: Vec<Canton>,
    /// The lifecycle state.
    pub state: SeasonState,
    /// Participant price per session, in centimes.
    pub cost_per_participant_cents: i64,
    /// Bike rental price per session, in centimes.
    pub cost_per_bike_cents: i64,
}

impl Season {
    /// Creates a new season in the `Planning` state with default prices.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSeasonSpan` if the start month or
    /// duration is outside 1-12.
    pub fn new(
        year: u16,
        month_start: u8,
        n_months: u8,
        cantons: Vec<Canton>,
    ) -> Result<Self, DomainError> {
        if !(1..=12).contains(&month_start) || !(1..=12).contains(&n_months) {
            return Err(DomainError::InvalidSeasonSpan {
                month_start,
                n_months,
            });
        }
        Ok(Self {
            season_id: None,
            year,
            month_start,
            n_months,
            cantons,
            state: SeasonState::Planning,
            cost_per_participant_cents: DEFAULT_COST_PER_PARTICIPANT_CENTS,
            cost_per_bike_cents: DEFAULT_COST_PER_BIKE_CENTS,
        })
    }

    /// Returns the first day of the season.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored span does not form a valid date.
    pub fn begin(&self) -> Result<Date, DomainError> {
        let month = month_from_number(self.month_start)?;
        Date::from_calendar_date(i32::from(self.year), month, 1).map_err(|e| {
            DomainError::DateParseError {
                date_string: format!("{}-{:02}-01", self.year, self.month_start),
                error: e.to_string(),
            }
        })
    }

    /// Returns the last day of the season.
    ///
    /// The season ends on the last day of the month `n_months - 1` months
    /// after the start month, rolling over the year boundary if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored span does not form a valid date.
    pub fn end(&self) -> Result<Date, DomainError> {
        // Zero-based month arithmetic, then back to 1-based.
        let months_total = u16::from(self.month_start) - 1 + u16::from(self.n_months) - 1;
        let end_year = i32::from(self.year) + i32::from(months_total / 12);
        let end_month = month_from_number(u8::try_from(months_total % 12 + 1).unwrap_or(12))?;
        let last_day = end_month.length(end_year);
        Date::from_calendar_date(end_year, end_month, last_day).map_err(|e| {
            DomainError::DateParseError {
                date_string: format!("{end_year}-{end_month}-{last_day}"),
                error: e.to_string(),
            }
        })
    }

    /// Returns whether the given day falls within the season's date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored span does not form valid dates.
    pub fn contains_day(&self, day: Date) -> Result<bool, DomainError> {
        Ok(day >= self.begin()? && day <= self.end()?)
    }

    /// Returns whether the given canton is covered by this season.
    #[must_use]
    pub fn covers_canton(&self, canton: &Canton) -> bool {
        self.cantons.contains(canton)
    }

    /// Validates and applies a lifecycle transition.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSeasonTransition` if the transition is
    /// not the single permitted next step.
    pub fn transition_to(&mut self, target: SeasonState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(target) {
            return Err(DomainError::InvalidSeasonTransition {
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        Ok(())
    }
}

/// Converts a 1-based month number into a `time::Month`.
fn month_from_number(n: u8) -> Result<Month, DomainError> {
    Month::try_from(n).map_err(|e| DomainError::DateParseError {
        date_string: format!("month {n}"),
        error: e.to_string(),
    })
}
