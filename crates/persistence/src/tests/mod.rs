// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::Persistence;
use defivelo_domain::{Canton, Organization, Season, Session, VolunteerProfile};
use time::{Date, Month, Time};

mod accounts;
mod availability;
mod directory;

fn new_db() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create in-memory database")
}

fn canton(code: &str) -> Canton {
    Canton::new(code).expect("Valid canton code")
}

fn date(year: i32, month: u8, day: u8) -> Date {
    Date::from_calendar_date(year, Month::try_from(month).expect("Valid month"), day)
        .expect("Valid date")
}

fn time_of(hour: u8, minute: u8) -> Time {
    Time::from_hms(hour, minute, 0).expect("Valid time")
}

fn sample_organization(name: &str, canton_code: &str) -> Organization {
    Organization::new(
        name.to_string(),
        "Rue du Lac 1".to_string(),
        "1000".to_string(),
        "Lausanne".to_string(),
        canton(canton_code),
        Some("A. Rochat".to_string()),
    )
    .expect("Valid organization")
}

fn sample_profile(first: &str, last: &str, canton_code: &str) -> VolunteerProfile {
    let email: String = format!(
        "{}.{}@example.org",
        first.to_lowercase(),
        last.to_lowercase()
    );
    VolunteerProfile::new(
        first.to_string(),
        last.to_string(),
        email,
        canton(canton_code),
        true,
        false,
        true,
    )
    .expect("Valid profile")
}

fn sample_season(year: u16, month_start: u8, n_months: u8, codes: &[&str]) -> Season {
    let cantons: Vec<Canton> = codes.iter().map(|c| canton(c)).collect();
    Season::new(year, month_start, n_months, cantons).expect("Valid season")
}

fn sample_session(organization_id: i64, day: Date) -> Session {
    Session::new(
        organization_id,
        day,
        time_of(8, 30),
        time_of(12, 0),
        Some("Gym hall if raining".to_string()),
    )
    .expect("Valid session")
}
