// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use defivelo_domain::{
    Canton, Organization, Qualification, Season, SeasonState, Session, VolunteerProfile,
};
use defivelo_persistence::Persistence;
use time::{Date, Month, Time};

use crate::{AuthenticatedAccount, Role};

pub fn new_db() -> Persistence {
    Persistence::new_in_memory().expect("in-memory database")
}

pub fn canton(code: &str) -> Canton {
    Canton::new(code).expect("valid canton code")
}

pub fn date(year: i32, month: u8, day: u8) -> Date {
    Date::from_calendar_date(year, Month::try_from(month).expect("valid month"), day)
        .expect("valid date")
}

// Synthetic caller IDs sit far above anything the tests insert, so the
// self-deletion guard never trips by accident.
pub fn power_user() -> AuthenticatedAccount {
    AuthenticatedAccount {
        account_id: 999,
        display_name: String::from("Root Admin"),
        role: Role::PowerUser,
        managed_cantons: Vec::new(),
        profile_id: None,
    }
}

pub fn coordinator(codes: &[&str]) -> AuthenticatedAccount {
    AuthenticatedAccount {
        account_id: 998,
        display_name: String::from("Canton Coordinator"),
        role: Role::Coordinator,
        managed_cantons: codes.iter().map(|code| canton(code)).collect(),
        profile_id: None,
    }
}

pub fn collaborator(profile_id: i64) -> AuthenticatedAccount {
    AuthenticatedAccount {
        account_id: 997,
        display_name: String::from("Volunteer Login"),
        role: Role::Collaborator,
        managed_cantons: Vec::new(),
        profile_id: Some(profile_id),
    }
}

pub fn create_test_organization(
    persistence: &mut Persistence,
    name: &str,
    canton_code: &str,
) -> i64 {
    let organization: Organization = Organization::new(
        String::from(name),
        String::from("Rue du Lac 1"),
        String::from("1000"),
        String::from("Lausanne"),
        canton(canton_code),
        Some(String::from("A. Rochat")),
    )
    .expect("valid organization");
    persistence
        .create_organization(&organization)
        .expect("create organization")
}

pub fn create_test_profile(
    persistence: &mut Persistence,
    first: &str,
    last: &str,
    canton_code: &str,
    can_lead: bool,
    is_actor: bool,
) -> i64 {
    let email: String = format!(
        "{}.{}@example.ch",
        first.to_lowercase(),
        last.to_lowercase()
    );
    let profile: VolunteerProfile = VolunteerProfile::new(
        String::from(first),
        String::from(last),
        email,
        canton(canton_code),
        can_lead,
        is_actor,
        true,
    )
    .expect("valid profile");
    let token: String = format!("token-{first}-{last}");
    persistence
        .create_profile(&profile, &token)
        .expect("create profile")
}

/// Creates a season covering April to July of the year and forces it into
/// the given lifecycle state.
pub fn create_test_season(
    persistence: &mut Persistence,
    year: u16,
    codes: &[&str],
    state: SeasonState,
) -> i64 {
    let cantons: Vec<Canton> = codes.iter().map(|code| canton(code)).collect();
    let season: Season = Season::new(year, 4, 4, cantons).expect("valid season");
    let season_id: i64 = persistence.create_season(&season).expect("create season");
    if state != SeasonState::Planning {
        persistence
            .update_season_state(season_id, state.as_str())
            .expect("force season state");
    }
    season_id
}

pub fn create_test_session(persistence: &mut Persistence, organization_id: i64, day: Date) -> i64 {
    let session: Session = Session::new(
        organization_id,
        day,
        Time::from_hms(8, 30, 0).expect("valid time"),
        Time::from_hms(12, 0, 0).expect("valid time"),
        Some(String::from("Gym hall if raining")),
    )
    .expect("valid session");
    persistence.create_session(&session).expect("create session")
}

pub fn create_test_qualification(
    persistence: &mut Persistence,
    session_id: i64,
    class_name: &str,
    n_participants: u16,
    n_bikes: u16,
) -> i64 {
    let qualification: Qualification = Qualification::new(
        session_id,
        String::from(class_name),
        n_participants,
        n_bikes,
        n_participants,
    )
    .expect("valid qualification");
    persistence
        .create_qualification(&qualification)
        .expect("create qualification")
}
