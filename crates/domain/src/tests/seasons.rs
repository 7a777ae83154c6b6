// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    Canton, DEFAULT_COST_PER_BIKE_CENTS, DEFAULT_COST_PER_PARTICIPANT_CENTS, DomainError, Season,
    SeasonState,
};
use time::{Date, Month};

fn create_test_season() -> Season {
    Season::new(2026, 3, 5, vec![Canton::new("VD").unwrap()]).unwrap()
}

#[test]
fn test_season_starts_in_planning_with_default_prices() {
    let season: Season = create_test_season();

    assert_eq!(season.state, SeasonState::Planning);
    assert_eq!(
        season.cost_per_participant_cents,
        DEFAULT_COST_PER_PARTICIPANT_CENTS
    );
    assert_eq!(season.cost_per_bike_cents, DEFAULT_COST_PER_BIKE_CENTS);
}

#[test]
fn test_season_rejects_invalid_span() {
    let cantons = vec![Canton::new("VD").unwrap()];
    assert!(Season::new(2026, 0, 5, cantons.clone()).is_err());
    assert!(Season::new(2026, 13, 5, cantons.clone()).is_err());
    assert!(Season::new(2026, 3, 0, cantons.clone()).is_err());
    assert!(Season::new(2026, 3, 13, cantons).is_err());
}

#[test]
fn test_season_date_range() {
    // March through July 2026.
    let season: Season = create_test_season();

    let begin: Date = season.begin().unwrap();
    let end: Date = season.end().unwrap();
    assert_eq!(begin, Date::from_calendar_date(2026, Month::March, 1).unwrap());
    assert_eq!(end, Date::from_calendar_date(2026, Month::July, 31).unwrap());
}

#[test]
fn test_season_date_range_crosses_year_boundary() {
    // November 2026 through February 2027.
    let season: Season = Season::new(2026, 11, 4, vec![Canton::new("GE").unwrap()]).unwrap();

    let end: Date = season.end().unwrap();
    assert_eq!(
        end,
        Date::from_calendar_date(2027, Month::February, 28).unwrap()
    );
}

#[test]
fn test_season_contains_day() {
    let season: Season = create_test_season();

    let inside: Date = Date::from_calendar_date(2026, Month::May, 4).unwrap();
    let before: Date = Date::from_calendar_date(2026, Month::February, 28).unwrap();
    let after: Date = Date::from_calendar_date(2026, Month::August, 1).unwrap();

    assert!(season.contains_day(inside).unwrap());
    assert!(!season.contains_day(before).unwrap());
    assert!(!season.contains_day(after).unwrap());
}

#[test]
fn test_season_covers_canton() {
    let season: Season = create_test_season();

    assert!(season.covers_canton(&Canton::new("VD").unwrap()));
    assert!(!season.covers_canton(&Canton::new("GE").unwrap()));
}

#[test]
fn test_lifecycle_is_strictly_linear() {
    let mut season: Season = create_test_season();

    season.transition_to(SeasonState::Open).unwrap();
    season.transition_to(SeasonState::Running).unwrap();
    season.transition_to(SeasonState::Finished).unwrap();
    season.transition_to(SeasonState::Archived).unwrap();
    assert_eq!(season.state, SeasonState::Archived);
}

#[test]
fn test_lifecycle_rejects_skipping_states() {
    let mut season: Season = create_test_season();

    let result = season.transition_to(SeasonState::Running);
    assert_eq!(
        result,
        Err(DomainError::InvalidSeasonTransition {
            from: SeasonState::Planning,
            to: SeasonState::Running,
        })
    );
    assert_eq!(season.state, SeasonState::Planning);
}

#[test]
fn test_lifecycle_rejects_going_backward() {
    let mut season: Season = create_test_season();
    season.transition_to(SeasonState::Open).unwrap();

    assert!(season.transition_to(SeasonState::Planning).is_err());
    assert_eq!(season.state, SeasonState::Open);
}

#[test]
fn test_archived_is_terminal() {
    let state: SeasonState = SeasonState::Archived;

    assert!(!state.can_transition_to(SeasonState::Planning));
    assert!(!state.can_transition_to(SeasonState::Open));
    assert!(!state.can_transition_to(SeasonState::Running));
    assert!(!state.can_transition_to(SeasonState::Finished));
    assert!(!state.can_transition_to(SeasonState::Archived));
}

#[test]
fn test_state_gates() {
    assert!(SeasonState::Planning.allows_structural_changes());
    assert!(SeasonState::Open.allows_structural_changes());
    assert!(!SeasonState::Running.allows_structural_changes());

    assert!(SeasonState::Open.allows_availability_entry());
    assert!(!SeasonState::Planning.allows_availability_entry());
    assert!(!SeasonState::Running.allows_availability_entry());

    assert!(SeasonState::Running.allows_staff_assignment());
    assert!(!SeasonState::Open.allows_staff_assignment());

    assert!(SeasonState::Finished.allows_settlement());
    assert!(SeasonState::Archived.allows_settlement());
    assert!(!SeasonState::Running.allows_settlement());

    assert!(SeasonState::Archived.is_archived());
    assert!(!SeasonState::Finished.is_archived());
}

#[test]
fn test_state_string_round_trip() {
    for state in [
        SeasonState::Planning,
        SeasonState::Open,
        SeasonState::Running,
        SeasonState::Finished,
        SeasonState::Archived,
    ] {
        let parsed: SeasonState = state.as_str().parse().unwrap();
        assert_eq!(parsed, state);
    }
    assert!("Cancelled".parse::<SeasonState>().is_err());
}
