// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Qualification staffing rule tests.

use defivelo_domain::SeasonState;
use defivelo_persistence::Persistence;

use super::helpers::{
    coordinator, create_test_organization, create_test_profile, create_test_qualification,
    create_test_season, create_test_session, date, new_db,
};
use crate::{
    ApiError, AssignStaffRequest, DeclareAvailabilityRequest, assign_staff,
    availability_grid, declare_availability, list_qualifications,
};

struct StaffingFixture {
    season_id: i64,
    session_id: i64,
    qualification_id: i64,
    leader: i64,
    helper_one: i64,
    helper_two: i64,
    actor: i64,
}

/// Builds a Running season with one session and four volunteers who all
/// declared availability while the season was Open.
fn staffing_fixture(db: &mut Persistence) -> StaffingFixture {
    let organization_id: i64 = create_test_organization(db, "Collège du Léman", "VD");
    let season_id: i64 = create_test_season(db, 2026, &["VD"], SeasonState::Open);
    let session_id: i64 = create_test_session(db, organization_id, date(2026, 5, 4));
    let qualification_id: i64 = create_test_qualification(db, session_id, "7P-A", 20, 10);

    let leader: i64 = create_test_profile(db, "Anna", "Bernard", "VD", true, false);
    let helper_one: i64 = create_test_profile(db, "Luc", "Muller", "VD", false, false);
    let helper_two: i64 = create_test_profile(db, "Zoé", "Favre", "VD", false, false);
    let actor: i64 = create_test_profile(db, "Marc", "Rossier", "VD", false, true);

    let vd = coordinator(&["VD"]);
    for profile_id in [leader, helper_one, helper_two, actor] {
        declare_availability(
            db,
            DeclareAvailabilityRequest {
                profile_id,
                session_id,
                availability: String::from("Yes"),
            },
            &vd,
        )
        .expect("declare availability");
    }

    db.update_season_state(season_id, SeasonState::Running.as_str())
        .expect("advance to Running");

    StaffingFixture {
        season_id,
        session_id,
        qualification_id,
        leader,
        helper_one,
        helper_two,
        actor,
    }
}

#[test]
fn test_assign_full_staff() {
    let mut db: Persistence = new_db();
    let fixture: StaffingFixture = staffing_fixture(&mut db);
    let vd = coordinator(&["VD"]);

    assign_staff(
        &mut db,
        fixture.qualification_id,
        AssignStaffRequest {
            leader_id: Some(fixture.leader),
            helper_ids: vec![fixture.helper_one, fixture.helper_two],
            actor_id: Some(fixture.actor),
        },
        &vd,
    )
    .expect("assign staff");

    let listed = list_qualifications(&mut db, fixture.session_id, &vd).expect("list");
    assert_eq!(listed.qualifications.len(), 1);
    let qualification = &listed.qualifications[0];
    assert_eq!(qualification.leader_id, Some(fixture.leader));
    assert_eq!(
        qualification.helper_ids,
        vec![fixture.helper_one, fixture.helper_two]
    );
    assert_eq!(qualification.actor_id, Some(fixture.actor));
    assert!(qualification.is_complete);
}

#[test]
fn test_assign_rejects_leader_without_capability() {
    let mut db: Persistence = new_db();
    let fixture: StaffingFixture = staffing_fixture(&mut db);

    let result = assign_staff(
        &mut db,
        fixture.qualification_id,
        AssignStaffRequest {
            leader_id: Some(fixture.helper_one),
            helper_ids: vec![],
            actor_id: None,
        },
        &coordinator(&["VD"]),
    );
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "leader_capability"
    ));
}

#[test]
fn test_assign_rejects_actor_without_capability() {
    let mut db: Persistence = new_db();
    let fixture: StaffingFixture = staffing_fixture(&mut db);

    let result = assign_staff(
        &mut db,
        fixture.qualification_id,
        AssignStaffRequest {
            leader_id: Some(fixture.leader),
            helper_ids: vec![fixture.helper_one],
            actor_id: Some(fixture.helper_two),
        },
        &coordinator(&["VD"]),
    );
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "actor_capability"
    ));
}

#[test]
fn test_assign_rejects_duplicate_person() {
    let mut db: Persistence = new_db();
    let fixture: StaffingFixture = staffing_fixture(&mut db);

    let result = assign_staff(
        &mut db,
        fixture.qualification_id,
        AssignStaffRequest {
            leader_id: Some(fixture.leader),
            helper_ids: vec![fixture.leader],
            actor_id: None,
        },
        &coordinator(&["VD"]),
    );
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "distinct_staff"
    ));
}

#[test]
fn test_assign_rejects_three_helpers() {
    let mut db: Persistence = new_db();
    let fixture: StaffingFixture = staffing_fixture(&mut db);

    let result = assign_staff(
        &mut db,
        fixture.qualification_id,
        AssignStaffRequest {
            leader_id: None,
            helper_ids: vec![fixture.helper_one, fixture.helper_two, fixture.actor],
            actor_id: None,
        },
        &coordinator(&["VD"]),
    );
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "max_two_helpers"
    ));
}

#[test]
fn test_assign_rejects_undeclared_volunteer() {
    let mut db: Persistence = new_db();
    let fixture: StaffingFixture = staffing_fixture(&mut db);
    let stranger: i64 = create_test_profile(&mut db, "Paul", "Girard", "VD", true, false);

    let result = assign_staff(
        &mut db,
        fixture.qualification_id,
        AssignStaffRequest {
            leader_id: Some(stranger),
            helper_ids: vec![],
            actor_id: None,
        },
        &coordinator(&["VD"]),
    );
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "availability_required"
    ));
}

#[test]
fn test_availability_grid_covers_season() {
    let mut db: Persistence = new_db();
    let fixture: StaffingFixture = staffing_fixture(&mut db);

    let grid = availability_grid(&mut db, fixture.season_id, &coordinator(&["VD"]))
        .expect("availability grid");
    assert_eq!(grid.sessions.len(), 1);
    assert_eq!(grid.profiles.len(), 4);
    assert_eq!(grid.entries.len(), 4);
    assert!(grid.entries.iter().all(|e| e.availability == "Yes"));
}
