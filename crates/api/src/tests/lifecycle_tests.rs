// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Season lifecycle gate enforcement across the API surface.

use defivelo_domain::SeasonState;
use defivelo_persistence::Persistence;

use super::helpers::{
    collaborator, coordinator, create_test_organization, create_test_profile,
    create_test_qualification, create_test_season, create_test_session, date, new_db,
};
use crate::{
    ApiError, ChooseStaffRequest, DeclareAvailabilityRequest, SaveSessionRequest,
    TransitionSeasonRequest, UpdateSeasonRequest, choose_staff, create_session,
    declare_availability, delete_session, transition_season, update_qualification,
    update_season,
};

fn session_request(organization_id: i64, day: &str) -> SaveSessionRequest {
    SaveSessionRequest {
        organization_id,
        day: String::from(day),
        begin_time: String::from("08:30"),
        end_time: String::from("12:00"),
        fallback_plan: None,
    }
}

#[test]
fn test_session_creation_follows_season_state() {
    let mut db: Persistence = new_db();
    let organization_id: i64 = create_test_organization(&mut db, "Collège du Léman", "VD");
    let vd = coordinator(&["VD"]);

    create_test_season(&mut db, 2026, &["VD"], SeasonState::Open);
    create_session(&mut db, session_request(organization_id, "2026-05-04"), &vd)
        .expect("create while Open");

    // A second season in Running state over the same range locks the day.
    create_test_season(&mut db, 2026, &["VD"], SeasonState::Running);
    let result = create_session(&mut db, session_request(organization_id, "2026-05-05"), &vd);
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "season_lifecycle"
    ));
}

#[test]
fn test_session_outside_any_season_is_unrestricted() {
    let mut db: Persistence = new_db();
    let organization_id: i64 = create_test_organization(&mut db, "Collège du Léman", "VD");
    create_test_season(&mut db, 2026, &["VD"], SeasonState::Running);

    // December is outside the April-July season.
    create_session(
        &mut db,
        session_request(organization_id, "2026-12-01"),
        &coordinator(&["VD"]),
    )
    .expect("no covering season, no gate");
}

#[test]
fn test_session_delete_blocked_once_running() {
    let mut db: Persistence = new_db();
    let organization_id: i64 = create_test_organization(&mut db, "Collège du Léman", "VD");
    let season_id: i64 = create_test_season(&mut db, 2026, &["VD"], SeasonState::Open);
    let session_id: i64 = create_test_session(&mut db, organization_id, date(2026, 5, 4));
    let vd = coordinator(&["VD"]);

    db.update_season_state(season_id, SeasonState::Running.as_str())
        .expect("advance season");
    let result = delete_session(&mut db, session_id, &vd);
    assert!(matches!(result, Err(ApiError::DomainRuleViolation { .. })));
}

#[test]
fn test_qualification_edit_blocked_once_running() {
    let mut db: Persistence = new_db();
    let organization_id: i64 = create_test_organization(&mut db, "Collège du Léman", "VD");
    let season_id: i64 = create_test_season(&mut db, 2026, &["VD"], SeasonState::Open);
    let session_id: i64 = create_test_session(&mut db, organization_id, date(2026, 5, 4));
    let qualification_id: i64 =
        create_test_qualification(&mut db, session_id, "7P-A", 20, 10);

    db.update_season_state(season_id, SeasonState::Running.as_str())
        .expect("advance season");
    let result = update_qualification(
        &mut db,
        qualification_id,
        crate::UpdateQualificationRequest {
            class_name: String::from("7P-A"),
            n_participants: 22,
            n_bikes: 10,
            n_helmets: 22,
        },
        &coordinator(&["VD"]),
    );
    assert!(matches!(result, Err(ApiError::DomainRuleViolation { .. })));
}

#[test]
fn test_availability_entry_only_while_open() {
    let mut db: Persistence = new_db();
    let organization_id: i64 = create_test_organization(&mut db, "Collège du Léman", "VD");
    let season_id: i64 = create_test_season(&mut db, 2026, &["VD"], SeasonState::Planning);
    let session_id: i64 = create_test_session(&mut db, organization_id, date(2026, 5, 4));
    let profile_id: i64 = create_test_profile(&mut db, "Paul", "Girard", "VD", false, false);
    let me = collaborator(profile_id);

    let request = DeclareAvailabilityRequest {
        profile_id,
        session_id,
        availability: String::from("Yes"),
    };
    let result = declare_availability(&mut db, request.clone(), &me);
    assert!(matches!(result, Err(ApiError::DomainRuleViolation { .. })));

    db.update_season_state(season_id, SeasonState::Open.as_str())
        .expect("open season");
    declare_availability(&mut db, request, &me).expect("declare while Open");
}

#[test]
fn test_collaborator_declares_own_availability_only() {
    let mut db: Persistence = new_db();
    let organization_id: i64 = create_test_organization(&mut db, "Collège du Léman", "VD");
    create_test_season(&mut db, 2026, &["VD"], SeasonState::Open);
    let session_id: i64 = create_test_session(&mut db, organization_id, date(2026, 5, 4));
    let own: i64 = create_test_profile(&mut db, "Paul", "Girard", "VD", false, false);
    let other: i64 = create_test_profile(&mut db, "Anna", "Bernard", "VD", true, false);

    let result = declare_availability(
        &mut db,
        DeclareAvailabilityRequest {
            profile_id: other,
            session_id,
            availability: String::from("Yes"),
        },
        &collaborator(own),
    );
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));

    // A coordinator may declare for any profile in their cantons.
    declare_availability(
        &mut db,
        DeclareAvailabilityRequest {
            profile_id: other,
            session_id,
            availability: String::from("IfNeeded"),
        },
        &coordinator(&["VD"]),
    )
    .expect("coordinator declares on behalf");
}

#[test]
fn test_choose_requires_running_and_declared_availability() {
    let mut db: Persistence = new_db();
    let organization_id: i64 = create_test_organization(&mut db, "Collège du Léman", "VD");
    let season_id: i64 = create_test_season(&mut db, 2026, &["VD"], SeasonState::Open);
    let session_id: i64 = create_test_session(&mut db, organization_id, date(2026, 5, 4));
    let available: i64 = create_test_profile(&mut db, "Anna", "Bernard", "VD", true, false);
    let refused: i64 = create_test_profile(&mut db, "Luc", "Muller", "VD", false, false);
    let silent: i64 = create_test_profile(&mut db, "Zoé", "Favre", "VD", false, false);
    let vd = coordinator(&["VD"]);

    declare_availability(
        &mut db,
        DeclareAvailabilityRequest {
            profile_id: available,
            session_id,
            availability: String::from("Yes"),
        },
        &vd,
    )
    .expect("declare");
    declare_availability(
        &mut db,
        DeclareAvailabilityRequest {
            profile_id: refused,
            session_id,
            availability: String::from("No"),
        },
        &vd,
    )
    .expect("declare");

    // Still Open: choosing is not allowed yet.
    let early = choose_staff(
        &mut db,
        ChooseStaffRequest {
            profile_id: available,
            session_id,
            role: String::from("Leader"),
        },
        &vd,
    );
    assert!(matches!(early, Err(ApiError::DomainRuleViolation { .. })));

    db.update_season_state(season_id, SeasonState::Running.as_str())
        .expect("advance season");

    choose_staff(
        &mut db,
        ChooseStaffRequest {
            profile_id: available,
            session_id,
            role: String::from("Leader"),
        },
        &vd,
    )
    .expect("choose available volunteer");

    let declared_no = choose_staff(
        &mut db,
        ChooseStaffRequest {
            profile_id: refused,
            session_id,
            role: String::from("Helper"),
        },
        &vd,
    );
    assert!(matches!(
        declared_no,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "availability_required"
    ));

    let undeclared = choose_staff(
        &mut db,
        ChooseStaffRequest {
            profile_id: silent,
            session_id,
            role: String::from("Helper"),
        },
        &vd,
    );
    assert!(matches!(undeclared, Err(ApiError::ResourceNotFound { .. })));
}

#[test]
fn test_season_transitions_are_linear() {
    let mut db: Persistence = new_db();
    let season_id: i64 = create_test_season(&mut db, 2026, &["VD"], SeasonState::Planning);
    let vd = coordinator(&["VD"]);

    let skip = transition_season(
        &mut db,
        season_id,
        TransitionSeasonRequest {
            target_state: String::from("Running"),
        },
        &vd,
    );
    assert!(matches!(skip, Err(ApiError::DomainRuleViolation { .. })));

    for state in ["Open", "Running", "Finished", "Archived"] {
        transition_season(
            &mut db,
            season_id,
            TransitionSeasonRequest {
                target_state: String::from(state),
            },
            &vd,
        )
        .expect("linear transition");
    }

    // Archived is terminal.
    let beyond = transition_season(
        &mut db,
        season_id,
        TransitionSeasonRequest {
            target_state: String::from("Planning"),
        },
        &vd,
    );
    assert!(matches!(beyond, Err(ApiError::DomainRuleViolation { .. })));
}

#[test]
fn test_update_season_only_while_planning() {
    let mut db: Persistence = new_db();
    let season_id: i64 = create_test_season(&mut db, 2026, &["VD"], SeasonState::Open);

    let result = update_season(
        &mut db,
        season_id,
        UpdateSeasonRequest {
            year: 2026,
            month_start: 5,
            n_months: 3,
            cantons: vec![String::from("VD")],
            cost_per_participant_cents: 1_000,
            cost_per_bike_cents: 2_000,
        },
        &coordinator(&["VD"]),
    );
    assert!(matches!(result, Err(ApiError::DomainRuleViolation { .. })));
}
