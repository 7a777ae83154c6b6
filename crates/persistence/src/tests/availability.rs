// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{date, new_db, sample_organization, sample_profile, sample_session};
use crate::{Persistence, PersistenceError};
use defivelo_domain::{Availability, ChosenRole, Session, SessionAvailability};
use time::Date;

struct Fixture {
    profile_id: i64,
    session_id: i64,
}

fn fixture(db: &mut Persistence) -> Fixture {
    let org_id: i64 = db
        .create_organization(&sample_organization("Vaud School", "VD"))
        .expect("Failed to create organization");
    let session_id: i64 = db
        .create_session(&sample_session(org_id, date(2026, 5, 4)))
        .expect("Failed to create session");
    let profile_id: i64 = db
        .create_profile(&sample_profile("Claire", "Dubois", "VD"), "t-1")
        .expect("Failed to create profile");
    Fixture {
        profile_id,
        session_id,
    }
}

#[test]
fn test_declare_and_read_availability() {
    let mut db: Persistence = new_db();
    let f: Fixture = fixture(&mut db);

    db.set_availability(f.profile_id, f.session_id, Availability::Yes)
        .expect("Failed to set availability");

    let record: SessionAvailability = db
        .get_availability(f.profile_id, f.session_id)
        .expect("Query failed")
        .expect("Record should exist");
    assert_eq!(record.availability, Availability::Yes);
    assert_eq!(record.chosen_as, ChosenRole::NotChosen);
}

#[test]
fn test_redeclaring_updates_in_place() {
    let mut db: Persistence = new_db();
    let f: Fixture = fixture(&mut db);

    let first_id: i64 = db
        .set_availability(f.profile_id, f.session_id, Availability::Yes)
        .expect("Failed to set availability");
    let second_id: i64 = db
        .set_availability(f.profile_id, f.session_id, Availability::IfNeeded)
        .expect("Failed to set availability");

    assert_eq!(first_id, second_id);
    let records: Vec<SessionAvailability> = db
        .list_availabilities_for_session(f.session_id)
        .expect("Query failed");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].availability, Availability::IfNeeded);
}

#[test]
fn test_redeclaring_keeps_chosen_role() {
    let mut db: Persistence = new_db();
    let f: Fixture = fixture(&mut db);

    db.set_availability(f.profile_id, f.session_id, Availability::Yes)
        .expect("Failed to set availability");
    db.set_chosen_role(f.profile_id, f.session_id, ChosenRole::Helper)
        .expect("Failed to choose");
    db.set_availability(f.profile_id, f.session_id, Availability::IfNeeded)
        .expect("Failed to set availability");

    let record: SessionAvailability = db
        .get_availability(f.profile_id, f.session_id)
        .expect("Query failed")
        .expect("Record should exist");
    assert_eq!(record.chosen_as, ChosenRole::Helper);
}

#[test]
fn test_choose_without_declaration_fails() {
    let mut db: Persistence = new_db();
    let f: Fixture = fixture(&mut db);

    let result = db.set_chosen_role(f.profile_id, f.session_id, ChosenRole::Leader);
    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
}

#[test]
fn test_availability_grid_for_sessions() {
    let mut db: Persistence = new_db();

    let org_id: i64 = db
        .create_organization(&sample_organization("Vaud School", "VD"))
        .expect("Failed to create organization");
    let session_a: i64 = db
        .create_session(&sample_session(org_id, date(2026, 5, 4)))
        .expect("Failed to create session");
    let session_b: i64 = db
        .create_session(&sample_session(org_id, date(2026, 5, 5)))
        .expect("Failed to create session");
    let claire: i64 = db
        .create_profile(&sample_profile("Claire", "Dubois", "VD"), "t-1")
        .expect("Failed to create profile");
    let marc: i64 = db
        .create_profile(&sample_profile("Marc", "Favre", "VD"), "t-2")
        .expect("Failed to create profile");

    db.set_availability(claire, session_a, Availability::Yes)
        .expect("Failed to set availability");
    db.set_availability(claire, session_b, Availability::No)
        .expect("Failed to set availability");
    db.set_availability(marc, session_a, Availability::IfNeeded)
        .expect("Failed to set availability");

    let grid: Vec<SessionAvailability> = db
        .list_availabilities_for_sessions(&[session_a, session_b])
        .expect("Query failed");
    assert_eq!(grid.len(), 3);

    let only_a: Vec<SessionAvailability> = db
        .list_availabilities_for_sessions(&[session_a])
        .expect("Query failed");
    assert_eq!(only_a.len(), 2);
}

#[test]
fn test_chosen_sessions_for_profile() {
    let mut db: Persistence = new_db();

    let org_id: i64 = db
        .create_organization(&sample_organization("Vaud School", "VD"))
        .expect("Failed to create organization");
    let session_a: i64 = db
        .create_session(&sample_session(org_id, date(2026, 5, 4)))
        .expect("Failed to create session");
    let session_b: i64 = db
        .create_session(&sample_session(org_id, date(2026, 5, 5)))
        .expect("Failed to create session");
    let claire: i64 = db
        .create_profile(&sample_profile("Claire", "Dubois", "VD"), "t-1")
        .expect("Failed to create profile");

    db.set_availability(claire, session_a, Availability::Yes)
        .expect("Failed to set availability");
    db.set_availability(claire, session_b, Availability::Yes)
        .expect("Failed to set availability");
    db.set_chosen_role(claire, session_a, ChosenRole::Leader)
        .expect("Failed to choose");

    let chosen: Vec<(Session, ChosenRole)> = db
        .list_chosen_sessions_for_profile(claire)
        .expect("Query failed");
    assert_eq!(chosen.len(), 1);
    assert_eq!(chosen[0].0.session_id, Some(session_a));
    assert_eq!(chosen[0].1, ChosenRole::Leader);
}

#[test]
fn test_chosen_roles_in_range() {
    let mut db: Persistence = new_db();

    let org_id: i64 = db
        .create_organization(&sample_organization("Vaud School", "VD"))
        .expect("Failed to create organization");
    let session_in: i64 = db
        .create_session(&sample_session(org_id, date(2026, 5, 4)))
        .expect("Failed to create session");
    let session_out: i64 = db
        .create_session(&sample_session(org_id, date(2026, 9, 1)))
        .expect("Failed to create session");
    let claire: i64 = db
        .create_profile(&sample_profile("Claire", "Dubois", "VD"), "t-1")
        .expect("Failed to create profile");

    db.set_availability(claire, session_in, Availability::Yes)
        .expect("Failed to set availability");
    db.set_availability(claire, session_out, Availability::Yes)
        .expect("Failed to set availability");
    db.set_chosen_role(claire, session_in, ChosenRole::Helper)
        .expect("Failed to choose");
    db.set_chosen_role(claire, session_out, ChosenRole::Helper)
        .expect("Failed to choose");

    let assignments: Vec<(i64, Date, ChosenRole)> = db
        .list_chosen_roles_in_range(date(2026, 4, 1), date(2026, 7, 31))
        .expect("Query failed");
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].0, claire);
    assert_eq!(assignments[0].1, date(2026, 5, 4));
    assert_eq!(assignments[0].2, ChosenRole::Helper);
}
