// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{canton, date, new_db, sample_organization, sample_profile, sample_session};
use crate::{Persistence, PersistenceError};
use defivelo_domain::{Canton, Organization, VolunteerProfile};

#[test]
fn test_create_and_get_organization() {
    let mut db: Persistence = new_db();

    let org_id: i64 = db
        .create_organization(&sample_organization("Collège du Léman", "VD"))
        .expect("Failed to create organization");

    let org: Organization = db.get_organization(org_id).expect("Query failed");
    assert_eq!(org.organization_id, Some(org_id));
    assert_eq!(org.name, "Collège du Léman");
    assert_eq!(org.canton.code(), "VD");
    assert_eq!(org.coordinator_name.as_deref(), Some("A. Rochat"));
}

#[test]
fn test_get_missing_organization_fails() {
    let mut db: Persistence = new_db();

    let result = db.get_organization(42);
    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
}

#[test]
fn test_update_organization() {
    let mut db: Persistence = new_db();

    let org_id: i64 = db
        .create_organization(&sample_organization("Collège du Léman", "VD"))
        .expect("Failed to create organization");

    let mut org: Organization = db.get_organization(org_id).expect("Query failed");
    org.name = "Collège de la Planta".to_string();
    org.canton = canton("VS");
    db.update_organization(org_id, &org).expect("Update failed");

    let updated: Organization = db.get_organization(org_id).expect("Query failed");
    assert_eq!(updated.name, "Collège de la Planta");
    assert_eq!(updated.canton.code(), "VS");
}

#[test]
fn test_list_organizations_in_cantons() {
    let mut db: Persistence = new_db();

    db.create_organization(&sample_organization("Vaud School", "VD"))
        .expect("Failed to create organization");
    db.create_organization(&sample_organization("Geneva School", "GE"))
        .expect("Failed to create organization");
    db.create_organization(&sample_organization("Bern School", "BE"))
        .expect("Failed to create organization");

    let cantons: Vec<Canton> = vec![canton("VD"), canton("GE")];
    let orgs: Vec<Organization> = db
        .list_organizations_in_cantons(&cantons)
        .expect("Query failed");
    assert_eq!(orgs.len(), 2);
    assert!(orgs.iter().all(|o| o.canton.code() != "BE"));
}

#[test]
fn test_delete_organization_with_sessions_fails() {
    let mut db: Persistence = new_db();

    let org_id: i64 = db
        .create_organization(&sample_organization("Collège du Léman", "VD"))
        .expect("Failed to create organization");
    db.create_session(&sample_session(org_id, date(2026, 5, 4)))
        .expect("Failed to create session");

    let result = db.delete_organization(org_id);
    assert!(result.is_err());
}

#[test]
fn test_create_and_get_profile() {
    let mut db: Persistence = new_db();

    let profile_id: i64 = db
        .create_profile(&sample_profile("Claire", "Dubois", "VD"), "cal-token-1")
        .expect("Failed to create profile");

    let profile: VolunteerProfile = db.get_profile(profile_id).expect("Query failed");
    assert_eq!(profile.profile_id, Some(profile_id));
    assert_eq!(profile.sort_name(), "Dubois, Claire");
    assert!(profile.can_lead);
    assert!(!profile.is_actor);
}

#[test]
fn test_duplicate_profile_email_rejected() {
    let mut db: Persistence = new_db();

    db.create_profile(&sample_profile("Claire", "Dubois", "VD"), "cal-token-1")
        .expect("Failed to create profile");
    let result = db.create_profile(&sample_profile("Claire", "Dubois", "GE"), "cal-token-2");

    assert!(matches!(result, Err(PersistenceError::Conflict(_))));
}

#[test]
fn test_profiles_are_sorted_by_name() {
    let mut db: Persistence = new_db();

    db.create_profile(&sample_profile("Zoé", "Muller", "VD"), "t-1")
        .expect("Failed to create profile");
    db.create_profile(&sample_profile("Anna", "Bernard", "VD"), "t-2")
        .expect("Failed to create profile");
    db.create_profile(&sample_profile("Luc", "Muller", "VD"), "t-3")
        .expect("Failed to create profile");

    let profiles: Vec<VolunteerProfile> = db.list_profiles().expect("Query failed");
    let names: Vec<String> = profiles.iter().map(VolunteerProfile::sort_name).collect();
    assert_eq!(names, vec!["Bernard, Anna", "Muller, Luc", "Muller, Zoé"]);
}

#[test]
fn test_list_profiles_in_cantons() {
    let mut db: Persistence = new_db();

    db.create_profile(&sample_profile("Claire", "Dubois", "VD"), "t-1")
        .expect("Failed to create profile");
    db.create_profile(&sample_profile("Marc", "Favre", "GE"), "t-2")
        .expect("Failed to create profile");

    let cantons: Vec<Canton> = vec![canton("GE")];
    let profiles: Vec<VolunteerProfile> =
        db.list_profiles_in_cantons(&cantons).expect("Query failed");
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].first_name, "Marc");
}

#[test]
fn test_calendar_token_lookup() {
    let mut db: Persistence = new_db();

    let profile_id: i64 = db
        .create_profile(&sample_profile("Claire", "Dubois", "VD"), "feed-token-xyz")
        .expect("Failed to create profile");

    let token: String = db.get_calendar_token(profile_id).expect("Query failed");
    assert_eq!(token, "feed-token-xyz");

    let profile: VolunteerProfile = db
        .get_profile_by_calendar_token("feed-token-xyz")
        .expect("Query failed")
        .expect("Profile should be found by token");
    assert_eq!(profile.profile_id, Some(profile_id));

    let missing: Option<VolunteerProfile> = db
        .get_profile_by_calendar_token("no-such-token")
        .expect("Query failed");
    assert!(missing.is_none());
}

#[test]
fn test_update_profile_keeps_calendar_token() {
    let mut db: Persistence = new_db();

    let profile_id: i64 = db
        .create_profile(&sample_profile("Claire", "Dubois", "VD"), "feed-token-xyz")
        .expect("Failed to create profile");

    let mut profile: VolunteerProfile = db.get_profile(profile_id).expect("Query failed");
    profile.is_actor = true;
    db.update_profile(profile_id, &profile).expect("Update failed");

    let token: String = db.get_calendar_token(profile_id).expect("Query failed");
    assert_eq!(token, "feed-token-xyz");
    assert!(db.get_profile(profile_id).expect("Query failed").is_actor);
}

#[test]
fn test_delete_profile() {
    let mut db: Persistence = new_db();

    let profile_id: i64 = db
        .create_profile(&sample_profile("Claire", "Dubois", "VD"), "t-1")
        .expect("Failed to create profile");
    db.delete_profile(profile_id).expect("Delete failed");

    let result = db.get_profile(profile_id);
    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
}
