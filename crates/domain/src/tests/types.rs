// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Canton, Organization, VolunteerProfile};

fn create_test_profile() -> VolunteerProfile {
    VolunteerProfile::new(
        String::from("Claire"),
        String::from("Dubois"),
        String::from("claire.dubois@example.org"),
        Canton::new("VD").unwrap(),
        true,
        false,
        true,
    )
    .unwrap()
}

#[test]
fn test_canton_creation() {
    let canton: Canton = Canton::new("VD").unwrap();
    assert_eq!(canton.code(), "VD");
}

#[test]
fn test_canton_normalized_to_uppercase() {
    let lower: Canton = Canton::new("vd").unwrap();
    let mixed: Canton = Canton::new("Vd").unwrap();
    let upper: Canton = Canton::new("VD").unwrap();

    assert_eq!(lower.code(), "VD");
    assert_eq!(mixed.code(), "VD");
    assert_eq!(lower, upper);
}

#[test]
fn test_canton_trims_whitespace() {
    let canton: Canton = Canton::new(" ge ").unwrap();
    assert_eq!(canton.code(), "GE");
}

#[test]
fn test_canton_rejects_bad_codes() {
    assert!(Canton::new("").is_err());
    assert!(Canton::new("V").is_err());
    assert!(Canton::new("VDX").is_err());
    assert!(Canton::new("V1").is_err());
    assert!(Canton::new("!!").is_err());
}

#[test]
fn test_canton_list_round_trip() {
    let cantons: Vec<Canton> = Canton::parse_list("VD, ge,JU").unwrap();
    assert_eq!(cantons.len(), 3);
    assert_eq!(Canton::format_list(&cantons), "VD,GE,JU");
}

#[test]
fn test_canton_list_ignores_empty_segments() {
    let cantons: Vec<Canton> = Canton::parse_list("VD,,GE,").unwrap();
    assert_eq!(cantons.len(), 2);
}

#[test]
fn test_canton_list_rejects_bad_segment() {
    assert!(Canton::parse_list("VD,NOPE").is_err());
}

#[test]
fn test_organization_creation() {
    let org: Organization = Organization::new(
        String::from("École de Prilly"),
        String::from("Route de Cossonay 40"),
        String::from("1008"),
        String::from("Prilly"),
        Canton::new("VD").unwrap(),
        Some(String::from("M. Rochat")),
    )
    .unwrap();

    assert!(org.organization_id.is_none());
    assert_eq!(org.canton.code(), "VD");
}

#[test]
fn test_organization_rejects_empty_name() {
    let result = Organization::new(
        String::new(),
        String::from("Rue"),
        String::from("1000"),
        String::from("Lausanne"),
        Canton::new("VD").unwrap(),
        None,
    );
    assert!(result.is_err());
}

#[test]
fn test_profile_creation() {
    let profile: VolunteerProfile = create_test_profile();

    assert!(profile.profile_id.is_none());
    assert!(profile.can_lead);
    assert!(!profile.is_actor);
    assert!(profile.has_bike);
}

#[test]
fn test_profile_rejects_bad_email() {
    let result = VolunteerProfile::new(
        String::from("Claire"),
        String::from("Dubois"),
        String::from("not-an-email"),
        Canton::new("VD").unwrap(),
        false,
        false,
        false,
    );
    assert!(result.is_err());
}

#[test]
fn test_profile_sort_name() {
    let profile: VolunteerProfile = create_test_profile();
    assert_eq!(profile.sort_name(), "Dubois, Claire");
}
