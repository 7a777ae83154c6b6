// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account management and authentication tests.

use defivelo_persistence::Persistence;

use super::helpers::{collaborator, create_test_profile, new_db, power_user};
use crate::{
    ApiError, AuthError, AuthenticatedAccount, AuthenticationService, ChangePasswordRequest,
    CreateAccountRequest, CreateAccountResponse, ResetPasswordRequest, UpdateAccountRequest,
    change_password, create_account, delete_account, disable_account, enable_account,
    list_accounts, reset_password, update_account, whoami,
};

fn account_request(email: &str, role: &str, cantons: &[&str]) -> CreateAccountRequest {
    CreateAccountRequest {
        login_email: String::from(email),
        display_name: String::from("Test Person"),
        password: String::from("velo-saison-2026"),
        password_confirmation: String::from("velo-saison-2026"),
        role: String::from(role),
        managed_cantons: cantons.iter().map(|c| String::from(*c)).collect(),
        profile_id: None,
    }
}

#[test]
fn test_create_account_and_login() {
    let mut db: Persistence = new_db();

    let created: CreateAccountResponse = create_account(
        &mut db,
        account_request("marie@defi-velo.ch", "Coordinator", &["VD"]),
        &power_user(),
    )
    .expect("create account");

    let (token, authenticated) =
        AuthenticationService::login(&mut db, "marie@defi-velo.ch", "velo-saison-2026")
            .expect("login");
    assert_eq!(authenticated.account_id, created.account_id);
    assert_eq!(authenticated.role, crate::Role::Coordinator);
    assert_eq!(authenticated.managed_cantons.len(), 1);

    let validated: AuthenticatedAccount =
        AuthenticationService::validate_session(&mut db, &token).expect("validate session");
    assert_eq!(validated.account_id, created.account_id);

    let me = whoami(&mut db, &validated).expect("whoami");
    assert_eq!(me.account.login_email, "marie@defi-velo.ch");
    assert!(me.account.last_login_at.is_some());

    AuthenticationService::logout(&mut db, &token).expect("logout");
    let result = AuthenticationService::validate_session(&mut db, &token);
    assert!(matches!(
        result,
        Err(AuthError::AuthenticationFailed { .. })
    ));
}

#[test]
fn test_login_rejects_bad_credentials_uniformly() {
    let mut db: Persistence = new_db();
    create_account(
        &mut db,
        account_request("marie@defi-velo.ch", "Coordinator", &["VD"]),
        &power_user(),
    )
    .expect("create account");

    let unknown = AuthenticationService::login(&mut db, "nobody@defi-velo.ch", "whatever-123");
    let wrong_password =
        AuthenticationService::login(&mut db, "marie@defi-velo.ch", "wrong-password-1");

    // Unknown account and wrong password are indistinguishable.
    let Err(AuthError::AuthenticationFailed { reason: r1 }) = unknown else {
        panic!("expected authentication failure");
    };
    let Err(AuthError::AuthenticationFailed { reason: r2 }) = wrong_password else {
        panic!("expected authentication failure");
    };
    assert_eq!(r1, r2);
}

#[test]
fn test_create_account_requires_power_user() {
    let mut db: Persistence = new_db();
    let result = create_account(
        &mut db,
        account_request("marie@defi-velo.ch", "Coordinator", &["VD"]),
        &super::helpers::coordinator(&["VD"]),
    );
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_collaborator_account_requires_profile_link() {
    let mut db: Persistence = new_db();
    let result = create_account(
        &mut db,
        account_request("paul@defi-velo.ch", "Collaborator", &[]),
        &power_user(),
    );
    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "profile_id"
    ));

    let profile_id: i64 = create_test_profile(&mut db, "Paul", "Girard", "VD", false, false);
    let mut request: CreateAccountRequest =
        account_request("paul@defi-velo.ch", "Collaborator", &[]);
    request.profile_id = Some(profile_id);
    create_account(&mut db, request, &power_user()).expect("collaborator account");
}

#[test]
fn test_password_policy_enforced_on_create() {
    let mut db: Persistence = new_db();

    let mut request: CreateAccountRequest =
        account_request("marie@defi-velo.ch", "Coordinator", &["VD"]);
    request.password = String::from("short1");
    request.password_confirmation = String::from("short1");
    let result = create_account(&mut db, request, &power_user());
    assert!(matches!(
        result,
        Err(ApiError::PasswordPolicyViolation { .. })
    ));
}

#[test]
fn test_change_password_requires_current() {
    let mut db: Persistence = new_db();
    create_account(
        &mut db,
        account_request("marie@defi-velo.ch", "Coordinator", &["VD"]),
        &power_user(),
    )
    .expect("create account");
    let (_, authenticated) =
        AuthenticationService::login(&mut db, "marie@defi-velo.ch", "velo-saison-2026")
            .expect("login");

    let result = change_password(
        &mut db,
        ChangePasswordRequest {
            current_password: String::from("not-the-password-1"),
            new_password: String::from("nouveau-velo-2027"),
            new_password_confirmation: String::from("nouveau-velo-2027"),
        },
        &authenticated,
    );
    assert!(matches!(result, Err(ApiError::AuthenticationFailed { .. })));

    change_password(
        &mut db,
        ChangePasswordRequest {
            current_password: String::from("velo-saison-2026"),
            new_password: String::from("nouveau-velo-2027"),
            new_password_confirmation: String::from("nouveau-velo-2027"),
        },
        &authenticated,
    )
    .expect("change password");

    AuthenticationService::login(&mut db, "marie@defi-velo.ch", "nouveau-velo-2027")
        .expect("login with new password");
}

#[test]
fn test_reset_password_revokes_sessions() {
    let mut db: Persistence = new_db();
    let created: CreateAccountResponse = create_account(
        &mut db,
        account_request("marie@defi-velo.ch", "Coordinator", &["VD"]),
        &power_user(),
    )
    .expect("create account");
    let (token, _) =
        AuthenticationService::login(&mut db, "marie@defi-velo.ch", "velo-saison-2026")
            .expect("login");

    reset_password(
        &mut db,
        ResetPasswordRequest {
            account_id: created.account_id,
            new_password: String::from("remplacement-99"),
            new_password_confirmation: String::from("remplacement-99"),
        },
        &power_user(),
    )
    .expect("reset password");

    // The old session token is gone.
    assert!(AuthenticationService::validate_session(&mut db, &token).is_err());
    AuthenticationService::login(&mut db, "marie@defi-velo.ch", "remplacement-99")
        .expect("login with reset password");
}

#[test]
fn test_disable_blocks_login_and_enable_restores() {
    let mut db: Persistence = new_db();
    let created: CreateAccountResponse = create_account(
        &mut db,
        account_request("marie@defi-velo.ch", "Coordinator", &["VD"]),
        &power_user(),
    )
    .expect("create account");

    disable_account(&mut db, created.account_id, &power_user()).expect("disable");
    let result = AuthenticationService::login(&mut db, "marie@defi-velo.ch", "velo-saison-2026");
    assert!(matches!(result, Err(AuthError::AuthenticationFailed { .. })));

    enable_account(&mut db, created.account_id, &power_user()).expect("enable");
    AuthenticationService::login(&mut db, "marie@defi-velo.ch", "velo-saison-2026")
        .expect("login after re-enable");
}

#[test]
fn test_cannot_disable_last_active_power_user() {
    let mut db: Persistence = new_db();
    let only_admin: CreateAccountResponse = create_account(
        &mut db,
        account_request("root@defi-velo.ch", "PowerUser", &[]),
        &power_user(),
    )
    .expect("create account");

    let result = disable_account(&mut db, only_admin.account_id, &power_user());
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "last_power_user"
    ));

    create_account(
        &mut db,
        account_request("root2@defi-velo.ch", "PowerUser", &[]),
        &power_user(),
    )
    .expect("second power user");
    disable_account(&mut db, only_admin.account_id, &power_user())
        .expect("disable with another power user present");
}

#[test]
fn test_delete_account_only_when_never_used() {
    let mut db: Persistence = new_db();
    let fresh: CreateAccountResponse = create_account(
        &mut db,
        account_request("fresh@defi-velo.ch", "Coordinator", &["VD"]),
        &power_user(),
    )
    .expect("create account");
    delete_account(&mut db, fresh.account_id, &power_user()).expect("delete unused account");

    let used: CreateAccountResponse = create_account(
        &mut db,
        account_request("used@defi-velo.ch", "Coordinator", &["VD"]),
        &power_user(),
    )
    .expect("create account");
    AuthenticationService::login(&mut db, "used@defi-velo.ch", "velo-saison-2026")
        .expect("login");

    let result = delete_account(&mut db, used.account_id, &power_user());
    assert!(matches!(result, Err(ApiError::Conflict { .. })));
}

#[test]
fn test_update_account_role_and_cantons() {
    let mut db: Persistence = new_db();
    let created: CreateAccountResponse = create_account(
        &mut db,
        account_request("marie@defi-velo.ch", "Coordinator", &["VD"]),
        &power_user(),
    )
    .expect("create account");

    update_account(
        &mut db,
        created.account_id,
        UpdateAccountRequest {
            display_name: String::from("Marie Dupont"),
            role: String::from("Coordinator"),
            managed_cantons: vec![String::from("VD"), String::from("GE")],
            profile_id: None,
        },
        &power_user(),
    )
    .expect("update account");

    let listed = list_accounts(&mut db, &power_user()).expect("list accounts");
    let account = listed
        .accounts
        .iter()
        .find(|a| a.account_id == created.account_id)
        .expect("updated account listed");
    assert_eq!(account.display_name, "Marie Dupont");
    assert_eq!(account.managed_cantons, vec!["VD", "GE"]);
}

#[test]
fn test_list_accounts_requires_power_user() {
    let mut db: Persistence = new_db();
    let result = list_accounts(&mut db, &collaborator(1));
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}
