// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::new_db;
use crate::{AccountData, LoginSessionData, Persistence, PersistenceError};

fn create_power_user(db: &mut Persistence, email: &str) -> i64 {
    db.create_account(email, "Admin User", "correct-horse-battery-1", "PowerUser", "", None)
        .expect("Failed to create account")
}

#[test]
fn test_create_and_get_account() {
    let mut db: Persistence = new_db();

    let account_id: i64 = create_power_user(&mut db, "admin@defi-velo.ch");

    let account: AccountData = db
        .get_account_by_id(account_id)
        .expect("Query failed")
        .expect("Account should exist");
    assert_eq!(account.login_email, "admin@defi-velo.ch");
    assert_eq!(account.display_name, "Admin User");
    assert_eq!(account.role, "PowerUser");
    assert!(!account.is_disabled);
    assert!(account.last_login_at.is_none());
}

#[test]
fn test_login_email_is_normalized_to_lowercase() {
    let mut db: Persistence = new_db();

    create_power_user(&mut db, "Admin@Defi-Velo.CH");

    let account: AccountData = db
        .get_account_by_login("admin@defi-velo.ch")
        .expect("Query failed")
        .expect("Account should be found by lowercase email");
    assert_eq!(account.login_email, "admin@defi-velo.ch");

    // Lookup also normalizes.
    let found: Option<AccountData> = db
        .get_account_by_login("ADMIN@DEFI-VELO.CH")
        .expect("Query failed");
    assert!(found.is_some());
}

#[test]
fn test_duplicate_login_email_rejected() {
    let mut db: Persistence = new_db();

    create_power_user(&mut db, "admin@defi-velo.ch");
    let result = db.create_account(
        "admin@defi-velo.ch",
        "Other",
        "another-password-22",
        "Coordinator",
        "VD",
        None,
    );

    assert!(matches!(result, Err(PersistenceError::Conflict(_))));
}

#[test]
fn test_password_is_hashed_and_verifiable() {
    let mut db: Persistence = new_db();

    let account_id: i64 = create_power_user(&mut db, "admin@defi-velo.ch");
    let account: AccountData = db
        .get_account_by_id(account_id)
        .expect("Query failed")
        .expect("Account should exist");

    assert_ne!(account.password_hash, "correct-horse-battery-1");
    assert!(
        db.verify_password("correct-horse-battery-1", &account.password_hash)
            .expect("Verification failed")
    );
    assert!(
        !db.verify_password("wrong-password-00000", &account.password_hash)
            .expect("Verification failed")
    );
}

#[test]
fn test_update_password() {
    let mut db: Persistence = new_db();

    let account_id: i64 = create_power_user(&mut db, "admin@defi-velo.ch");
    db.update_password(account_id, "new-secret-password-9")
        .expect("Failed to update password");

    let account: AccountData = db
        .get_account_by_id(account_id)
        .expect("Query failed")
        .expect("Account should exist");
    assert!(
        db.verify_password("new-secret-password-9", &account.password_hash)
            .expect("Verification failed")
    );
    assert!(
        !db.verify_password("correct-horse-battery-1", &account.password_hash)
            .expect("Verification failed")
    );
}

#[test]
fn test_disable_and_enable_account() {
    let mut db: Persistence = new_db();

    let account_id: i64 = create_power_user(&mut db, "admin@defi-velo.ch");
    assert_eq!(db.count_active_power_users().expect("Count failed"), 1);

    db.disable_account(account_id).expect("Disable failed");
    let account: AccountData = db
        .get_account_by_id(account_id)
        .expect("Query failed")
        .expect("Account should exist");
    assert!(account.is_disabled);
    assert_eq!(db.count_active_power_users().expect("Count failed"), 0);

    db.enable_account(account_id).expect("Enable failed");
    assert_eq!(db.count_active_power_users().expect("Count failed"), 1);
}

#[test]
fn test_update_account_fields() {
    let mut db: Persistence = new_db();

    let account_id: i64 = create_power_user(&mut db, "coord@defi-velo.ch");
    db.update_account(account_id, "Regional Coordinator", "Coordinator", "VD,GE", None)
        .expect("Update failed");

    let account: AccountData = db
        .get_account_by_id(account_id)
        .expect("Query failed")
        .expect("Account should exist");
    assert_eq!(account.display_name, "Regional Coordinator");
    assert_eq!(account.role, "Coordinator");
    assert_eq!(account.managed_cantons, "VD,GE");
}

#[test]
fn test_update_missing_account_fails() {
    let mut db: Persistence = new_db();

    let result = db.update_account(999, "Ghost", "Collaborator", "", None);
    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
}

#[test]
fn test_login_session_lifecycle() {
    let mut db: Persistence = new_db();

    let account_id: i64 = create_power_user(&mut db, "admin@defi-velo.ch");
    db.create_login_session("token-abc", account_id, "2099-01-01T00:00:00Z")
        .expect("Failed to create login session");

    let session: LoginSessionData = db
        .get_login_session_by_token("token-abc")
        .expect("Query failed")
        .expect("Session should exist");
    assert_eq!(session.account_id, account_id);

    db.delete_login_session("token-abc").expect("Delete failed");
    let gone: Option<LoginSessionData> = db
        .get_login_session_by_token("token-abc")
        .expect("Query failed");
    assert!(gone.is_none());
}

#[test]
fn test_delete_login_sessions_for_account() {
    let mut db: Persistence = new_db();

    let account_id: i64 = create_power_user(&mut db, "admin@defi-velo.ch");
    db.create_login_session("token-1", account_id, "2099-01-01T00:00:00Z")
        .expect("Failed to create login session");
    db.create_login_session("token-2", account_id, "2099-01-01T00:00:00Z")
        .expect("Failed to create login session");

    let deleted: usize = db
        .delete_login_sessions_for_account(account_id)
        .expect("Delete failed");
    assert_eq!(deleted, 2);
}

#[test]
fn test_delete_expired_login_sessions() {
    let mut db: Persistence = new_db();

    let account_id: i64 = create_power_user(&mut db, "admin@defi-velo.ch");
    db.create_login_session("expired", account_id, "2020-01-01T00:00:00Z")
        .expect("Failed to create login session");
    db.create_login_session("current", account_id, "2099-01-01T00:00:00Z")
        .expect("Failed to create login session");

    let deleted: usize = db.delete_expired_login_sessions().expect("Delete failed");
    assert_eq!(deleted, 1);

    assert!(
        db.get_login_session_by_token("current")
            .expect("Query failed")
            .is_some()
    );
    assert!(
        db.get_login_session_by_token("expired")
            .expect("Query failed")
            .is_none()
    );
}

#[test]
fn test_list_accounts() {
    let mut db: Persistence = new_db();

    create_power_user(&mut db, "a@defi-velo.ch");
    create_power_user(&mut db, "b@defi-velo.ch");

    let accounts: Vec<AccountData> = db.list_accounts().expect("Query failed");
    assert_eq!(accounts.len(), 2);
}
